use crate::layout::Geometry;
use crate::types::{Length, Size};

/// Where a block of content landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub page_index: usize,
    /// Top edge of the block.
    pub y: Length,
    /// True when placing the block started a new page.
    pub broke_page: bool,
}

/// Vertical layout cursor for a single render.
///
/// Starts at page 0 on the top margin. Content that does not fit between the
/// cursor and the bottom margin moves to the top of a new page.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page_index: usize,
    y: Length,
    page_size: Size,
    top_margin: Length,
    bottom_margin: Length,
}

impl PageCursor {
    pub fn new(page_size: Size, top_margin: Length, bottom_margin: Length) -> Self {
        Self {
            page_index: 0,
            y: top_margin,
            page_size,
            top_margin,
            bottom_margin,
        }
    }

    pub fn from_geometry(geometry: &Geometry) -> Self {
        Self::new(geometry.page_size, geometry.margin, geometry.margin)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn y(&self) -> Length {
        self.y
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn top_margin(&self) -> Length {
        self.top_margin
    }

    fn bottom_limit(&self) -> Length {
        self.page_size.height - self.bottom_margin
    }

    pub fn remaining_height(&self) -> Length {
        (self.bottom_limit() - self.y).max(Length::ZERO)
    }

    pub fn fits(&self, height: Length) -> bool {
        self.y + height <= self.bottom_limit()
    }

    pub fn is_at_top(&self) -> bool {
        self.y <= self.top_margin
    }

    /// Move down by `height`, starting a new page first when it does not fit.
    /// Returns true when a page break happened.
    pub fn advance(&mut self, height: Length) -> bool {
        self.place(height).broke_page
    }

    /// Reserve `height` for a block and report where its top edge landed.
    pub fn place(&mut self, height: Length) -> Placement {
        let broke_page = !self.fits(height);
        if broke_page {
            self.new_page();
        }
        let placement = Placement {
            page_index: self.page_index,
            y: self.y,
            broke_page,
        };
        self.y += height;
        placement
    }

    /// Whitespace between blocks. Never starts a page; stops at the bottom margin.
    pub fn skip(&mut self, gap: Length) {
        self.y = (self.y + gap).min(self.bottom_limit().max(self.y));
    }

    pub fn new_page(&mut self) {
        self.page_index += 1;
        self.y = self.top_margin;
    }
}
