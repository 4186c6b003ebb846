use crate::canvas::{DrawOp, Page};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetrics {
    pub page_number: usize,
    pub command_count: usize,
    pub text_line_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetrics {
    pub pages: Vec<PageMetrics>,
    pub total_render_ms: f64,
}

impl DocumentMetrics {
    pub fn from_pages(pages: &[Page], total_render_ms: f64) -> Self {
        let pages = pages
            .iter()
            .enumerate()
            .map(|(idx, page)| PageMetrics {
                page_number: idx + 1,
                command_count: page.commands.len(),
                text_line_count: page
                    .commands
                    .iter()
                    .filter(|cmd| matches!(cmd, DrawOp::Text { .. }))
                    .count(),
            })
            .collect();
        Self {
            pages,
            total_render_ms,
        }
    }
}
