//! PDF serialization of a [`RenderedDocument`] with base-14 Helvetica.

use crate::canvas::{DrawOp, ImageResource, Page, RenderedDocument};
use crate::error::NoticeError;
use crate::measure::MM_PER_POINT;
use crate::types::{Color, Length};
use image::GenericImageView;
use lopdf::content::{Content, Operation};
use lopdf::{
    Dictionary as LoDictionary, Document as LoDocument, Object as LoObject, ObjectId, Stream as LoStream,
    StringFormat, dictionary,
};
use std::collections::BTreeMap;

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

/// Serialize with millimetre document units.
pub fn document_to_pdf(doc: &RenderedDocument) -> Result<Vec<u8>, NoticeError> {
    PdfWriter::default().write(doc)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfWriter {
    points_per_unit: f32,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(MM_PER_POINT)
    }
}

impl PdfWriter {
    /// `units_per_point` is the same value the layout was produced with.
    pub fn new(units_per_point: f32) -> Self {
        Self {
            points_per_unit: 1.0 / units_per_point,
        }
    }

    fn pt(&self, value: Length) -> f32 {
        value.to_f32() * self.points_per_unit
    }

    pub fn write(&self, doc: &RenderedDocument) -> Result<Vec<u8>, NoticeError> {
        let mut pdf = LoDocument::with_version("1.7");
        let pages_id = pdf.new_object_id();

        let regular_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut xobjects = LoDictionary::new();
        let mut image_names = BTreeMap::new();
        for (idx, (resource_id, image)) in doc.images.iter().enumerate() {
            let name = format!("Im{idx}");
            let image_id = add_image(&mut pdf, image)?;
            xobjects.set(name.as_bytes().to_vec(), LoObject::Reference(image_id));
            image_names.insert(resource_id.as_str(), name);
        }
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR_FONT => regular_id,
                BOLD_FONT => bold_id,
            },
            "XObject" => xobjects,
        });

        let page_width = self.pt(doc.page_size.width);
        let page_height = self.pt(doc.page_size.height);
        let mut kids = Vec::with_capacity(doc.pages.len());
        for page in &doc.pages {
            let content = self.page_content(page, page_height, &image_names);
            let content_id = pdf.add_object(LoStream::new(dictionary! {}, content.encode()?));
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(LoObject::Reference(page_id));
        }
        let count = kids.len() as i64;
        pdf.objects.insert(
            pages_id,
            LoObject::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = pdf.add_object(dictionary! {
            "Title" => LoObject::string_literal(doc.filename.as_str()),
            "Producer" => LoObject::string_literal(concat!("noticepress ", env!("CARGO_PKG_VERSION"))),
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.trailer.set("Info", info_id);
        pdf.compress();

        let mut out = Vec::new();
        pdf.save_to(&mut out)?;
        Ok(out)
    }

    fn page_content(&self, page: &Page, page_height: f32, image_names: &BTreeMap<&str, String>) -> Content {
        let mut ops = Vec::new();
        for command in &page.commands {
            match command {
                DrawOp::Text {
                    x,
                    baseline_y,
                    text,
                    font_size,
                    bold,
                    color,
                } => {
                    let font = if *bold { BOLD_FONT } else { REGULAR_FONT };
                    ops.push(Operation::new("BT", vec![]));
                    ops.push(fill_color(*color));
                    ops.push(Operation::new("Tf", vec![font.into(), (*font_size).into()]));
                    ops.push(Operation::new(
                        "Td",
                        vec![self.pt(*x).into(), (page_height - self.pt(*baseline_y)).into()],
                    ));
                    ops.push(Operation::new(
                        "Tj",
                        vec![LoObject::String(encode_winansi(text), StringFormat::Literal)],
                    ));
                    ops.push(Operation::new("ET", vec![]));
                }
                DrawOp::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    ops.push(fill_color(*color));
                    ops.push(self.rect(*x, *y, *width, *height, page_height));
                    ops.push(Operation::new("f", vec![]));
                }
                DrawOp::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                    line_width,
                } => {
                    ops.push(stroke_color(*color));
                    ops.push(Operation::new("w", vec![self.pt(*line_width).into()]));
                    ops.push(self.rect(*x, *y, *width, *height, page_height));
                    ops.push(Operation::new("S", vec![]));
                }
                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                    line_width,
                } => {
                    ops.push(stroke_color(*color));
                    ops.push(Operation::new("w", vec![self.pt(*line_width).into()]));
                    ops.push(Operation::new(
                        "m",
                        vec![self.pt(*x1).into(), (page_height - self.pt(*y1)).into()],
                    ));
                    ops.push(Operation::new(
                        "l",
                        vec![self.pt(*x2).into(), (page_height - self.pt(*y2)).into()],
                    ));
                    ops.push(Operation::new("S", vec![]));
                }
                DrawOp::Image {
                    x,
                    y,
                    width,
                    height,
                    resource_id,
                } => {
                    let Some(name) = image_names.get(resource_id.as_str()) else {
                        log::warn!("image resource {resource_id} is not registered; skipped");
                        continue;
                    };
                    let w = self.pt(*width);
                    let h = self.pt(*height);
                    ops.push(Operation::new("q", vec![]));
                    ops.push(Operation::new(
                        "cm",
                        vec![
                            w.into(),
                            0.into(),
                            0.into(),
                            h.into(),
                            self.pt(*x).into(),
                            (page_height - self.pt(*y) - h).into(),
                        ],
                    ));
                    ops.push(Operation::new("Do", vec![LoObject::Name(name.as_bytes().to_vec())]));
                    ops.push(Operation::new("Q", vec![]));
                }
            }
        }
        Content { operations: ops }
    }

    fn rect(&self, x: Length, y: Length, width: Length, height: Length, page_height: f32) -> Operation {
        let h = self.pt(height);
        Operation::new(
            "re",
            vec![
                self.pt(x).into(),
                (page_height - self.pt(y) - h).into(),
                self.pt(width).into(),
                h.into(),
            ],
        )
    }
}

fn fill_color(color: Color) -> Operation {
    Operation::new("rg", vec![color.r.into(), color.g.into(), color.b.into()])
}

fn stroke_color(color: Color) -> Operation {
    Operation::new("RG", vec![color.r.into(), color.g.into(), color.b.into()])
}

/// JPEG passes through as DCTDecode; anything else becomes raw RGB plus a
/// soft mask when it carries transparency.
/// Byte length of an 8-bit RGB plane, `None` when it does not fit in memory.
fn rgb_buffer_len(width: u32, height: u32) -> Option<usize> {
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;
    width.checked_mul(height)?.checked_mul(3)
}

fn add_image(pdf: &mut LoDocument, image: &ImageResource) -> Result<ObjectId, NoticeError> {
    let data: &[u8] = &image.data;
    let decoded = image::load_from_memory(data)
        .map_err(|err| NoticeError::Asset(format!("cannot decode image for pdf: {err}")))?;
    let (width, height) = decoded.dimensions();

    if matches!(image::guess_format(data), Ok(image::ImageFormat::Jpeg)) {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "DeviceGray",
            _ => "DeviceRGB",
        };
        let stream = LoStream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            data.to_vec(),
        )
        .with_compression(false);
        return Ok(pdf.add_object(stream));
    }

    let rgb_len = rgb_buffer_len(width, height)
        .ok_or_else(|| NoticeError::Pdf(format!("image {width}x{height} is too large")))?;
    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity(rgb_len);
    let mut alpha = Vec::with_capacity(rgb_len / 3);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    if has_alpha {
        let mask_id = pdf.add_object(LoStream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ));
        dict.set("SMask", mask_id);
    }
    Ok(pdf.add_object(LoStream::new(dict, rgb)))
}

/// Encode for the WinAnsi base fonts; unmappable characters become `?`.
fn encode_winansi(input: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => b'?',
        };
        out.push(byte);
    }
    out
}
