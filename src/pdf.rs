//! One-pass PDF 1.4 writer for recorded page sets. Text uses the standard
//! Helvetica family with WinAnsiEncoding (no font programs embedded), logos
//! become image XObjects, and the page-count alias inside drawn strings is
//! substituted here, where the final count is known.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::canvas::{Command, ImageData, Page, PageSet, PAGE_COUNT_ALIAS};
use crate::error::Error;
use crate::font::winansi_byte;
use crate::types::Color;

const MM_TO_PT: f32 = 72.0 / 25.4;

/// A finished document: the recorded pages plus everything needed to
/// serialize them. Buffer and file sinks produce identical bytes.
#[derive(Debug)]
pub struct Rendered {
    pages: PageSet,
    auto_print: bool,
}

impl Rendered {
    pub(crate) fn new(pages: PageSet, auto_print: bool) -> Self {
        Self { pages, auto_print }
    }

    pub fn page_count(&self) -> usize {
        self.pages.pages.len()
    }

    /// The recorded drawing commands, for inspection.
    pub fn pages(&self) -> &[Page] {
        &self.pages.pages
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serialize(&self.pages, self.auto_print)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

/// Resource index for a font family: /F1 regular, /F2 bold, /F3 oblique,
/// /F4 bold oblique.
fn font_index(family: &str) -> usize {
    let bold = family.contains("Bold");
    let oblique = family.contains("Oblique") || family.contains("Italic");
    match (bold, oblique) {
        (false, false) => 1,
        (true, false) => 2,
        (false, true) => 3,
        (true, true) => 4,
    }
}

fn base_font_name(index: usize) -> &'static str {
    match index {
        1 => "Helvetica",
        2 => "Helvetica-Bold",
        3 => "Helvetica-Oblique",
        _ => "Helvetica-BoldOblique",
    }
}

fn push_color(out: &mut Vec<u8>, color: Color) {
    out.extend_from_slice(
        format!(
            "{:.3} {:.3} {:.3} rg\n",
            color.r as f32 / 255.0,
            color.g as f32 / 255.0,
            color.b as f32 / 255.0
        )
        .as_bytes(),
    );
}

fn push_escaped_winansi(out: &mut Vec<u8>, text: &str) {
    for ch in text.chars() {
        let byte = winansi_byte(ch).unwrap_or(b'?');
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            _ => out.push(byte),
        }
    }
}

/// Replay one page's commands into a content stream. Fonts seen on the way
/// are added to `used_fonts`.
fn content_stream(
    page: &Page,
    page_height_mm: f32,
    total_pages: usize,
    used_fonts: &mut BTreeSet<usize>,
) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut font_family = "Helvetica".to_string();
    let mut font_size = 12.0f32;
    let mut text_color = Color::BLACK;
    let mut fill_color = Color::WHITE;

    for command in &page.commands {
        match command {
            Command::SetFont { family, size } => {
                font_family = family.clone();
                font_size = *size;
            }
            Command::SetTextColor(color) => text_color = *color,
            Command::SetFillColor(color) => fill_color = *color,
            Command::Rect {
                x,
                y,
                width,
                height,
            } => {
                push_color(&mut out, fill_color);
                let x_pt = x.to_f32() * MM_TO_PT;
                let y_pt = (page_height_mm - y.to_f32() - height.to_f32()) * MM_TO_PT;
                out.extend_from_slice(
                    format!(
                        "{:.2} {:.2} {:.2} {:.2} re f\n",
                        x_pt,
                        y_pt,
                        width.to_f32() * MM_TO_PT,
                        height.to_f32() * MM_TO_PT
                    )
                    .as_bytes(),
                );
            }
            Command::Text { x, y, text } => {
                let index = font_index(&font_family);
                used_fonts.insert(index);
                push_color(&mut out, text_color);
                let x_pt = x.to_f32() * MM_TO_PT;
                let y_pt = (page_height_mm - y.to_f32()) * MM_TO_PT;
                out.extend_from_slice(
                    format!("BT /F{index} {font_size:.2} Tf {x_pt:.2} {y_pt:.2} Td (").as_bytes(),
                );
                let resolved = text.replace(PAGE_COUNT_ALIAS, &total_pages.to_string());
                push_escaped_winansi(&mut out, &resolved);
                out.extend_from_slice(b") Tj ET\n");
            }
            Command::Image {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                let w_pt = width.to_f32() * MM_TO_PT;
                let h_pt = height.to_f32() * MM_TO_PT;
                let x_pt = x.to_f32() * MM_TO_PT;
                let y_pt = (page_height_mm - y.to_f32() - height.to_f32()) * MM_TO_PT;
                out.extend_from_slice(
                    format!("q {w_pt:.2} 0 0 {h_pt:.2} {x_pt:.2} {y_pt:.2} cm /Im{resource_id} Do Q\n")
                        .as_bytes(),
                );
            }
        }
    }
    out
}

fn serialize(pages: &PageSet, auto_print: bool) -> Vec<u8> {
    let total_pages = pages.pages.len();
    let page_height_mm = pages.page_size.height.to_f32();
    let page_width_pt = pages.page_size.width.to_f32() * MM_TO_PT;
    let page_height_pt = page_height_mm * MM_TO_PT;

    let mut used_fonts: BTreeSet<usize> = BTreeSet::new();
    let streams: Vec<Vec<u8>> = pages
        .pages
        .iter()
        .map(|page| content_stream(page, page_height_mm, total_pages, &mut used_fonts))
        .collect();

    // Object ids: catalog 1, pages 2, resources 3, then (page, content)
    // pairs, then fonts, then images, then the optional auto-print action.
    const CATALOG_ID: usize = 1;
    const PAGES_ID: usize = 2;
    const RESOURCES_ID: usize = 3;
    let page_id = |index: usize| 4 + 2 * index;
    let content_id = |index: usize| 5 + 2 * index;
    let mut next_id = 4 + 2 * total_pages;
    let font_ids: Vec<(usize, usize)> = used_fonts
        .iter()
        .map(|&index| {
            let id = next_id;
            next_id += 1;
            (index, id)
        })
        .collect();
    let image_ids: Vec<(&String, usize)> = pages
        .images
        .keys()
        .map(|key| {
            let id = next_id;
            next_id += 1;
            (key, id)
        })
        .collect();
    let action_id = if auto_print {
        let id = next_id;
        next_id += 1;
        Some(id)
    } else {
        None
    };
    let object_count = next_id - 1;

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets: Vec<(usize, usize)> = Vec::with_capacity(object_count);

    let begin_object = |out: &mut Vec<u8>, offsets: &mut Vec<(usize, usize)>, id: usize| {
        offsets.push((id, out.len()));
        out.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    };

    // Catalog.
    begin_object(&mut out, &mut offsets, CATALOG_ID);
    out.extend_from_slice(format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R").as_bytes());
    if let Some(action) = action_id {
        out.extend_from_slice(format!(" /OpenAction {action} 0 R").as_bytes());
    }
    out.extend_from_slice(b" >>\nendobj\n");

    // Page tree.
    begin_object(&mut out, &mut offsets, PAGES_ID);
    out.extend_from_slice(b"<< /Type /Pages /Kids [");
    for index in 0..total_pages {
        out.extend_from_slice(format!("{} 0 R ", page_id(index)).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "] /Count {total_pages} /MediaBox [0 0 {page_width_pt:.2} {page_height_pt:.2}] >>\nendobj\n"
        )
        .as_bytes(),
    );

    // Shared resources.
    begin_object(&mut out, &mut offsets, RESOURCES_ID);
    out.extend_from_slice(b"<< /ProcSet [/PDF /Text /ImageB /ImageC] /Font << ");
    for (index, id) in &font_ids {
        out.extend_from_slice(format!("/F{index} {id} 0 R ").as_bytes());
    }
    out.extend_from_slice(b">>");
    if !image_ids.is_empty() {
        out.extend_from_slice(b" /XObject << ");
        for (key, id) in &image_ids {
            out.extend_from_slice(format!("/Im{key} {id} 0 R ").as_bytes());
        }
        out.extend_from_slice(b">>");
    }
    out.extend_from_slice(b" >>\nendobj\n");

    // Pages and their content streams.
    for (index, stream) in streams.iter().enumerate() {
        begin_object(&mut out, &mut offsets, page_id(index));
        out.extend_from_slice(
            format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /Resources {RESOURCES_ID} 0 R /Contents {} 0 R >>\nendobj\n",
                content_id(index)
            )
            .as_bytes(),
        );

        begin_object(&mut out, &mut offsets, content_id(index));
        out.extend_from_slice(format!("<< /Length {} >>\nstream\n", stream.len()).as_bytes());
        out.extend_from_slice(stream);
        out.extend_from_slice(b"\nendstream\nendobj\n");
    }

    // Fonts.
    for (index, id) in &font_ids {
        begin_object(&mut out, &mut offsets, *id);
        out.extend_from_slice(
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>\nendobj\n",
                base_font_name(*index)
            )
            .as_bytes(),
        );
    }

    // Images.
    for (key, id) in &image_ids {
        let resource = &pages.images[*key];
        begin_object(&mut out, &mut offsets, *id);
        let (filter, colorspace, data): (&str, &str, &[u8]) = match &resource.data {
            ImageData::Jpeg { data, grayscale } => (
                " /Filter /DCTDecode",
                if *grayscale { "DeviceGray" } else { "DeviceRGB" },
                data,
            ),
            ImageData::Rgb { data } => ("", "DeviceRGB", data),
        };
        out.extend_from_slice(
            format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} /BitsPerComponent 8 /ColorSpace /{colorspace}{filter} /Length {} >>\nstream\n",
                resource.width,
                resource.height,
                data.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(data);
        out.extend_from_slice(b"\nendstream\nendobj\n");
    }

    // Auto-print action.
    if let Some(id) = action_id {
        begin_object(&mut out, &mut offsets, id);
        out.extend_from_slice(b"<< /Type /Action /S /JavaScript /JS (print\\(true\\);) >>\nendobj\n");
    }

    // Cross-reference table and trailer.
    offsets.sort_by_key(|(id, _)| *id);
    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", object_count + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for (_, offset) in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root {CATALOG_ID} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            object_count + 1
        )
        .as_bytes(),
    );
    out
}
