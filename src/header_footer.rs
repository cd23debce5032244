use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::canvas::{Align, Canvas, PageCallback, PAGE_COUNT_ALIAS};
use crate::layout::{BASE_MARGIN, BASE_MARGIN_TOP, HEADER_MARGIN_TOP, PAGE_HEIGHT, PAGINATION_CELL_OFFSET};

fn default_font_size() -> f32 {
    7.0
}

/// A page header or footer: restricted-HTML text drawn on every page, with
/// an optional "Page N / total" cell. The total page count is not known
/// until the document is finished, so the cell carries an alias resolved at
/// serialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderFooter {
    pub text: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub pagination: bool,
}

impl HeaderFooter {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: default_font_size(),
            pagination: false,
        }
    }

    pub fn with_pagination(mut self) -> Self {
        self.pagination = true;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Callback drawing this block in the top page band. Cursor and margins
    /// are restored afterwards so body layout is unaffected.
    pub(crate) fn header_callback(&self, font: String) -> PageCallback {
        let block = self.clone();
        Arc::new(move |canvas: &mut Canvas, page: usize| {
            let (saved_x, saved_y) = (canvas.x(), canvas.y());
            canvas.set_font(&font, block.font_size);
            canvas.set_xy(BASE_MARGIN, HEADER_MARGIN_TOP);
            let line_height = block.font_size * crate::font::PT_TO_MM;
            canvas.write_html(line_height, &block.text);
            if block.pagination {
                canvas.set_xy(PAGINATION_CELL_OFFSET, HEADER_MARGIN_TOP + 8.0);
                canvas.cell(
                    10.0,
                    5.0,
                    &format!("Page {page} / {PAGE_COUNT_ALIAS}"),
                    Align::Right,
                );
            }
            canvas.set_margins(BASE_MARGIN, BASE_MARGIN_TOP, BASE_MARGIN);
            canvas.set_xy(saved_x, saved_y);
        })
    }

    /// Callback drawing this block in the bottom page band.
    pub(crate) fn footer_callback(&self, font: String) -> PageCallback {
        let block = self.clone();
        Arc::new(move |canvas: &mut Canvas, page: usize| {
            let (saved_x, saved_y) = (canvas.x(), canvas.y());
            canvas.set_font(&font, block.font_size);
            canvas.set_xy(BASE_MARGIN, PAGE_HEIGHT - 10.0 - HEADER_MARGIN_TOP);
            let line_height = block.font_size * crate::font::PT_TO_MM;
            canvas.write_html(line_height, &block.text);
            if block.pagination {
                canvas.set_xy(PAGINATION_CELL_OFFSET, PAGE_HEIGHT - HEADER_MARGIN_TOP - 8.0);
                canvas.cell(
                    10.0,
                    5.0,
                    &format!("Page {page} / {PAGE_COUNT_ALIAS}"),
                    Align::Right,
                );
            }
            canvas.set_margins(BASE_MARGIN, BASE_MARGIN_TOP, BASE_MARGIN);
            canvas.set_xy(saved_x, saved_y);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let block = HeaderFooter::new("<b>ACME</b>");
        assert_eq!(block.font_size, 7.0);
        assert!(!block.pagination);
        assert!(HeaderFooter::new("x").with_pagination().pagination);
    }

    #[test]
    fn font_size_defaults_when_missing_from_json() {
        let block: HeaderFooter = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(block.font_size, 7.0);
    }
}
