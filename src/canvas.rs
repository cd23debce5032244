use std::collections::BTreeMap;
use std::sync::Arc;

use image::GenericImageView;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Error;
use crate::font::{self, TextEncoder, PT_TO_MM};
use crate::html;
use crate::types::{Color, Mm, Size};

/// Placeholder for the total page count inside drawn text. The count is not
/// known until the last page is emitted; serialization substitutes it.
pub const PAGE_COUNT_ALIAS: &str = "{nb}";

/// Invoked with the canvas and the 1-based page number when a page starts
/// (header) or is closed (footer).
pub type PageCallback = Arc<dyn Fn(&mut Canvas, usize) + Send + Sync>;

/// Horizontal inset applied to left/right-aligned cell text.
const CELL_MARGIN: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One recorded drawing operation. Pages are vectors of these; the PDF
/// writer replays them into content streams.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFont { family: String, size: f32 },
    SetTextColor(Color),
    SetFillColor(Color),
    /// Filled rectangle; (x, y) is the top-left corner.
    Rect { x: Mm, y: Mm, width: Mm, height: Mm },
    /// Text run; y is the baseline.
    Text { x: Mm, y: Mm, text: String },
    Image { x: Mm, y: Mm, width: Mm, height: Mm, resource_id: String },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub(crate) enum ImageData {
    /// JPEG bytes embedded as-is.
    Jpeg { data: Vec<u8>, grayscale: bool },
    /// Decoded 8-bit RGB rows.
    Rgb { data: Vec<u8> },
}

#[derive(Debug, Clone)]
pub(crate) struct ImageResource {
    pub width: u32,
    pub height: u32,
    pub data: ImageData,
}

/// The finished page set: what `Canvas::finish` returns and the PDF writer
/// consumes.
#[derive(Debug, Clone)]
pub struct PageSet {
    pub page_size: Size,
    pub pages: Vec<Page>,
    pub(crate) images: BTreeMap<String, ImageResource>,
}

/// A command-recording page surface with a drawing cursor: y grows downward
/// from the top of the page, all units in millimetres. One canvas belongs to
/// one build; it is never shared.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    page_open: bool,

    x: Mm,
    y: Mm,
    left_margin: Mm,
    top_margin: Mm,
    right_margin: Mm,

    family: String,
    size: f32,
    text_color: Color,
    fill_color: Color,
    recorded_font: Option<(String, f32)>,
    recorded_text_color: Option<Color>,
    recorded_fill_color: Option<Color>,

    images: BTreeMap<String, ImageResource>,
    header: Option<PageCallback>,
    footer: Option<PageCallback>,
    encoder: TextEncoder,
}

impl Canvas {
    pub fn new(encoder: TextEncoder) -> Self {
        Self {
            page_size: Size::a4(),
            pages: Vec::new(),
            current: Page::default(),
            page_open: false,
            x: Mm::from_f32(10.0),
            y: Mm::from_f32(10.0),
            left_margin: Mm::from_f32(10.0),
            top_margin: Mm::from_f32(10.0),
            right_margin: Mm::from_f32(10.0),
            family: "Helvetica".to_string(),
            size: 12.0,
            text_color: Color::BLACK,
            fill_color: Color::WHITE,
            recorded_font: None,
            recorded_text_color: None,
            recorded_fill_color: None,
            images: BTreeMap::new(),
            header: None,
            footer: None,
            encoder,
        }
    }

    pub(crate) fn set_header(&mut self, callback: Option<PageCallback>) {
        self.header = callback;
    }

    pub(crate) fn set_footer(&mut self, callback: Option<PageCallback>) {
        self.footer = callback;
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    /// 1-based number of the page currently being drawn.
    pub fn page_no(&self) -> usize {
        self.pages.len() + usize::from(self.page_open)
    }

    pub fn x(&self) -> f32 {
        self.x.to_f32()
    }

    pub fn y(&self) -> f32 {
        self.y.to_f32()
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = Mm::from_f32(x);
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = Mm::from_f32(y);
    }

    pub fn set_xy(&mut self, x: f32, y: f32) {
        self.set_x(x);
        self.set_y(y);
    }

    pub fn set_margins(&mut self, left: f32, top: f32, right: f32) {
        self.left_margin = Mm::from_f32(left);
        self.top_margin = Mm::from_f32(top);
        self.right_margin = Mm::from_f32(right);
    }

    pub fn set_right_margin(&mut self, right: f32) {
        self.right_margin = Mm::from_f32(right);
    }

    pub fn set_font(&mut self, family: &str, size: f32) {
        self.family = family.to_string();
        self.size = size;
    }

    pub fn font_size(&self) -> f32 {
        self.size
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    pub(crate) fn text_color(&self) -> Color {
        self.text_color
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    /// Close the open page (drawing the footer) and start a new one (drawing
    /// the header). The cursor returns to the top-left margin corner.
    pub fn add_page(&mut self) {
        if self.page_open {
            self.close_page();
        }
        self.page_open = true;
        self.recorded_font = None;
        self.recorded_text_color = None;
        self.recorded_fill_color = None;
        self.x = self.left_margin;
        self.y = self.top_margin;
        let page = self.page_no();
        debug!(page, "page started");
        if let Some(header) = self.header.clone() {
            header(self, page);
        }
    }

    fn close_page(&mut self) {
        let page = self.page_no();
        if let Some(footer) = self.footer.clone() {
            footer(self, page);
        }
        self.pages.push(std::mem::take(&mut self.current));
        self.page_open = false;
    }

    pub fn finish(mut self) -> PageSet {
        if self.page_open {
            self.close_page();
        }
        PageSet {
            page_size: self.page_size,
            pages: self.pages,
            images: self.images,
        }
    }

    fn sync_text_state(&mut self) {
        let desired = (self.family.clone(), self.size);
        if self.recorded_font.as_ref() != Some(&desired) {
            self.current.commands.push(Command::SetFont {
                family: desired.0.clone(),
                size: desired.1,
            });
            self.recorded_font = Some(desired);
        }
        if self.recorded_text_color != Some(self.text_color) {
            self.current.commands.push(Command::SetTextColor(self.text_color));
            self.recorded_text_color = Some(self.text_color);
        }
    }

    fn sync_fill_state(&mut self) {
        if self.recorded_fill_color != Some(self.fill_color) {
            self.current.commands.push(Command::SetFillColor(self.fill_color));
            self.recorded_fill_color = Some(self.fill_color);
        }
    }

    /// Width of `text` in the current font, in millimetres.
    pub fn text_width(&self, text: &str) -> f32 {
        let encoded = (self.encoder)(text);
        font::text_width(&self.family, self.size, &encoded).to_f32()
    }

    /// Filled rectangle with the current fill color.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.sync_fill_state();
        self.current.commands.push(Command::Rect {
            x: Mm::from_f32(x),
            y: Mm::from_f32(y),
            width: Mm::from_f32(width),
            height: Mm::from_f32(height),
        });
    }

    /// One line of text inside a width×height box at the cursor, vertically
    /// centered. The cursor advances to the right edge of the box.
    pub fn cell(&mut self, width: f32, height: f32, text: &str, align: Align) {
        let encoded = (self.encoder)(text);
        self.sync_text_state();
        let box_width = Mm::from_f32(width);
        let text_width = font::text_width(&self.family, self.size, &encoded);
        let text_x = match align {
            Align::Left => self.x + Mm::from_f32(CELL_MARGIN),
            Align::Center => self.x + (box_width - text_width) * 0.5,
            Align::Right => self.x + box_width - text_width - Mm::from_f32(CELL_MARGIN),
        };
        let baseline = self.y + Mm::from_f32(height * 0.5 + self.size * PT_TO_MM * 0.35);
        self.current.commands.push(Command::Text {
            x: text_x,
            y: baseline,
            text: encoded,
        });
        self.x += box_width;
    }

    /// Word-wrapped text in a box of the given width starting at the cursor.
    /// Returns the consumed height; the cursor moves below the block, back
    /// at the left margin.
    pub fn multi_cell(&mut self, width: f32, line_height: f32, text: &str) -> f32 {
        let encoded = (self.encoder)(text);
        self.sync_text_state();
        let max_width = Mm::from_f32(width - 2.0 * CELL_MARGIN);
        let lines = font::wrap_text(&self.family, self.size, max_width, &encoded);
        let start_y = self.y;
        let text_x = self.x + Mm::from_f32(CELL_MARGIN);
        let baseline_offset = line_height * 0.5 + self.size * PT_TO_MM * 0.35;
        for (index, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let line_y =
                start_y + Mm::from_f32(line_height * index as f32 + baseline_offset);
            self.current.commands.push(Command::Text {
                x: text_x,
                y: line_y,
                text: line.clone(),
            });
        }
        let used = line_height * lines.len() as f32;
        self.y = start_y + Mm::from_f32(used);
        self.x = self.left_margin;
        used
    }

    /// Restricted-HTML text between the margins. Returns consumed height.
    pub fn write_html(&mut self, line_height: f32, html_text: &str) -> f32 {
        let x = self.left_margin.to_f32();
        let width = self.page_size.width.to_f32() - x - self.right_margin.to_f32();
        self.write_html_at(x, width, line_height, html_text)
    }

    /// Restricted-HTML text in an explicit box. Bold/italic switch to the
    /// matching Helvetica variants; `<center>` centers its lines in the box.
    pub(crate) fn write_html_at(
        &mut self,
        x: f32,
        width: f32,
        line_height: f32,
        html_text: &str,
    ) -> f32 {
        let base_family = self.family.clone();
        let size = self.size;
        let max_width = Mm::from_f32(width);

        // Flatten parsed spans to styled words, then wrap greedily.
        struct Word {
            text: String,
            family: String,
            width: Mm,
        }
        let mut display_lines: Vec<(Vec<Word>, bool)> = Vec::new();
        for line in html::parse(html_text) {
            let mut words: Vec<Word> = Vec::new();
            for span in &line.spans {
                let family = font::variant(&base_family, span.bold, span.italic);
                for word in span.text.split_whitespace() {
                    let text = (self.encoder)(word);
                    let word_width = font::text_width(&family, size, &text);
                    words.push(Word {
                        text,
                        family: family.clone(),
                        width: word_width,
                    });
                }
            }
            let mut current: Vec<Word> = Vec::new();
            let mut current_width = Mm::ZERO;
            for word in words {
                let space = if current.is_empty() {
                    Mm::ZERO
                } else {
                    font::text_width(&word.family, size, " ")
                };
                if !current.is_empty() && current_width + space + word.width > max_width {
                    display_lines.push((std::mem::take(&mut current), line.centered));
                    current_width = word.width;
                } else {
                    current_width += space + word.width;
                }
                current.push(word);
            }
            display_lines.push((current, line.centered));
        }

        let start_y = self.y;
        let baseline_offset = line_height * 0.5 + size * PT_TO_MM * 0.35;
        for (index, (words, centered)) in display_lines.iter().enumerate() {
            let mut total = Mm::ZERO;
            for (word_index, word) in words.iter().enumerate() {
                if word_index > 0 {
                    total += font::text_width(&word.family, size, " ");
                }
                total += word.width;
            }
            let mut cursor_x = if *centered {
                Mm::from_f32(x) + (max_width - total) * 0.5
            } else {
                Mm::from_f32(x)
            };
            let line_y =
                start_y + Mm::from_f32(line_height * index as f32 + baseline_offset);
            for word in words {
                self.set_font(&word.family, size);
                self.sync_text_state();
                self.current.commands.push(Command::Text {
                    x: cursor_x,
                    y: line_y,
                    text: word.text.clone(),
                });
                cursor_x += word.width + font::text_width(&word.family, size, " ");
            }
        }
        self.set_font(&base_family, size);

        let used = line_height * display_lines.len() as f32;
        self.y = start_y + Mm::from_f32(used);
        used
    }

    /// Draw an image (PNG or JPEG bytes) scaled to `height`, preserving the
    /// aspect ratio. Identical bytes are stored once, keyed by their hash.
    /// Returns the drawn width.
    pub fn image(&mut self, bytes: &[u8], x: f32, y: f32, height: f32) -> Result<f32, Error> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|err| Error::Canvas(format!("image decode failed: {err}")))?;
        let (pixel_width, pixel_height) = decoded.dimensions();
        if pixel_width == 0 || pixel_height == 0 {
            return Err(Error::Canvas("image has zero dimension".to_string()));
        }
        let format = image::guess_format(bytes)
            .map_err(|err| Error::Canvas(format!("unknown image format: {err}")))?;

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let resource_id: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();

        self.images.entry(resource_id.clone()).or_insert_with(|| {
            let data = match format {
                image::ImageFormat::Jpeg => ImageData::Jpeg {
                    data: bytes.to_vec(),
                    grayscale: decoded.color().channel_count() == 1,
                },
                _ => ImageData::Rgb {
                    data: decoded.to_rgb8().into_raw(),
                },
            };
            ImageResource {
                width: pixel_width,
                height: pixel_height,
                data,
            }
        });

        let width = height * pixel_width as f32 / pixel_height as f32;
        self.current.commands.push(Command::Image {
            x: Mm::from_f32(x),
            y: Mm::from_f32(y),
            width: Mm::from_f32(width),
            height: Mm::from_f32(height),
            resource_id,
        });
        Ok(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::default_encoder;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new(default_encoder());
        canvas.add_page();
        canvas
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn cell_advances_the_cursor_horizontally() {
        let mut canvas = canvas();
        canvas.set_xy(10.0, 20.0);
        canvas.cell(30.0, 6.0, "hello", Align::Left);
        assert!((canvas.x() - 40.0).abs() < 0.01);
        assert!((canvas.y() - 20.0).abs() < 0.01);
    }

    #[test]
    fn multi_cell_reports_consumed_height() {
        let mut canvas = canvas();
        canvas.set_font("Helvetica", 10.0);
        canvas.set_xy(10.0, 50.0);
        let used = canvas.multi_cell(20.0, 5.0, "several words that will not fit one line");
        assert!(used >= 10.0);
        assert!((canvas.y() - (50.0 + used)).abs() < 0.01);
        assert!((canvas.x() - 10.0).abs() < 0.01);
    }

    #[test]
    fn font_and_color_commands_are_deduplicated() {
        let mut canvas = canvas();
        canvas.set_font("Helvetica", 8.0);
        canvas.cell(10.0, 6.0, "a", Align::Left);
        canvas.set_font("Helvetica", 8.0);
        canvas.cell(10.0, 6.0, "b", Align::Left);
        let set_fonts = canvas
            .current
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::SetFont { .. }))
            .count();
        assert_eq!(set_fonts, 1);
    }

    #[test]
    fn add_page_runs_header_and_footer_callbacks() {
        let mut canvas = Canvas::new(default_encoder());
        canvas.set_header(Some(Arc::new(|canvas: &mut Canvas, page: usize| {
            let label = format!("header {page}");
            canvas.cell(10.0, 5.0, &label, Align::Left);
        })));
        canvas.set_footer(Some(Arc::new(|canvas: &mut Canvas, page: usize| {
            let label = format!("footer {page}");
            canvas.cell(10.0, 5.0, &label, Align::Left);
        })));
        canvas.add_page();
        canvas.add_page();
        let set = canvas.finish();
        assert_eq!(set.pages.len(), 2);
        assert!(texts(&set.pages[0]).contains(&"header 1"));
        assert!(texts(&set.pages[0]).contains(&"footer 1"));
        assert!(texts(&set.pages[1]).contains(&"header 2"));
        assert!(texts(&set.pages[1]).contains(&"footer 2"));
    }

    #[test]
    fn html_center_positions_text_inside_the_box() {
        let mut canvas = canvas();
        canvas.set_font("Helvetica", 10.0);
        canvas.set_xy(10.0, 30.0);
        canvas.write_html_at(10.0, 100.0, 4.0, "<center>mid</center>");
        let command = canvas
            .current
            .commands
            .iter()
            .rev()
            .find_map(|cmd| match cmd {
                Command::Text { x, text, .. } if text == "mid" => Some(*x),
                _ => None,
            })
            .expect("text drawn");
        let width = font::text_width("Helvetica", 10.0, "mid").to_f32();
        let expected = 10.0 + (100.0 - width) / 2.0;
        assert!((command.to_f32() - expected).abs() < 0.1);
    }

    #[test]
    fn identical_images_share_one_resource() {
        let png = crate::testutil::TINY_PNG;
        let mut canvas = canvas();
        canvas.image(png, 10.0, 10.0, 30.0).unwrap();
        canvas.image(png, 120.0, 10.0, 30.0).unwrap();
        let set = canvas.finish();
        assert_eq!(set.images.len(), 1);
    }
}
