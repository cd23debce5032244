use serde::{Deserialize, Serialize};

use crate::canvas::{Align, Canvas};
use crate::error::Error;
use crate::layout::{CONTACT_BLOCK_WIDTH, EXTRA_SMALL_TEXT_FONT_SIZE, LOGO_HEIGHT};
use crate::options::Options;
use crate::types::Color;

/// A postal address. Only the first line is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// The canonical block rendering: first line, optional second line,
    /// "postal code city" only when at least one of the two is set, optional
    /// country. No blank lines are ever emitted.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.address.clone()];
        if let Some(address2) = self.address2.as_deref().filter(|v| !v.is_empty()) {
            lines.push(address2.to_string());
        }
        let postal_code = self.postal_code.as_deref().unwrap_or("");
        let city = self.city.as_deref().unwrap_or("");
        if !postal_code.is_empty() || !city.is_empty() {
            let line = if postal_code.is_empty() {
                city.to_string()
            } else if city.is_empty() {
                postal_code.to_string()
            } else {
                format!("{postal_code} {city}")
            };
            lines.push(line);
        }
        if let Some(country) = self.country.as_deref().filter(|v| !v.is_empty()) {
            lines.push(country.to_string());
        }
        lines
    }
}

/// A company or customer block: name, optional logo and address, plus free
/// info lines (restricted HTML subset) under the address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    /// Raw PNG or JPEG bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_info: Vec<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_logo(mut self, logo: Vec<u8>) -> Self {
        self.logo = Some(logo);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn add_info(mut self, line: impl Into<String>) -> Self {
        self.additional_info.push(line.into());
        self
    }

    /// Draw the block with its top-left corner at (x, y). Returns the bottom
    /// y of the drawn content so the caller can continue below the taller of
    /// the two contact blocks.
    pub(crate) fn render(
        &self,
        canvas: &mut Canvas,
        options: &Options,
        x: f32,
        y: f32,
    ) -> Result<f32, Error> {
        let mut top = y;
        if let Some(logo) = &self.logo {
            canvas.image(logo, x, y, LOGO_HEIGHT)?;
            top = y + LOGO_HEIGHT;
        }

        canvas.set_fill_color(Color::from_triple(options.grey_bg_color));
        canvas.rect(x, top, CONTACT_BLOCK_WIDTH, 8.0);
        canvas.set_font(&options.bold_font, 10.0);
        canvas.set_xy(x, top);
        canvas.cell(CONTACT_BLOCK_WIDTH, 8.0, &self.name, Align::Left);
        canvas.set_font(&options.font, 10.0);

        let mut bottom = top + 8.0;
        if let Some(address) = &self.address {
            let lines = address.lines();
            let rect_height = lines.len() as f32 * 5.0 + 2.0;
            canvas.rect(x, top + 9.0, CONTACT_BLOCK_WIDTH, rect_height);
            canvas.set_xy(x, top + 10.0);
            let used = canvas.multi_cell(CONTACT_BLOCK_WIDTH, 5.0, &lines.join("\n"));
            bottom = top + 10.0 + used;
        }

        if !self.additional_info.is_empty() {
            let saved_color = canvas.text_color();
            canvas.set_font(&options.font, EXTRA_SMALL_TEXT_FONT_SIZE);
            canvas.set_text_color(Color::from_triple(options.grey_text_color));
            let mut line_y = bottom + 2.0;
            for info in &self.additional_info {
                canvas.set_xy(x, line_y);
                line_y += canvas.write_html_at(x, CONTACT_BLOCK_WIDTH, 3.0, info);
            }
            canvas.set_text_color(saved_color);
            canvas.set_font(&options.font, 10.0);
            bottom = line_y;
        }

        Ok(bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_address_renders_four_lines() {
        let address = Address {
            address: "89 Rue de Brest".into(),
            address2: Some("Appartement 2".into()),
            postal_code: Some("75000".into()),
            city: Some("Paris".into()),
            country: Some("France".into()),
        };
        assert_eq!(
            address.lines(),
            vec!["89 Rue de Brest", "Appartement 2", "75000 Paris", "France"]
        );
    }

    #[test]
    fn postal_line_is_skipped_when_both_parts_are_empty() {
        let address = Address {
            address: "89 Rue de Paris".into(),
            country: Some("France".into()),
            ..Address::default()
        };
        assert_eq!(address.lines(), vec!["89 Rue de Paris", "France"]);
    }

    #[test]
    fn city_alone_still_gets_its_line() {
        let address = Address {
            address: "1 Main St".into(),
            city: Some("Brest".into()),
            ..Address::default()
        };
        assert_eq!(address.lines(), vec!["1 Main St", "Brest"]);
    }
}
