//! The page layout engine: drives the canvas through title, metas, contact
//! blocks, the items table (with per-row page breaks), notes, the totals
//! block, and the payment term. All geometry lives in the named constants
//! below; the engine body never hardcodes offsets.

use rust_decimal::Decimal;
use tracing::debug;

use crate::canvas::{Align, Canvas};
use crate::document::Document;
use crate::error::Error;
use crate::font::{default_encoder, TextEncoder};
use crate::money::CurrencyFormatter;
use crate::pdf::Rendered;
use crate::rate::{Discount, Rate};
use crate::totals::Totals;
use crate::types::Color;

// Page geometry (mm).
pub(crate) const PAGE_HEIGHT: f32 = 297.0;
pub(crate) const BASE_MARGIN: f32 = 10.0;
pub(crate) const BASE_MARGIN_TOP: f32 = 20.0;
pub(crate) const HEADER_MARGIN_TOP: f32 = 5.0;
/// Body content below this line triggers a page break.
pub(crate) const MAX_PAGE_HEIGHT: f32 = 260.0;

// Items table column left offsets (mm). Fixed geometry, not computed.
const ITEM_COL_NAME_OFFSET: f32 = 10.0;
const ITEM_COL_UNIT_PRICE_OFFSET: f32 = 80.0;
const ITEM_COL_QUANTITY_OFFSET: f32 = 103.0;
const ITEM_COL_SUBTOTAL_OFFSET: f32 = 113.0;
const ITEM_COL_DISCOUNT_OFFSET: f32 = 140.0;
const ITEM_COL_TAX_OFFSET: f32 = 157.0;
const ITEM_COL_TOTAL_OFFSET: f32 = 175.0;
const TABLE_RIGHT_EDGE: f32 = 200.0;
const TABLE_WIDTH: f32 = 190.0;

// Font sizes (pt).
pub(crate) const BASE_TEXT_FONT_SIZE: f32 = 8.0;
pub(crate) const SMALL_TEXT_FONT_SIZE: f32 = 7.0;
pub(crate) const EXTRA_SMALL_TEXT_FONT_SIZE: f32 = 6.0;
pub(crate) const LARGE_TEXT_FONT_SIZE: f32 = 10.0;

// Contact blocks.
pub(crate) const CONTACT_BLOCK_WIDTH: f32 = 70.0;
pub(crate) const LOGO_HEIGHT: f32 = 30.0;

// The totals block reserves this vertical span and never splits.
const TOTALS_BLOCK_HEIGHT: f32 = 30.0;
const TOTALS_DISCOUNT_EXTRA_HEIGHT: f32 = 15.0;

const ROW_HEIGHT: f32 = 6.0;
const ROW_SPACING: f32 = 2.0;

// The right-hand column: title, metas, totals, payment term.
const RIGHT_BLOCK_OFFSET: f32 = 120.0;
const RIGHT_BLOCK_WIDTH: f32 = 80.0;
const TOTALS_CELL_WIDTH: f32 = 40.0;
const TOTALS_CELL_TEXT_WIDTH: f32 = 38.0;
const TOTALS_AMOUNT_OFFSET: f32 = 160.0;
const TOTALS_AMOUNT_TEXT_OFFSET: f32 = 162.0;

const CUSTOMER_BLOCK_OFFSET: f32 = 130.0;
const CUSTOMER_BLOCK_TOP: f32 = BASE_MARGIN_TOP + 25.0;
const NOTES_RIGHT_MARGIN: f32 = 100.0;
/// Right edge of the "Page N / total" cell in headers and footers.
pub(crate) const PAGINATION_CELL_OFFSET: f32 = 195.0;

impl Document {
    /// Validate, compute totals, and render every block into a fresh canvas.
    /// Any failure aborts the whole build; there is no partial output.
    pub fn build(&self) -> Result<Rendered, Error> {
        self.build_with_encoder(default_encoder())
    }

    /// Like [`build`](Self::build) with a caller-supplied text encoder. The
    /// encoder is an explicit dependency of the engine, applied to every
    /// drawn string; the default keeps WinAnsi-representable characters.
    pub fn build_with_encoder(&self, encoder: TextEncoder) -> Result<Rendered, Error> {
        self.validate()?;
        let totals = self.totals()?;
        debug!(items = self.items.len(), "building document");

        let formatter = CurrencyFormatter::new(&self.options);
        let mut canvas = Canvas::new(encoder);
        canvas.set_margins(BASE_MARGIN, BASE_MARGIN_TOP, BASE_MARGIN);
        canvas.set_text_color(Color::from_triple(self.options.base_text_color));
        if let Some(header) = &self.header {
            canvas.set_header(Some(header.header_callback(self.options.font.clone())));
        }
        if let Some(footer) = &self.footer {
            canvas.set_footer(Some(footer.footer_callback(self.options.font.clone())));
        }
        canvas.add_page();
        canvas.set_font(&self.options.font, 12.0);

        self.append_title(&mut canvas);
        self.append_metas(&mut canvas);

        let company = self.company.as_ref().ok_or_else(|| Error::Validation {
            field: "company".to_string(),
            message: "required".to_string(),
        })?;
        let customer = self.customer.as_ref().ok_or_else(|| Error::Validation {
            field: "customer".to_string(),
            message: "required".to_string(),
        })?;
        let company_bottom = company.render(&mut canvas, &self.options, BASE_MARGIN, BASE_MARGIN_TOP)?;
        let customer_bottom =
            customer.render(&mut canvas, &self.options, CUSTOMER_BLOCK_OFFSET, CUSTOMER_BLOCK_TOP)?;
        canvas.set_xy(BASE_MARGIN, company_bottom.max(customer_bottom));

        self.append_description(&mut canvas);
        self.append_items(&mut canvas, &formatter)?;

        let mut reserved = TOTALS_BLOCK_HEIGHT;
        if self.discount.is_some() {
            reserved += TOTALS_DISCOUNT_EXTRA_HEIGHT;
        }
        if canvas.y() + reserved > MAX_PAGE_HEIGHT {
            debug!(
                page = canvas.page_no(),
                reason = "totals_block",
                "page break"
            );
            canvas.add_page();
        }

        self.append_notes(&mut canvas);
        self.append_totals(&mut canvas, &formatter, &totals)?;
        self.append_payment_term(&mut canvas);

        Ok(Rendered::new(canvas.finish(), self.options.auto_print))
    }

    fn append_title(&self, canvas: &mut Canvas) {
        let title = self.doc_type.label(&self.options);
        canvas.set_xy(RIGHT_BLOCK_OFFSET, BASE_MARGIN_TOP);
        canvas.set_fill_color(Color::from_triple(self.options.dark_bg_color));
        canvas.rect(RIGHT_BLOCK_OFFSET, BASE_MARGIN_TOP, RIGHT_BLOCK_WIDTH, 10.0);
        canvas.set_font(&self.options.font, 14.0);
        canvas.cell(RIGHT_BLOCK_WIDTH, 10.0, title, Align::Center);
    }

    /// Ref, optional version, date, and the optional client ref / validity
    /// date lines, right-aligned under the title.
    fn append_metas(&self, canvas: &mut Canvas) {
        canvas.set_font(&self.options.font, BASE_TEXT_FONT_SIZE);
        let mut offset = BASE_MARGIN_TOP + 11.0;
        let mut meta = |canvas: &mut Canvas, title: &str, value: &str| {
            canvas.set_xy(RIGHT_BLOCK_OFFSET, offset);
            canvas.cell(RIGHT_BLOCK_WIDTH, 4.0, &format!("{title}: {value}"), Align::Right);
            offset += 4.0;
        };
        meta(canvas, &self.options.text_ref_title, &self.reference);
        if !self.version.is_empty() {
            meta(canvas, &self.options.text_version_title, &self.version);
        }
        meta(canvas, &self.options.text_date_title, &self.date_or_today());
        if !self.client_ref.is_empty() {
            meta(canvas, &self.options.text_client_ref_title, &self.client_ref);
        }
        if !self.validity_date.is_empty() {
            meta(
                canvas,
                &self.options.text_validity_date_title,
                &self.validity_date,
            );
        }
    }

    fn append_description(&self, canvas: &mut Canvas) {
        if self.description.is_empty() {
            return;
        }
        canvas.set_xy(BASE_MARGIN, canvas.y() + 10.0);
        canvas.set_font(&self.options.font, 10.0);
        canvas.multi_cell(TABLE_WIDTH, 5.0, &self.description);
        canvas.set_fill_color(Color::from_triple(self.options.grey_bg_color));
        canvas.rect(BASE_MARGIN, canvas.y(), TABLE_WIDTH, 0.4);
    }

    /// The grey column-title band. Redrawn at the top of every page that
    /// carries item rows.
    fn draw_table_titles(&self, canvas: &mut Canvas) {
        canvas.set_xy(BASE_MARGIN, canvas.y() + 5.0);
        canvas.set_font(&self.options.bold_font, BASE_TEXT_FONT_SIZE);
        canvas.set_fill_color(Color::from_triple(self.options.grey_bg_color));
        let band_y = canvas.y();
        canvas.rect(BASE_MARGIN, band_y, TABLE_WIDTH, ROW_HEIGHT);

        canvas.set_x(ITEM_COL_NAME_OFFSET);
        canvas.cell(
            ITEM_COL_UNIT_PRICE_OFFSET - ITEM_COL_NAME_OFFSET,
            ROW_HEIGHT,
            &self.options.text_items_name_title,
            Align::Left,
        );
        canvas.set_x(ITEM_COL_UNIT_PRICE_OFFSET);
        canvas.cell(
            ITEM_COL_QUANTITY_OFFSET - ITEM_COL_UNIT_PRICE_OFFSET,
            ROW_HEIGHT,
            &self.options.text_items_unit_cost_title,
            Align::Left,
        );
        canvas.set_x(ITEM_COL_QUANTITY_OFFSET);
        canvas.cell(
            ITEM_COL_SUBTOTAL_OFFSET - ITEM_COL_QUANTITY_OFFSET,
            ROW_HEIGHT,
            &self.options.text_items_quantity_title,
            Align::Left,
        );
        canvas.set_x(ITEM_COL_SUBTOTAL_OFFSET);
        canvas.cell(
            ITEM_COL_DISCOUNT_OFFSET - ITEM_COL_SUBTOTAL_OFFSET,
            ROW_HEIGHT,
            &self.options.text_items_subtotal_title,
            Align::Left,
        );
        if self.options.show_discount_column {
            canvas.set_x(ITEM_COL_DISCOUNT_OFFSET);
            canvas.cell(
                ITEM_COL_TAX_OFFSET - ITEM_COL_DISCOUNT_OFFSET,
                ROW_HEIGHT,
                &self.options.text_items_discount_title,
                Align::Left,
            );
        }
        canvas.set_x(ITEM_COL_TAX_OFFSET);
        canvas.cell(
            ITEM_COL_TOTAL_OFFSET - ITEM_COL_TAX_OFFSET,
            ROW_HEIGHT,
            &self.options.text_items_tax_title,
            Align::Left,
        );
        canvas.set_x(ITEM_COL_TOTAL_OFFSET);
        canvas.cell(
            TABLE_RIGHT_EDGE - ITEM_COL_TOTAL_OFFSET,
            ROW_HEIGHT,
            &self.options.text_items_total_title,
            Align::Left,
        );
    }

    fn append_items(&self, canvas: &mut Canvas, formatter: &CurrencyFormatter) -> Result<(), Error> {
        self.draw_table_titles(canvas);
        canvas.set_xy(BASE_MARGIN, canvas.y() + 8.0);
        canvas.set_font(&self.options.font, BASE_TEXT_FONT_SIZE);
        let policy = self.options.rate_policy;

        for item in &self.items {
            let row_top = canvas.y();

            // Name and description wrap inside the name column; the canvas
            // reports the height they consumed, which drives the row height.
            canvas.set_xy(ITEM_COL_NAME_OFFSET, row_top);
            let name_width = ITEM_COL_UNIT_PRICE_OFFSET - ITEM_COL_NAME_OFFSET - 2.0;
            let mut used = canvas.multi_cell(name_width, 5.0, &item.name);
            if let Some(description) = &item.description {
                let saved_color = canvas.text_color();
                canvas.set_xy(ITEM_COL_NAME_OFFSET, row_top + used);
                canvas.set_font(&self.options.font, SMALL_TEXT_FONT_SIZE);
                canvas.set_text_color(Color::from_triple(self.options.grey_text_color));
                used += canvas.multi_cell(name_width, 3.5, description);
                canvas.set_text_color(saved_color);
                canvas.set_font(&self.options.font, BASE_TEXT_FONT_SIZE);
            }

            canvas.set_xy(ITEM_COL_UNIT_PRICE_OFFSET, row_top);
            canvas.cell(
                ITEM_COL_QUANTITY_OFFSET - ITEM_COL_UNIT_PRICE_OFFSET,
                ROW_HEIGHT,
                &formatter.format(item.unit_cost_value()?),
                Align::Left,
            );

            canvas.set_x(ITEM_COL_QUANTITY_OFFSET);
            canvas.cell(
                ITEM_COL_SUBTOTAL_OFFSET - ITEM_COL_QUANTITY_OFFSET,
                ROW_HEIGHT,
                &item.quantity_value()?.to_string(),
                Align::Left,
            );

            canvas.set_x(ITEM_COL_SUBTOTAL_OFFSET);
            canvas.cell(
                ITEM_COL_DISCOUNT_OFFSET - ITEM_COL_SUBTOTAL_OFFSET,
                ROW_HEIGHT,
                &formatter.format(item.discounted_total(policy)?),
                Align::Left,
            );

            if self.options.show_discount_column {
                canvas.set_x(ITEM_COL_DISCOUNT_OFFSET);
                let label = match &item.discount {
                    None => "--".to_string(),
                    Some(discount) => match discount.resolve("item.discount", policy)? {
                        Rate::Percent(percent) => format!("{percent} %"),
                        Rate::Amount(amount) => formatter.format(amount),
                    },
                };
                canvas.cell(
                    ITEM_COL_TAX_OFFSET - ITEM_COL_DISCOUNT_OFFSET,
                    ROW_HEIGHT,
                    &label,
                    Align::Left,
                );
            }

            canvas.set_x(ITEM_COL_TAX_OFFSET);
            let tax_label = match item.tax.as_ref().or(self.default_tax.as_ref()) {
                None => "--".to_string(),
                Some(tax) => match tax.resolve("item.tax", policy)? {
                    Rate::Percent(percent) => format!("{percent} %"),
                    Rate::Amount(amount) => formatter.format(amount),
                },
            };
            canvas.cell(
                ITEM_COL_TOTAL_OFFSET - ITEM_COL_TAX_OFFSET,
                ROW_HEIGHT,
                &tax_label,
                Align::Left,
            );

            canvas.set_x(ITEM_COL_TOTAL_OFFSET);
            canvas.cell(
                TABLE_RIGHT_EDGE - ITEM_COL_TOTAL_OFFSET,
                ROW_HEIGHT,
                &formatter.format(item.total_with_tax(self.default_tax.as_ref(), policy)?),
                Align::Left,
            );

            let row_height = used.max(ROW_HEIGHT);
            canvas.set_xy(BASE_MARGIN, row_top + row_height + ROW_SPACING);

            if canvas.y() > MAX_PAGE_HEIGHT {
                debug!(
                    page = canvas.page_no(),
                    reason = "row_overflow",
                    "page break"
                );
                canvas.add_page();
                self.draw_table_titles(canvas);
                canvas.set_xy(BASE_MARGIN, canvas.y() + 8.0);
                canvas.set_font(&self.options.font, BASE_TEXT_FONT_SIZE);
            }
        }
        Ok(())
    }

    /// Notes sit left of the totals block; the cursor is restored so the
    /// totals block starts from the same height.
    fn append_notes(&self, canvas: &mut Canvas) {
        if self.notes.is_empty() {
            return;
        }
        let saved_y = canvas.y();
        canvas.set_font(&self.options.font, 9.0);
        canvas.set_right_margin(NOTES_RIGHT_MARGIN);
        canvas.set_xy(BASE_MARGIN, saved_y + 10.0);
        let line_height = 9.0 * crate::font::PT_TO_MM;
        canvas.write_html(line_height, &self.notes);
        canvas.set_right_margin(BASE_MARGIN);
        canvas.set_y(saved_y);
    }

    fn append_totals(
        &self,
        canvas: &mut Canvas,
        formatter: &CurrencyFormatter,
        totals: &Totals,
    ) -> Result<(), Error> {
        canvas.set_y(canvas.y() + 10.0);
        canvas.set_font(&self.options.font, LARGE_TEXT_FONT_SIZE);
        canvas.set_text_color(Color::from_triple(self.options.base_text_color));

        let dark = Color::from_triple(self.options.dark_bg_color);
        let grey = Color::from_triple(self.options.grey_bg_color);

        let line = |canvas: &mut Canvas, title: &str, amount: String| {
            canvas.set_x(RIGHT_BLOCK_OFFSET);
            canvas.set_fill_color(dark);
            canvas.rect(RIGHT_BLOCK_OFFSET, canvas.y(), TOTALS_CELL_WIDTH, 10.0);
            canvas.cell(TOTALS_CELL_TEXT_WIDTH, 10.0, title, Align::Right);
            canvas.set_x(TOTALS_AMOUNT_TEXT_OFFSET);
            canvas.set_fill_color(grey);
            canvas.rect(TOTALS_AMOUNT_OFFSET, canvas.y(), TOTALS_CELL_WIDTH, 10.0);
            canvas.cell(TOTALS_CELL_TEXT_WIDTH, 10.0, &amount, Align::Left);
            canvas.set_y(canvas.y() + 10.0);
        };

        line(
            canvas,
            &self.options.text_total_total,
            formatter.format(totals.subtotal),
        );

        if let Some(discount) = &self.discount {
            let base_y = canvas.y();
            canvas.set_xy(RIGHT_BLOCK_OFFSET, base_y);
            canvas.set_fill_color(dark);
            canvas.rect(RIGHT_BLOCK_OFFSET, base_y, TOTALS_CELL_WIDTH, 15.0);
            canvas.cell(TOTALS_CELL_TEXT_WIDTH, 7.5, &self.options.text_total_discounted, Align::Right);

            canvas.set_xy(RIGHT_BLOCK_OFFSET, base_y + 7.5);
            canvas.set_font(&self.options.font, BASE_TEXT_FONT_SIZE);
            canvas.set_text_color(Color::from_triple(self.options.grey_text_color));
            let description = self.discount_description(formatter, totals, discount)?;
            canvas.cell(TOTALS_CELL_TEXT_WIDTH, 7.5, &description, Align::Right);
            canvas.set_font(&self.options.font, LARGE_TEXT_FONT_SIZE);
            canvas.set_text_color(Color::from_triple(self.options.base_text_color));

            canvas.set_xy(TOTALS_AMOUNT_TEXT_OFFSET, base_y);
            canvas.set_fill_color(grey);
            canvas.rect(TOTALS_AMOUNT_OFFSET, base_y, TOTALS_CELL_WIDTH, 15.0);
            canvas.cell(
                TOTALS_CELL_TEXT_WIDTH,
                15.0,
                &formatter.format(totals.discounted_subtotal),
                Align::Left,
            );
            canvas.set_y(base_y + 15.0);
        }

        line(
            canvas,
            &self.options.text_total_tax,
            formatter.format(totals.tax),
        );
        line(
            canvas,
            &self.options.text_total_with_tax,
            formatter.format(totals.total),
        );
        Ok(())
    }

    /// The small "-x % / -amount" (or "-amount / -x %") line inside the
    /// discounted-total cell.
    fn discount_description(
        &self,
        formatter: &CurrencyFormatter,
        totals: &Totals,
        discount: &Discount,
    ) -> Result<String, Error> {
        match discount.resolve("discount", self.options.rate_policy)? {
            Rate::Percent(percent) => {
                let amount_off = totals.subtotal - totals.discounted_subtotal;
                Ok(format!("-{percent} % / -{}", formatter.format(amount_off)))
            }
            Rate::Amount(amount) => {
                let percent = if totals.subtotal.is_zero() {
                    Decimal::ZERO
                } else {
                    amount * Decimal::ONE_HUNDRED / totals.subtotal
                };
                Ok(format!(
                    "-{} / -{} %",
                    formatter.format(amount),
                    percent.round_dp(2)
                ))
            }
        }
    }

    fn append_payment_term(&self, canvas: &mut Canvas) {
        if self.payment_term.is_empty() {
            return;
        }
        canvas.set_y(canvas.y() + 15.0);
        canvas.set_x(RIGHT_BLOCK_OFFSET);
        canvas.set_font(&self.options.bold_font, 10.0);
        let text = format!(
            "{}: {}",
            self.options.text_payment_term_title, self.payment_term
        );
        canvas.cell(RIGHT_BLOCK_WIDTH, 4.0, &text, Align::Right);
    }
}
