use serde::{Deserialize, Serialize};

use crate::rate::RatePolicy;

/// Presentation and policy configuration. Everything user-visible — labels,
/// colors, fonts, currency formatting — is overridable here; the layout
/// geometry itself is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Embed an auto-print action in the output.
    pub auto_print: bool,

    pub currency_symbol: String,
    pub currency_precision: u32,
    pub currency_decimal: String,
    pub currency_thousand: String,

    pub base_text_color: [u8; 3],
    pub grey_text_color: [u8; 3],
    pub grey_bg_color: [u8; 3],
    pub dark_bg_color: [u8; 3],

    pub font: String,
    pub bold_font: String,

    pub text_type_invoice: String,
    pub text_type_quotation: String,
    pub text_type_delivery_note: String,

    pub text_ref_title: String,
    pub text_version_title: String,
    pub text_date_title: String,
    pub text_client_ref_title: String,
    pub text_validity_date_title: String,
    pub text_payment_term_title: String,

    pub text_items_name_title: String,
    pub text_items_unit_cost_title: String,
    pub text_items_quantity_title: String,
    pub text_items_subtotal_title: String,
    pub text_items_discount_title: String,
    pub text_items_tax_title: String,
    pub text_items_total_title: String,

    pub text_total_total: String,
    pub text_total_discounted: String,
    pub text_total_tax: String,
    pub text_total_with_tax: String,

    /// Render the per-item discount column.
    pub show_discount_column: bool,
    /// How empty tax/discount specs are treated during validation.
    pub rate_policy: RatePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_print: false,

            currency_symbol: "€ ".to_string(),
            currency_precision: 2,
            currency_decimal: ",".to_string(),
            currency_thousand: ".".to_string(),

            base_text_color: [35, 35, 35],
            grey_text_color: [82, 82, 82],
            grey_bg_color: [232, 232, 232],
            dark_bg_color: [212, 212, 212],

            font: "Helvetica".to_string(),
            bold_font: "Helvetica-Bold".to_string(),

            text_type_invoice: "INVOICE".to_string(),
            text_type_quotation: "QUOTATION".to_string(),
            text_type_delivery_note: "DELIVERY NOTE".to_string(),

            text_ref_title: "Ref.".to_string(),
            text_version_title: "Version".to_string(),
            text_date_title: "Date".to_string(),
            text_client_ref_title: "Client ref.".to_string(),
            text_validity_date_title: "Validity date".to_string(),
            text_payment_term_title: "Payment term".to_string(),

            text_items_name_title: "Name".to_string(),
            text_items_unit_cost_title: "Unit price".to_string(),
            text_items_quantity_title: "Quantity".to_string(),
            text_items_subtotal_title: "Total".to_string(),
            text_items_discount_title: "Discount".to_string(),
            text_items_tax_title: "Tax".to_string(),
            text_items_total_title: "Total with tax".to_string(),

            text_total_total: "TOTAL".to_string(),
            text_total_discounted: "TOTAL DISCOUNTED".to_string(),
            text_total_tax: "TAX".to_string(),
            text_total_with_tax: "TOTAL WITH TAX".to_string(),

            show_discount_column: true,
            rate_policy: RatePolicy::Strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_labels() {
        let options = Options::default();
        assert_eq!(options.currency_symbol, "€ ");
        assert_eq!(options.text_type_invoice, "INVOICE");
        assert_eq!(options.rate_policy, RatePolicy::Strict);
        assert!(options.show_discount_column);
        assert!(!options.auto_print);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let options: Options =
            serde_json::from_str(r#"{"currency_symbol": "$", "auto_print": true}"#).unwrap();
        assert_eq!(options.currency_symbol, "$");
        assert!(options.auto_print);
        assert_eq!(options.currency_precision, 2);
        assert_eq!(options.text_total_total, "TOTAL");
    }
}
