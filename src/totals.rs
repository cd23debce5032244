use rust_decimal::Decimal;

use crate::document::Document;
use crate::error::Error;
use crate::rate::Rate;

/// Aggregated document amounts, all unrounded. Presentation rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totals {
    /// Sum of per-item discounted totals, before the document discount.
    pub subtotal: Decimal,
    /// Subtotal after the document discount (equals `subtotal` without one).
    pub discounted_subtotal: Decimal,
    /// Total tax, with the document discount redistributed into every
    /// percent-based item tax.
    pub tax: Decimal,
    /// `discounted_subtotal + tax`.
    pub total: Decimal,
}

impl Document {
    /// Sum of per-item totals with item discounts applied, without tax and
    /// without the document discount.
    pub fn subtotal(&self) -> Result<Decimal, Error> {
        let policy = self.options.rate_policy;
        let mut total = Decimal::ZERO;
        for item in &self.items {
            total += item.discounted_total(policy)?;
        }
        Ok(total)
    }

    /// Subtotal with the document discount applied.
    pub fn total_without_tax(&self) -> Result<Decimal, Error> {
        let subtotal = self.subtotal()?;
        match &self.discount {
            None => Ok(subtotal),
            Some(discount) => {
                let rate = discount.resolve("discount", self.options.rate_policy)?;
                Ok(rate.discount_off(subtotal))
            }
        }
    }

    /// Total tax. Without a document discount this is the plain sum of item
    /// taxes. With one, the discount is folded into every percent-based item
    /// tax exactly once: the discount is converted to an equivalent percent
    /// (an amount discount divides by the post-discount subtotal), each
    /// item's pre-tax value is reduced by that percent, and its percent tax
    /// is recomputed on the reduced value. Amount-mode item taxes are flat
    /// and pass through unchanged.
    pub fn tax_total(&self) -> Result<Decimal, Error> {
        let policy = self.options.rate_policy;

        let Some(discount) = &self.discount else {
            let mut tax = Decimal::ZERO;
            for item in &self.items {
                tax += item.tax_amount(self.default_tax.as_ref(), policy)?;
            }
            return Ok(tax);
        };

        let subtotal = self.subtotal()?;
        let equivalent_percent = match discount.resolve("discount", policy)? {
            Rate::Percent(percent) => percent,
            Rate::Amount(amount) => {
                let discounted = subtotal - amount;
                if discounted.is_zero() {
                    return Err(Error::DivisionByZero);
                }
                amount * Decimal::ONE_HUNDRED / discounted
            }
        };

        let mut tax = Decimal::ZERO;
        for item in &self.items {
            let Some(spec) = item.tax.as_ref().or(self.default_tax.as_ref()) else {
                continue;
            };
            match spec.resolve("item.tax", policy)? {
                Rate::Amount(amount) => tax += amount,
                Rate::Percent(percent) => {
                    let item_total = item.discounted_total(policy)?;
                    let reduced =
                        item_total - equivalent_percent * item_total / Decimal::ONE_HUNDRED;
                    tax += reduced * percent / Decimal::ONE_HUNDRED;
                }
            }
        }
        Ok(tax)
    }

    /// Grand total: discounted subtotal plus redistributed tax. Never the
    /// naive sum of per-item totals when a document discount exists.
    pub fn total_with_tax(&self) -> Result<Decimal, Error> {
        Ok(self.total_without_tax()? + self.tax_total()?)
    }

    /// All document amounts in one pass.
    pub fn totals(&self) -> Result<Totals, Error> {
        let subtotal = self.subtotal()?;
        let discounted_subtotal = self.total_without_tax()?;
        let tax = self.tax_total()?;
        Ok(Totals {
            subtotal,
            discounted_subtotal,
            tax,
            total: discounted_subtotal + tax,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentType};
    use crate::item::Item;
    use crate::options::Options;
    use crate::rate::{Discount, Tax};
    use rust_decimal_macros::dec;

    fn base_doc() -> Document {
        Document::new(DocumentType::Invoice, Options::default())
    }

    #[test]
    fn no_discount_totals_add_up() {
        let doc = base_doc().add_item(Item::new("Widget", "100", "2").with_tax(Tax::percent("20")));
        let totals = doc.totals().unwrap();
        assert_eq!(totals.subtotal, dec!(200));
        assert_eq!(totals.discounted_subtotal, dec!(200));
        assert_eq!(totals.tax, dec!(40));
        assert_eq!(totals.total, dec!(240));
    }

    #[test]
    fn amount_discount_redistributes_into_percent_tax() {
        let doc = base_doc()
            .add_item(Item::new("Widget", "100", "2").with_tax(Tax::percent("20")))
            .with_discount(Discount::amount("20"));
        let totals = doc.totals().unwrap();
        assert_eq!(totals.subtotal, dec!(200));
        assert_eq!(totals.discounted_subtotal, dec!(180));
        // Equivalent percent = 20 * 100 / 180; tax = 200*(1-p/100) * 20%.
        assert_eq!(totals.tax.round_dp(3), dec!(35.556));
        assert_eq!(totals.total.round_dp(3), dec!(215.556));
        // Redistribution actually happened: not the undiscounted 40.
        assert_ne!(totals.tax, dec!(40));
    }

    #[test]
    fn percent_discount_redistributes_into_percent_tax() {
        let doc = base_doc()
            .add_item(Item::new("Widget", "100", "2").with_tax(Tax::percent("20")))
            .with_discount(Discount::percent("10"));
        let totals = doc.totals().unwrap();
        assert_eq!(totals.discounted_subtotal, dec!(180));
        // Item net 200 * 0.9 = 180, tax 36.
        assert_eq!(totals.tax, dec!(36.0));
        assert_eq!(totals.total, dec!(216.0));
    }

    #[test]
    fn flat_item_tax_survives_the_document_discount() {
        let doc = base_doc()
            .add_item(Item::new("Widget", "100", "1").with_tax(Tax::amount("89")))
            .with_discount(Discount::percent("50"));
        let totals = doc.totals().unwrap();
        assert_eq!(totals.discounted_subtotal, dec!(50));
        assert_eq!(totals.tax, dec!(89));
        assert_eq!(totals.total, dec!(139));
    }

    #[test]
    fn default_tax_participates_in_redistribution() {
        let mut doc = base_doc()
            .add_item(Item::new("Widget", "100", "1"))
            .with_discount(Discount::percent("10"));
        doc = doc.with_default_tax(Tax::percent("10"));
        let totals = doc.totals().unwrap();
        assert_eq!(totals.discounted_subtotal, dec!(90));
        assert_eq!(totals.tax, dec!(9.0));
    }

    #[test]
    fn grand_total_is_never_the_naive_item_sum_under_a_document_discount() {
        let policy = crate::rate::RatePolicy::Strict;
        let doc = base_doc()
            .add_item(Item::new("A", "100", "2").with_tax(Tax::percent("20")))
            .add_item(Item::new("B", "50", "1").with_tax(Tax::percent("10")))
            .with_discount(Discount::amount("25"));
        let naive: Decimal = doc
            .items
            .iter()
            .map(|item| item.total_with_tax(None, policy).unwrap())
            .sum();
        let total = doc.total_with_tax().unwrap();
        assert!(total < naive);
    }

    #[test]
    fn discount_equal_to_subtotal_is_division_by_zero() {
        let doc = base_doc()
            .add_item(Item::new("Widget", "100", "2").with_tax(Tax::percent("20")))
            .with_discount(Discount::amount("200"));
        assert!(matches!(doc.tax_total(), Err(Error::DivisionByZero)));
    }

    #[test]
    fn totals_are_idempotent() {
        let doc = base_doc()
            .add_item(Item::new("Widget", "99876.89", "2").with_tax(Tax::percent("20")))
            .add_item(
                Item::new("Gadget", "3576.89", "2").with_discount(Discount::percent("50")),
            )
            .with_discount(Discount::amount("1340"));
        let first = doc.totals().unwrap();
        let second = doc.totals().unwrap();
        assert_eq!(first, second);
    }
}
