use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::money::parse_decimal;
use crate::rate::{Discount, RatePolicy, Tax};

/// One billable row: a product or a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit cost as a decimal string.
    pub unit_cost: String,
    /// Quantity as a decimal string.
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Tax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        unit_cost: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit_cost: unit_cost.into(),
            quantity: quantity.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tax(mut self, tax: Tax) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }

    pub(crate) fn unit_cost_value(&self) -> Result<Decimal, Error> {
        parse_decimal("item.unit_cost", &self.unit_cost)
    }

    pub(crate) fn quantity_value(&self) -> Result<Decimal, Error> {
        parse_decimal("item.quantity", &self.quantity)
    }

    /// `unit_cost * quantity`, before any discount or tax.
    pub fn gross_total(&self) -> Result<Decimal, Error> {
        Ok(self.unit_cost_value()? * self.quantity_value()?)
    }

    /// Gross total after this item's own discount. An amount discount is
    /// subtracted verbatim; a percent discount removes that share of the
    /// gross. No rounding happens here.
    pub fn discounted_total(&self, policy: RatePolicy) -> Result<Decimal, Error> {
        let total = self.gross_total()?;
        match &self.discount {
            None => Ok(total),
            Some(discount) => Ok(discount.resolve("item.discount", policy)?.discount_off(total)),
        }
    }

    /// Tax carried by this item, computed on the discounted total. Falls
    /// back to `default_tax` when the item has no tax of its own; with
    /// neither, the tax is zero. An amount tax is a flat surcharge,
    /// unaffected by quantity or discount.
    pub fn tax_amount(&self, default_tax: Option<&Tax>, policy: RatePolicy) -> Result<Decimal, Error> {
        let Some(spec) = self.tax.as_ref().or(default_tax) else {
            return Ok(Decimal::ZERO);
        };
        let rate = spec.resolve("item.tax", policy)?;
        Ok(rate.tax_on(self.discounted_total(policy)?))
    }

    /// Discounted total plus tax.
    pub fn total_with_tax(
        &self,
        default_tax: Option<&Tax>,
        policy: RatePolicy,
    ) -> Result<Decimal, Error> {
        Ok(self.discounted_total(policy)? + self.tax_amount(default_tax, policy)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const STRICT: RatePolicy = RatePolicy::Strict;

    #[test]
    fn bare_item_total_is_cost_times_quantity() {
        let item = Item::new("Widget", "100", "2");
        assert_eq!(item.gross_total().unwrap(), dec!(200));
        assert_eq!(item.discounted_total(STRICT).unwrap(), dec!(200));
        assert_eq!(item.tax_amount(None, STRICT).unwrap(), dec!(0));
        assert_eq!(item.total_with_tax(None, STRICT).unwrap(), dec!(200));
    }

    #[test]
    fn percent_discount_scales_the_gross() {
        let item = Item::new("Widget", "3576.89", "2").with_discount(Discount::percent("50"));
        assert_eq!(item.discounted_total(STRICT).unwrap(), dec!(3576.89));
    }

    #[test]
    fn amount_discount_subtracts_verbatim() {
        let item = Item::new("Widget", "889.89", "2").with_discount(Discount::amount("234.67"));
        assert_eq!(item.discounted_total(STRICT).unwrap(), dec!(1545.11));
    }

    #[test]
    fn percent_tax_applies_after_the_discount() {
        let item = Item::new("Widget", "100", "2")
            .with_discount(Discount::percent("10"))
            .with_tax(Tax::percent("20"));
        assert_eq!(item.discounted_total(STRICT).unwrap(), dec!(180));
        assert_eq!(item.tax_amount(None, STRICT).unwrap(), dec!(36));
        assert_eq!(item.total_with_tax(None, STRICT).unwrap(), dec!(216));
    }

    #[test]
    fn flat_tax_ignores_quantity_and_discount() {
        let item = Item::new("Widget", "10", "10")
            .with_discount(Discount::percent("50"))
            .with_tax(Tax::amount("5"));
        assert_eq!(item.discounted_total(STRICT).unwrap(), dec!(50));
        assert_eq!(item.tax_amount(None, STRICT).unwrap(), dec!(5));
        assert_eq!(item.total_with_tax(None, STRICT).unwrap(), dec!(55));
    }

    #[test]
    fn default_tax_fills_in_only_when_item_has_none() {
        let default_tax = Tax::percent("10");
        let plain = Item::new("Widget", "100", "1");
        assert_eq!(
            plain.tax_amount(Some(&default_tax), STRICT).unwrap(),
            dec!(10)
        );

        let own = Item::new("Widget", "100", "1").with_tax(Tax::percent("20"));
        assert_eq!(own.tax_amount(Some(&default_tax), STRICT).unwrap(), dec!(20));
    }

    #[test]
    fn malformed_quantity_fails_loudly() {
        let item = Item::new("Widget", "100", "two");
        assert!(matches!(
            item.gross_total(),
            Err(Error::InvalidNumber { .. })
        ));
    }
}
