use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::money::parse_decimal;

/// How empty tax/discount specs are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePolicy {
    /// A spec with neither percent nor amount is an error.
    #[default]
    Strict,
    /// A spec with neither percent nor amount resolves to zero percent.
    Lenient,
}

/// A resolved tax or discount. Amount wins over percent when both fields of
/// a spec are set, so the precedence rule is decided once, here, and the
/// engines only ever see one of the two variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    Percent(Decimal),
    Amount(Decimal),
}

impl Rate {
    /// The value this rate removes from `base` (discount semantics).
    pub(crate) fn discount_off(&self, base: Decimal) -> Decimal {
        match self {
            Rate::Amount(amount) => base - *amount,
            Rate::Percent(percent) => base - base * *percent / Decimal::ONE_HUNDRED,
        }
    }

    /// The value this rate adds on top of `base` (tax semantics). An amount
    /// rate is a flat surcharge, independent of the base.
    pub(crate) fn tax_on(&self, base: Decimal) -> Decimal {
        match self {
            Rate::Amount(amount) => *amount,
            Rate::Percent(percent) => base * *percent / Decimal::ONE_HUNDRED,
        }
    }
}

/// Tax as a percent or a fixed amount, expressed as decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
    /// Tax in percent, e.g. "20".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<String>,
    /// Tax as a fixed amount, e.g. "123.40". Takes precedence over percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl Tax {
    pub fn percent(value: impl Into<String>) -> Self {
        Self {
            percent: Some(value.into()),
            amount: None,
        }
    }

    pub fn amount(value: impl Into<String>) -> Self {
        Self {
            percent: None,
            amount: Some(value.into()),
        }
    }

    pub(crate) fn resolve(&self, field: &str, policy: RatePolicy) -> Result<Rate, Error> {
        resolve_rate(
            self.percent.as_deref(),
            self.amount.as_deref(),
            field,
            policy,
        )
    }
}

/// Discount as a percent or a fixed amount; same shape and resolution rules
/// as [`Tax`], kept as its own type so the two cannot be swapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// Discount in percent, e.g. "17".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<String>,
    /// Discount as a fixed amount. Takes precedence over percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl Discount {
    pub fn percent(value: impl Into<String>) -> Self {
        Self {
            percent: Some(value.into()),
            amount: None,
        }
    }

    pub fn amount(value: impl Into<String>) -> Self {
        Self {
            percent: None,
            amount: Some(value.into()),
        }
    }

    pub(crate) fn resolve(&self, field: &str, policy: RatePolicy) -> Result<Rate, Error> {
        resolve_rate(
            self.percent.as_deref(),
            self.amount.as_deref(),
            field,
            policy,
        )
    }
}

fn resolve_rate(
    percent: Option<&str>,
    amount: Option<&str>,
    field: &str,
    policy: RatePolicy,
) -> Result<Rate, Error> {
    // Empty strings count as unset, as in the wire model.
    let percent = percent.filter(|v| !v.is_empty());
    let amount = amount.filter(|v| !v.is_empty());

    match (percent, amount) {
        (_, Some(amount)) => Ok(Rate::Amount(parse_decimal(
            &format!("{field}.amount"),
            amount,
        )?)),
        (Some(percent), None) => Ok(Rate::Percent(parse_decimal(
            &format!("{field}.percent"),
            percent,
        )?)),
        (None, None) => match policy {
            RatePolicy::Strict => Err(Error::InvalidTaxOrDiscount),
            RatePolicy::Lenient => Ok(Rate::Percent(Decimal::ZERO)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_wins_over_percent() {
        let tax = Tax {
            percent: Some("20".into()),
            amount: Some("89".into()),
        };
        assert_eq!(
            tax.resolve("tax", RatePolicy::Strict).unwrap(),
            Rate::Amount(dec!(89))
        );
    }

    #[test]
    fn percent_used_when_amount_absent() {
        let discount = Discount::percent("30");
        assert_eq!(
            discount.resolve("discount", RatePolicy::Strict).unwrap(),
            Rate::Percent(dec!(30))
        );
    }

    #[test]
    fn empty_amount_string_falls_back_to_percent() {
        let tax = Tax {
            percent: Some("10".into()),
            amount: Some(String::new()),
        };
        assert_eq!(
            tax.resolve("tax", RatePolicy::Strict).unwrap(),
            Rate::Percent(dec!(10))
        );
    }

    #[test]
    fn empty_spec_errors_under_strict() {
        let tax = Tax::default();
        assert!(matches!(
            tax.resolve("tax", RatePolicy::Strict),
            Err(Error::InvalidTaxOrDiscount)
        ));
    }

    #[test]
    fn empty_spec_is_zero_percent_under_lenient() {
        let tax = Tax::default();
        assert_eq!(
            tax.resolve("tax", RatePolicy::Lenient).unwrap(),
            Rate::Percent(Decimal::ZERO)
        );
    }

    #[test]
    fn malformed_value_is_a_loud_error() {
        let discount = Discount::amount("12,5");
        match discount.resolve("discount", RatePolicy::Strict) {
            Err(Error::InvalidNumber { field, value }) => {
                assert_eq!(field, "discount.amount");
                assert_eq!(value, "12,5");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn rate_application() {
        assert_eq!(Rate::Percent(dec!(50)).discount_off(dec!(100)), dec!(50));
        assert_eq!(Rate::Amount(dec!(20)).discount_off(dec!(100)), dec!(80));
        assert_eq!(Rate::Percent(dec!(20)).tax_on(dec!(200)), dec!(40));
        // Flat tax ignores the base entirely.
        assert_eq!(Rate::Amount(dec!(5)).tax_on(dec!(0)), dec!(5));
    }
}
