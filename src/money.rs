use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::Error;
use crate::options::Options;

/// Parse a decimal-bearing field. Failure is a hard error carrying the field
/// path and the offending value; nothing downstream ever sees a coerced zero.
pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, Error> {
    Decimal::from_str(value.trim()).map_err(|_| Error::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Formats decimal amounts as currency strings: symbol prefix, configurable
/// precision, thousands grouping and decimal separator.
#[derive(Debug, Clone)]
pub(crate) struct CurrencyFormatter {
    symbol: String,
    precision: u32,
    decimal: String,
    thousand: String,
}

impl CurrencyFormatter {
    pub(crate) fn new(options: &Options) -> Self {
        Self {
            symbol: options.currency_symbol.clone(),
            precision: options.currency_precision,
            decimal: options.currency_decimal.clone(),
            thousand: options.currency_thousand.clone(),
        }
    }

    pub(crate) fn format(&self, value: Decimal) -> String {
        let rounded = value.round_dp(self.precision);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let plain = format!("{:.*}", self.precision as usize, rounded.abs());
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (plain.as_str(), None),
        };

        let mut out = String::with_capacity(plain.len() + self.symbol.len() + 4);
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        let digits = int_part.as_bytes();
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push_str(&self.thousand);
            }
            out.push(*digit as char);
        }
        if let Some(frac) = frac_part {
            out.push_str(&self.decimal);
            out.push_str(frac);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn formatter() -> CurrencyFormatter {
        CurrencyFormatter::new(&Options::default())
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_decimal("items[0].unit_cost", "12,5").unwrap_err();
        match err {
            Error::InvalidNumber { field, value } => {
                assert_eq!(field, "items[0].unit_cost");
                assert_eq!(value, "12,5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_accepts_plain_decimals() {
        assert_eq!(parse_decimal("q", "2").unwrap(), dec!(2));
        assert_eq!(parse_decimal("q", " 99876.89 ").unwrap(), dec!(99876.89));
        assert_eq!(parse_decimal("q", "-0.5").unwrap(), dec!(-0.5));
    }

    #[test]
    fn formats_with_grouping_and_separators() {
        // Default options: "€ " symbol, precision 2, "," decimal, "." thousand.
        assert_eq!(formatter().format(dec!(1234567.891)), "€ 1.234.567,89");
        assert_eq!(formatter().format(dec!(0)), "€ 0,00");
        assert_eq!(formatter().format(dec!(-42.5)), "-€ 42,50");
    }

    #[test]
    fn zero_precision_drops_the_fraction() {
        let mut options = Options::default();
        options.currency_precision = 0;
        let formatter = CurrencyFormatter::new(&options);
        assert_eq!(formatter.format(dec!(1250.6)), "€ 1.251");
    }
}
