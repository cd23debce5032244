//! Property-based checks for the monetary identities the totals engine
//! guarantees.

use facture::{Contact, Discount, Document, DocumentType, Item, Options, Tax};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// A price between 0.01 and 99999.99.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (1u64..10_000_000u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// A quantity between 1 and 999.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1u64..1000u64).prop_map(|n| Decimal::from(n))
}

/// A percentage between 0.01 and 99.99.
fn arb_percent() -> impl Strategy<Value = Decimal> {
    (1u64..10_000u64).prop_map(|bps| Decimal::new(bps as i64, 2))
}

fn doc_with(items: Vec<Item>) -> Document {
    let mut doc = Document::new(DocumentType::Invoice, Options::default())
        .with_ref("PROP-1")
        .with_company(Contact::new("ACME"))
        .with_customer(Contact::new("Customer"));
    for item in items {
        doc = doc.add_item(item);
    }
    doc
}

proptest! {
    /// Without discount or tax, a line total is exactly cost × quantity.
    #[test]
    fn bare_line_total_is_exact(price in arb_price(), quantity in arb_quantity()) {
        let doc = doc_with(vec![Item::new(
            "Widget",
            price.to_string(),
            quantity.to_string(),
        )]);
        let totals = doc.totals().unwrap();
        prop_assert_eq!(totals.subtotal, price * quantity);
        prop_assert_eq!(totals.tax, Decimal::ZERO);
        prop_assert_eq!(totals.total, price * quantity);
    }

    /// A percent discount with no tax scales the gross exactly.
    #[test]
    fn percent_discount_identity(
        price in arb_price(),
        quantity in arb_quantity(),
        discount in arb_percent(),
    ) {
        let doc = doc_with(vec![Item::new("Widget", price.to_string(), quantity.to_string())
            .with_discount(Discount::percent(discount.to_string()))]);
        let totals = doc.totals().unwrap();
        let gross = price * quantity;
        let expected = gross - gross * discount / Decimal::ONE_HUNDRED;
        prop_assert_eq!(totals.total, expected);
    }

    /// Without a document discount, the grand total is the subtotal plus the
    /// plain sum of item taxes.
    #[test]
    fn grand_total_without_document_discount(
        price in arb_price(),
        quantity in arb_quantity(),
        tax in arb_percent(),
    ) {
        let doc = doc_with(vec![
            Item::new("A", price.to_string(), quantity.to_string())
                .with_tax(Tax::percent(tax.to_string())),
            Item::new("B", price.to_string(), "1").with_tax(Tax::amount("5")),
        ]);
        let totals = doc.totals().unwrap();
        prop_assert_eq!(totals.total, totals.subtotal + totals.tax);
        let gross = price * quantity;
        let expected_tax = gross * tax / Decimal::ONE_HUNDRED + Decimal::from(5);
        prop_assert_eq!(totals.tax, expected_tax);
    }

    /// An amount-mode document discount reduces the subtotal verbatim and
    /// recomputes percent-based item taxes; the result differs from naively
    /// reusing the undiscounted tax.
    #[test]
    fn amount_document_discount_redistributes(
        price in arb_price(),
        quantity in arb_quantity(),
        tax in arb_percent(),
    ) {
        let gross = price * quantity;
        // Discount half the subtotal so the discounted subtotal stays
        // non-zero and the redistribution is visible.
        let discount_amount = (gross / Decimal::from(2)).round_dp(2);
        prop_assume!(!discount_amount.is_zero());
        let doc = doc_with(vec![Item::new("A", price.to_string(), quantity.to_string())
            .with_tax(Tax::percent(tax.to_string()))])
            .with_discount(Discount::amount(discount_amount.to_string()));

        let totals = doc.totals().unwrap();
        prop_assert_eq!(totals.discounted_subtotal, gross - discount_amount);
        prop_assert_eq!(totals.total, totals.discounted_subtotal + totals.tax);

        let undiscounted_tax = gross * tax / Decimal::ONE_HUNDRED;
        prop_assert!(
            totals.tax < undiscounted_tax,
            "redistribution must shrink a percent tax: {} vs {}",
            totals.tax,
            undiscounted_tax
        );
    }

    /// Totals are a pure function of the document.
    #[test]
    fn totals_are_idempotent(
        price in arb_price(),
        quantity in arb_quantity(),
        tax in arb_percent(),
        discount in arb_percent(),
    ) {
        let doc = doc_with(vec![Item::new("A", price.to_string(), quantity.to_string())
            .with_tax(Tax::percent(tax.to_string()))])
            .with_discount(Discount::percent(discount.to_string()));
        let first = doc.totals().unwrap();
        let second = doc.totals().unwrap();
        prop_assert_eq!(first.subtotal, second.subtotal);
        prop_assert_eq!(first.discounted_subtotal, second.discounted_subtotal);
        prop_assert_eq!(first.tax, second.tax);
        prop_assert_eq!(first.total, second.total);
    }
}
