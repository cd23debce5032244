use crate::contact::Contact;
use crate::document::Document;
use crate::error::Error;
use crate::money::parse_decimal;

fn require_non_empty(field: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::Validation {
            field: field.to_string(),
            message: "required".to_string(),
        });
    }
    Ok(())
}

fn require_max_chars(field: &str, value: &str, max: usize) -> Result<(), Error> {
    if value.chars().count() > max {
        return Err(Error::Validation {
            field: field.to_string(),
            message: format!("longer than {max} characters"),
        });
    }
    Ok(())
}

fn validate_contact(field: &str, contact: &Contact) -> Result<(), Error> {
    require_non_empty(&format!("{field}.name"), &contact.name)?;
    require_max_chars(&format!("{field}.name"), &contact.name, 256)?;
    if let Some(address) = &contact.address {
        require_non_empty(&format!("{field}.address.address"), &address.address)?;
    }
    Ok(())
}

impl Document {
    /// Check required fields, bounds, and the parseability of every numeric
    /// field before any layout work happens. First failure aborts.
    pub fn validate(&self) -> Result<(), Error> {
        require_non_empty("ref", &self.reference)?;
        require_max_chars("ref", &self.reference, 32)?;
        require_max_chars("version", &self.version, 32)?;
        require_max_chars("client_ref", &self.client_ref, 64)?;
        require_max_chars("description", &self.description, 1024)?;

        let company = self.company.as_ref().ok_or_else(|| Error::Validation {
            field: "company".to_string(),
            message: "required".to_string(),
        })?;
        validate_contact("company", company)?;

        let customer = self.customer.as_ref().ok_or_else(|| Error::Validation {
            field: "customer".to_string(),
            message: "required".to_string(),
        })?;
        validate_contact("customer", customer)?;

        let policy = self.options.rate_policy;
        for (index, item) in self.items.iter().enumerate() {
            require_non_empty(&format!("items[{index}].name"), &item.name)?;
            parse_decimal(&format!("items[{index}].unit_cost"), &item.unit_cost)?;
            parse_decimal(&format!("items[{index}].quantity"), &item.quantity)?;
            if let Some(tax) = &item.tax {
                tax.resolve(&format!("items[{index}].tax"), policy)?;
            }
            if let Some(discount) = &item.discount {
                discount.resolve(&format!("items[{index}].discount"), policy)?;
            }
        }

        if let Some(tax) = &self.default_tax {
            tax.resolve("default_tax", policy)?;
        }
        if let Some(discount) = &self.discount {
            discount.resolve("discount", policy)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Address, Contact};
    use crate::document::DocumentType;
    use crate::item::Item;
    use crate::options::Options;
    use crate::rate::{RatePolicy, Tax};

    fn valid_doc() -> Document {
        Document::new(DocumentType::Invoice, Options::default())
            .with_ref("F-2026-001")
            .with_company(Contact::new("ACME").with_address(Address::new("1 Main St")))
            .with_customer(Contact::new("Customer"))
            .add_item(Item::new("Widget", "100", "2"))
    }

    #[test]
    fn valid_document_passes() {
        valid_doc().validate().unwrap();
    }

    #[test]
    fn missing_ref_fails() {
        let doc = valid_doc().with_ref("");
        assert!(matches!(
            doc.validate(),
            Err(Error::Validation { field, .. }) if field == "ref"
        ));
    }

    #[test]
    fn overlong_ref_fails() {
        let doc = valid_doc().with_ref("X".repeat(33));
        assert!(doc.validate().is_err());
    }

    #[test]
    fn missing_company_fails() {
        let mut doc = valid_doc();
        doc.company = None;
        assert!(matches!(
            doc.validate(),
            Err(Error::Validation { field, .. }) if field == "company"
        ));
    }

    #[test]
    fn empty_item_name_fails() {
        let doc = valid_doc().add_item(Item::new("", "1", "1"));
        assert!(matches!(
            doc.validate(),
            Err(Error::Validation { field, .. }) if field == "items[1].name"
        ));
    }

    #[test]
    fn malformed_unit_cost_fails_before_layout() {
        let doc = valid_doc().add_item(Item::new("Widget", "1O0", "2"));
        assert!(matches!(
            doc.validate(),
            Err(Error::InvalidNumber { field, .. }) if field == "items[1].unit_cost"
        ));
    }

    #[test]
    fn empty_tax_spec_fails_under_strict_but_not_lenient() {
        let doc = valid_doc().with_default_tax(Tax::default());
        assert!(matches!(
            doc.validate(),
            Err(Error::InvalidTaxOrDiscount)
        ));

        let mut lenient = Options::default();
        lenient.rate_policy = RatePolicy::Lenient;
        let mut doc = valid_doc().with_default_tax(Tax::default());
        doc.options = lenient;
        doc.validate().unwrap();
    }

    #[test]
    fn contact_address_requires_first_line() {
        let doc = valid_doc().with_company(
            Contact::new("ACME").with_address(Address::new("")),
        );
        assert!(matches!(
            doc.validate(),
            Err(Error::Validation { field, .. }) if field == "company.address.address"
        ));
    }
}
