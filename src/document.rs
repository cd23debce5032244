use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::error::Error;
use crate::header_footer::HeaderFooter;
use crate::item::Item;
use crate::options::Options;
use crate::rate::{Discount, Tax};

/// The kind of document being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Invoice,
    Quotation,
    DeliveryNote,
}

impl DocumentType {
    /// The user-facing title for this type, taken from the options so every
    /// label stays overridable.
    pub(crate) fn label<'a>(&self, options: &'a Options) -> &'a str {
        match self {
            DocumentType::Invoice => &options.text_type_invoice,
            DocumentType::Quotation => &options.text_type_quotation,
            DocumentType::DeliveryNote => &options.text_type_delivery_note,
        }
    }
}

impl FromStr for DocumentType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "INVOICE" => Ok(DocumentType::Invoice),
            "QUOTATION" => Ok(DocumentType::Quotation),
            "DELIVERY_NOTE" => Ok(DocumentType::DeliveryNote),
            other => Err(Error::InvalidDocumentType(other.to_string())),
        }
    }
}

/// A document under construction. Built by value: every setter consumes and
/// returns the document, so a configured `Document` is owned by exactly one
/// caller and there is no shared mutable state between concurrent builds.
/// `build()` takes `&self` and creates a fresh canvas per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(default)]
    pub options: Options,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderFooter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<HeaderFooter>,
    #[serde(default, rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_ref: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Contact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub validity_date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payment_term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tax: Option<Tax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
}

impl Document {
    pub fn new(doc_type: DocumentType, options: Options) -> Self {
        Self {
            doc_type,
            options,
            header: None,
            footer: None,
            reference: String::new(),
            version: String::new(),
            client_ref: String::new(),
            description: String::new(),
            notes: String::new(),
            company: None,
            customer: None,
            items: Vec::new(),
            date: String::new(),
            validity_date: String::new(),
            payment_term: String::new(),
            default_tax: None,
            discount: None,
        }
    }

    pub fn with_type(mut self, doc_type: DocumentType) -> Self {
        self.doc_type = doc_type;
        self
    }

    pub fn with_header(mut self, header: HeaderFooter) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_footer(mut self, footer: HeaderFooter) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_client_ref(mut self, client_ref: impl Into<String>) -> Self {
        self.client_ref = client_ref.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_company(mut self, company: Contact) -> Self {
        self.company = Some(company);
        self
    }

    pub fn with_customer(mut self, customer: Contact) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn add_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_validity_date(mut self, validity_date: impl Into<String>) -> Self {
        self.validity_date = validity_date.into();
        self
    }

    pub fn with_payment_term(mut self, payment_term: impl Into<String>) -> Self {
        self.payment_term = payment_term.into();
        self
    }

    pub fn with_default_tax(mut self, tax: Tax) -> Self {
        self.default_tax = Some(tax);
        self
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }

    /// The date line for the metas block: the configured date, or today.
    pub(crate) fn date_or_today(&self) -> String {
        if self.date.is_empty() {
            chrono::Local::now().format("%d/%m/%Y").to_string()
        } else {
            self.date.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_parses_wire_names() {
        assert_eq!(
            "INVOICE".parse::<DocumentType>().unwrap(),
            DocumentType::Invoice
        );
        assert_eq!(
            "DELIVERY_NOTE".parse::<DocumentType>().unwrap(),
            DocumentType::DeliveryNote
        );
        assert!(matches!(
            "RECEIPT".parse::<DocumentType>(),
            Err(Error::InvalidDocumentType(value)) if value == "RECEIPT"
        ));
    }

    #[test]
    fn setters_chain_by_value() {
        let doc = Document::new(DocumentType::Quotation, Options::default())
            .with_ref("Q-2026-001")
            .with_version("2")
            .with_validity_date("01/09/2026");
        assert_eq!(doc.reference, "Q-2026-001");
        assert_eq!(doc.version, "2");
        assert_eq!(doc.validity_date, "01/09/2026");
    }

    #[test]
    fn explicit_date_wins_over_today() {
        let doc =
            Document::new(DocumentType::Invoice, Options::default()).with_date("02/03/2021");
        assert_eq!(doc.date_or_today(), "02/03/2021");
    }
}
