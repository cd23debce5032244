//! Generate invoices, quotations and delivery notes as paginated PDF
//! documents.
//!
//! A [`Document`] is assembled with value-builder setters, validated, then
//! laid out onto a command-recording [`Canvas`]: title and metas, company
//! and customer blocks, the items table (with page breaks and a re-drawn
//! column band), notes, the totals block, and the payment term. Monetary
//! amounts are exact decimals throughout; per-line and document-level taxes
//! and discounts compose as either percentages or fixed amounts, and a
//! document-level discount is redistributed into percent-based item taxes
//! exactly once.
//!
//! ```no_run
//! use facture::{Address, Contact, Document, DocumentType, Item, Options, Tax};
//!
//! let doc = Document::new(DocumentType::Invoice, Options::default())
//!     .with_ref("F-2026-001")
//!     .with_company(Contact::new("ACME").with_address(Address::new("1 Main St")))
//!     .with_customer(Contact::new("Customer Co"))
//!     .add_item(Item::new("Consulting", "100", "2").with_tax(Tax::percent("20")));
//! let rendered = doc.build()?;
//! rendered.write_to_file("invoice.pdf")?;
//! # Ok::<(), facture::Error>(())
//! ```

mod canvas;
mod contact;
mod document;
mod error;
mod font;
mod header_footer;
mod html;
mod item;
mod layout;
mod money;
mod options;
mod pdf;
mod rate;
mod totals;
mod types;
mod validate;

pub use canvas::{Align, Canvas, Command, Page, PageCallback, PageSet, PAGE_COUNT_ALIAS};
pub use contact::{Address, Contact};
pub use document::{Document, DocumentType};
pub use error::Error;
pub use font::{default_encoder, TextEncoder};
pub use header_footer::HeaderFooter;
pub use item::Item;
pub use options::Options;
pub use pdf::Rendered;
pub use rate::{Discount, Rate, RatePolicy, Tax};
pub use totals::Totals;
pub use types::{Color, Mm, Size};
