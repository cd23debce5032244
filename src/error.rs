use thiserror::Error;

/// Every failure a document build can surface. A build either completes or
/// returns one of these; no partial output is ever produced.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or a bounded field is out of range.
    /// Raised before any layout work begins.
    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// A decimal-bearing field does not parse. Never coerced to zero.
    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber { field: String, value: String },

    /// A tax or discount spec has neither a percent nor an amount while the
    /// document uses [`crate::RatePolicy::Strict`].
    #[error("tax or discount spec has neither percent nor amount")]
    InvalidTaxOrDiscount,

    /// An amount-mode document discount leaves a zero discounted subtotal,
    /// making the equivalent-percent redistribution undefined.
    #[error("document discount leaves a zero subtotal; equivalent percent is undefined")]
    DivisionByZero,

    /// A document-type string does not name a known type.
    #[error("invalid document type: {0:?}")]
    InvalidDocumentType(String),

    /// A drawing-level failure, e.g. an undecodable logo image.
    #[error("canvas error: {0}")]
    Canvas(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
