//! Unified error types for the inventory crate.
//!
//! Every fallible operation returns [`Result`]. User-facing failures (insufficient stock,
//! missing fields, duplicate identifiers) are distinct variants so callers can render them
//! without string matching; storage and I/O failures are wrapped via `#[from]`.

use thiserror::Error;

/// All errors produced by the inventory crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A required input was empty
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// A quantity was zero, negative, or otherwise not acceptable for the operation
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// A date string could not be parsed
    #[error("Invalid date: {value}")]
    InvalidDate {
        /// The rejected input
        value: String,
    },

    /// A product with this SKU already exists
    #[error("Duplicate product SKU: {sku}")]
    DuplicateProduct {
        /// The conflicting SKU
        sku: String,
    },

    /// A partner, warehouse, location or return with this code already exists
    #[error("Duplicate {entity} identifier: {code}")]
    DuplicateId {
        /// Kind of record (e.g. `"warehouse"`)
        entity: &'static str,
        /// The conflicting code
        code: String,
    },

    /// No product with this SKU exists
    #[error("Product not found: {sku}")]
    ProductNotFound {
        /// The SKU that was looked up
        sku: String,
    },

    /// No stock lot matches the requested SKU/lot (and location, if given)
    #[error("Stock lot not found: {sku} / {lot_id}")]
    LotNotFound {
        /// SKU of the requested lot
        sku: String,
        /// Lot identifier that was looked up
        lot_id: String,
    },

    /// No warehouse with this code exists
    #[error("Warehouse not found: {code}")]
    WarehouseNotFound {
        /// The warehouse code that was looked up
        code: String,
    },

    /// The lot holds less than the requested quantity
    #[error("Insufficient stock for {sku} / {lot_id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// SKU of the lot
        sku: String,
        /// Lot identifier
        lot_id: String,
        /// Quantity currently in the lot
        available: i64,
        /// Quantity the caller asked to ship
        requested: i64,
    },

    /// No return order with this code exists
    #[error("Return not found: {code}")]
    ReturnNotFound {
        /// The return code that was looked up
        code: String,
    },

    /// The return was already restocked or disposed
    #[error("Return {code} is already {status}")]
    ReturnAlreadyResolved {
        /// The return code
        code: String,
        /// Its current status
        status: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Legacy snapshot JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration TOML could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
