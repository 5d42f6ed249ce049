use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Supplier '{0}' not found")]
    SupplierNotFound(Uuid),

    #[error("Partial payment amount ({partial}) cannot exceed total amount ({amount})")]
    PartialPaymentExceedsAmount { partial: Decimal, amount: Decimal },

    #[error("Supplier '{0}' already exists")]
    SupplierAlreadyExists(String),

    #[error("Supplier name must not be empty")]
    EmptySupplierName,

    #[error("Category '{0}' not found. Run 'archive categories' to see available categories.")]
    CategoryNotFound(String),

    #[error("Invoice '{0}' not found")]
    InvoiceNotFound(String),

    #[error("Invalid invoice index '{0}'. Use 'archive list' to see available invoices.")]
    InvalidInvoiceIndex(String),

    #[error("'{0}' is not a PDF (declared type must be application/pdf)")]
    NotPdf(String),

    #[error("Invalid amount '{0}'. Expected a number such as 125.50 or 125,50")]
    InvalidAmountInput(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid payment status '{0}'. Use 'not-paid', 'partially-paid' or 'paid'.")]
    InvalidPaymentStatus(String),

    #[error("Not logged in. Run 'archive login' first.")]
    NotAuthenticated,

    #[error("Session expired. Run 'archive login' again.")]
    SessionExpired,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("Failed to hash password: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Config directory not found at {0}. Run 'archive init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Archive data at {path} is corrupt: {source}")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
