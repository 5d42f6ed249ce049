pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod invoice;
pub mod repository;
pub mod storage;

pub use config::{Config, DEFAULT_CATEGORIES};
pub use domain::{Category, Invoice, NewInvoice, PaymentStatus, PaymentUpdate, Supplier, User};
pub use error::{ArchiveError, Result};
pub use invoice::{
    derive_payment_reference, generate_filename, Archive, CreateInvoice, InvoiceView,
    SupplierChoice, Upload,
};
pub use repository::{
    CategoryRepository, InvoiceRepository, MemoryStore, SupplierRepository, TomlStore,
    UserRepository,
};
pub use storage::{FileStore, FsFileStore};
