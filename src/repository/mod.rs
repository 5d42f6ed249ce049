//! Persistence contracts and the two stores that implement them.
//!
//! The core only ever talks to these traits. `MemoryStore` backs the unit
//! tests; `TomlStore` is the single-file store used by the CLI.

mod memory;
mod toml_store;

pub use memory::MemoryStore;
pub use toml_store::{ArchiveData, TomlStore};

use uuid::Uuid;

use crate::domain::{Category, Invoice, NewInvoice, Supplier, User};
use crate::error::Result;

pub trait InvoiceRepository: Send + Sync {
    /// Persist a new invoice, assigning its id and timestamps
    fn create(&self, invoice: NewInvoice) -> Result<Invoice>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>>;

    /// All invoices, newest invoice date first
    fn find_all(&self) -> Result<Vec<Invoice>>;

    /// Replace a stored invoice. Fails with `InvoiceNotFound` if it is gone.
    fn update(&self, invoice: Invoice) -> Result<Invoice>;

    fn delete(&self, id: Uuid) -> Result<()>;
}

pub trait SupplierRepository: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Supplier>>;

    fn find_by_name(&self, name: &str) -> Result<Option<Supplier>>;

    /// All suppliers ordered by name
    fn find_all(&self) -> Result<Vec<Supplier>>;

    /// Insert a supplier. Names are unique: a duplicate yields `SupplierAlreadyExists`.
    fn create(&self, name: &str) -> Result<Supplier>;
}

pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by name
    fn find_all(&self) -> Result<Vec<Category>>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>>;

    fn find_by_name(&self, name: &str) -> Result<Option<Category>>;

    fn create(&self, name: &str) -> Result<Category>;
}

pub trait UserRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Insert a user. Emails are unique: a duplicate yields `UserAlreadyExists`.
    fn create(&self, email: &str, password_hash: &str) -> Result<User>;
}

pub(crate) fn sort_invoices(invoices: &mut [Invoice]) {
    invoices.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

pub(crate) fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| name(a).cmp(name(b)));
}
