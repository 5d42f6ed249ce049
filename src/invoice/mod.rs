mod archive;
mod create;
mod filename;
mod supplier;

pub use archive::{Archive, InvoiceView, Upload, PDF_CONTENT_TYPE};
pub use create::{check_partial_payment, CreateInvoice};
pub use filename::{derive_payment_reference, generate_filename};
pub use supplier::{resolve_supplier, SupplierChoice};
