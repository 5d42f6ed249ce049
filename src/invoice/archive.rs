use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::create::{check_partial_payment, CreateInvoice};
use super::filename::{derive_payment_reference, generate_filename};
use super::supplier::{resolve_supplier, SupplierChoice};
use crate::domain::{Category, Invoice, NewInvoice, PaymentStatus, PaymentUpdate, Supplier};
use crate::error::{ArchiveError, Result};
use crate::repository::{CategoryRepository, InvoiceRepository, SupplierRepository};
use crate::storage::FileStore;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// MIME types compare case-insensitively and may carry `; param=value` suffixes
fn is_pdf(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
}

/// An uploaded PDF plus the metadata to file it under
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub original_name: String,
    /// Declared MIME type; the content itself is never inspected
    pub content_type: String,
    pub date: NaiveDate,
    pub supplier: SupplierChoice,
    pub invoice_number: String,
    pub description: String,
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub partial_payment_amount: Option<Decimal>,
    pub partial_payment_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
}

/// An invoice joined with the names of its supplier and category
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub supplier_name: String,
    pub category_name: Option<String>,
}

impl InvoiceView {
    pub fn filename(&self) -> String {
        generate_filename(
            self.invoice.date,
            &self.supplier_name,
            &self.invoice.invoice_number,
            &self.invoice.description,
            self.invoice.amount,
        )
    }

    pub fn payment_reference(&self) -> String {
        derive_payment_reference(&self.filename())
    }
}

/// The invoice archive: upload, browse, re-file and delete invoices
pub struct Archive {
    invoices: Arc<dyn InvoiceRepository>,
    suppliers: Arc<dyn SupplierRepository>,
    categories: Arc<dyn CategoryRepository>,
    files: Arc<dyn FileStore>,
}

impl Archive {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        suppliers: Arc<dyn SupplierRepository>,
        categories: Arc<dyn CategoryRepository>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            invoices,
            suppliers,
            categories,
            files,
        }
    }

    /// Build an archive whose repositories all live in one store
    pub fn with_store<S>(store: Arc<S>, files: Arc<dyn FileStore>) -> Self
    where
        S: InvoiceRepository + SupplierRepository + CategoryRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store, files)
    }

    /// Store the file, resolve the supplier, then validate and persist the invoice.
    ///
    /// If anything after the file write fails, the stored file is removed again.
    pub fn upload(&self, upload: Upload) -> Result<Invoice> {
        if !is_pdf(&upload.content_type) {
            return Err(ArchiveError::NotPdf(upload.original_name));
        }

        let file_path = self.files.save(&upload.bytes, &upload.original_name)?;

        let created = resolve_supplier(self.suppliers.as_ref(), upload.supplier).and_then(
            |supplier_id| {
                CreateInvoice::new(self.invoices.clone(), self.suppliers.clone()).execute(
                    NewInvoice {
                        date: upload.date,
                        supplier_id,
                        invoice_number: upload.invoice_number,
                        description: upload.description,
                        amount: upload.amount,
                        payment_status: upload.payment_status,
                        partial_payment_amount: upload.partial_payment_amount,
                        partial_payment_date: upload.partial_payment_date,
                        category_id: upload.category_id,
                        file_path: file_path.clone(),
                    },
                )
            },
        );

        if created.is_err() {
            debug!(%file_path, "upload rejected, removing stored file");
            self.files.remove(&file_path);
        }
        created
    }

    /// All invoices, newest first
    pub fn list(&self) -> Result<Vec<InvoiceView>> {
        let suppliers = self.suppliers.find_all()?;
        let categories = self.categories.find_all()?;
        Ok(self
            .invoices
            .find_all()?
            .into_iter()
            .map(|invoice| join(invoice, &suppliers, &categories))
            .collect::<Result<Vec<_>>>()?)
    }

    pub fn find(&self, id: Uuid) -> Result<InvoiceView> {
        let invoice = self.get(id)?;
        let supplier_name = self
            .suppliers
            .find_by_id(invoice.supplier_id)?
            .map(|s| s.name)
            .ok_or(ArchiveError::SupplierNotFound(invoice.supplier_id))?;
        let category_name = match invoice.category_id {
            Some(category_id) => Some(
                self.categories
                    .find_by_id(category_id)?
                    .map(|c| c.name)
                    .ok_or_else(|| ArchiveError::CategoryNotFound(category_id.to_string()))?,
            ),
            None => None,
        };
        Ok(InvoiceView {
            invoice,
            supplier_name,
            category_name,
        })
    }

    /// Canonical filename of a stored invoice
    pub fn filename(&self, id: Uuid) -> Result<String> {
        Ok(self.find(id)?.filename())
    }

    /// Bank-transfer reference of a stored invoice
    pub fn payment_reference(&self, id: Uuid) -> Result<String> {
        Ok(self.find(id)?.payment_reference())
    }

    /// Change the payment state of an invoice, re-checking the partial payment rule
    pub fn update_payment(&self, id: Uuid, update: PaymentUpdate) -> Result<Invoice> {
        let mut invoice = self.get(id)?;
        check_partial_payment(update.status, update.partial_payment_amount, invoice.amount)?;
        invoice.apply_payment(update, Utc::now());
        let updated = self.invoices.update(invoice)?;
        info!(id = %updated.id, status = %updated.payment_status, "updated payment status");
        Ok(updated)
    }

    /// Delete an invoice and, best effort, its stored file
    pub fn delete(&self, id: Uuid) -> Result<Invoice> {
        let invoice = self.get(id)?;
        if !invoice.file_path.is_empty() {
            self.files.remove(&invoice.file_path);
        }
        self.invoices.delete(id)?;
        info!(id = %invoice.id, number = %invoice.invoice_number, "deleted invoice");
        Ok(invoice)
    }

    pub fn suppliers(&self) -> Result<Vec<Supplier>> {
        self.suppliers.find_all()
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        self.categories.find_all()
    }

    /// Find a category by id or by exact name
    pub fn resolve_category(&self, reference: &str) -> Result<Uuid> {
        let found = match Uuid::parse_str(reference) {
            Ok(id) => self.categories.find_by_id(id)?,
            Err(_) => self.categories.find_by_name(reference)?,
        };
        found
            .map(|c| c.id)
            .ok_or_else(|| ArchiveError::CategoryNotFound(reference.to_string()))
    }

    fn get(&self, id: Uuid) -> Result<Invoice> {
        self.invoices
            .find_by_id(id)?
            .ok_or_else(|| ArchiveError::InvoiceNotFound(id.to_string()))
    }
}

/// Attach supplier and category names. A dangling reference is an error, never a blank name.
fn join(invoice: Invoice, suppliers: &[Supplier], categories: &[Category]) -> Result<InvoiceView> {
    let supplier_name = suppliers
        .iter()
        .find(|s| s.id == invoice.supplier_id)
        .map(|s| s.name.clone())
        .ok_or(ArchiveError::SupplierNotFound(invoice.supplier_id))?;
    let category_name = match invoice.category_id {
        Some(id) => Some(
            categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.name.clone())
                .ok_or_else(|| ArchiveError::CategoryNotFound(id.to_string()))?,
        ),
        None => None,
    };
    Ok(InvoiceView {
        invoice,
        supplier_name,
        category_name,
    })
}
