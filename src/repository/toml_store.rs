use chrono::Utc;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use super::{
    sort_by_name, sort_invoices, CategoryRepository, InvoiceRepository, SupplierRepository,
    UserRepository,
};
use crate::domain::{Category, Invoice, NewInvoice, Supplier, User};
use crate::error::{ArchiveError, Result};

/// Everything the archive persists, serialized as one TOML document
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ArchiveData {
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
}

/// File-backed store. Every call reads the document, and mutations write it back.
///
/// Calls hold an exclusive OS lock on `<file>.lock` for the whole
/// load/mutate/save cycle, so separate processes (and separate handles in one
/// process) never interleave. The document is replaced by renaming a fully
/// written temporary file over it.
pub struct TomlStore {
    path: PathBuf,
}

impl TomlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document (empty if the file does not exist yet)
    pub fn load(&self) -> Result<ArchiveData> {
        let _lock = self.lock()?;
        self.load_unlocked()
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "archive.toml".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Released when the returned handle is dropped
    fn lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn load_unlocked(&self) -> Result<ArchiveData> {
        if !self.path.exists() {
            return Ok(ArchiveData::default());
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| ArchiveError::StoreParse {
            path: self.path.clone(),
            source: e,
        })
    }

    fn save_unlocked(&self, data: &ArchiveData) -> Result<()> {
        let content =
            toml::to_string_pretty(data).map_err(|e| ArchiveError::Store(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&ArchiveData) -> T) -> Result<T> {
        let _lock = self.lock()?;
        let data = self.load_unlocked()?;
        Ok(f(&data))
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut ArchiveData) -> Result<T>) -> Result<T> {
        let _lock = self.lock()?;
        let mut data = self.load_unlocked()?;
        let out = f(&mut data)?;
        self.save_unlocked(&data)?;
        Ok(out)
    }
}

impl InvoiceRepository for TomlStore {
    fn create(&self, invoice: NewInvoice) -> Result<Invoice> {
        self.mutate(|data| {
            let invoice = invoice.into_invoice(Uuid::new_v4(), Utc::now());
            data.invoices.push(invoice.clone());
            Ok(invoice)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>> {
        self.read(|data| data.invoices.iter().find(|i| i.id == id).cloned())
    }

    fn find_all(&self) -> Result<Vec<Invoice>> {
        let mut all = self.read(|data| data.invoices.clone())?;
        sort_invoices(&mut all);
        Ok(all)
    }

    fn update(&self, invoice: Invoice) -> Result<Invoice> {
        self.mutate(|data| {
            let slot = data
                .invoices
                .iter_mut()
                .find(|i| i.id == invoice.id)
                .ok_or_else(|| ArchiveError::InvoiceNotFound(invoice.id.to_string()))?;
            *slot = invoice.clone();
            Ok(invoice)
        })
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        self.mutate(|data| {
            let idx = data
                .invoices
                .iter()
                .position(|i| i.id == id)
                .ok_or_else(|| ArchiveError::InvoiceNotFound(id.to_string()))?;
            data.invoices.remove(idx);
            Ok(())
        })
    }
}

impl SupplierRepository for TomlStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Supplier>> {
        self.read(|data| data.suppliers.iter().find(|s| s.id == id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Supplier>> {
        self.read(|data| data.suppliers.iter().find(|s| s.name == name).cloned())
    }

    fn find_all(&self) -> Result<Vec<Supplier>> {
        let mut all = self.read(|data| data.suppliers.clone())?;
        sort_by_name(&mut all, |s| s.name.as_str());
        Ok(all)
    }

    fn create(&self, name: &str) -> Result<Supplier> {
        self.mutate(|data| {
            if data.suppliers.iter().any(|s| s.name == name) {
                return Err(ArchiveError::SupplierAlreadyExists(name.to_string()));
            }
            let supplier = Supplier::new(name);
            data.suppliers.push(supplier.clone());
            Ok(supplier)
        })
    }
}

impl CategoryRepository for TomlStore {
    fn find_all(&self) -> Result<Vec<Category>> {
        let mut all = self.read(|data| data.categories.clone())?;
        sort_by_name(&mut all, |c| c.name.as_str());
        Ok(all)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        self.read(|data| data.categories.iter().find(|c| c.id == id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.read(|data| data.categories.iter().find(|c| c.name == name).cloned())
    }

    fn create(&self, name: &str) -> Result<Category> {
        self.mutate(|data| {
            if data.categories.iter().any(|c| c.name == name) {
                return Err(ArchiveError::Store(format!("Category '{name}' already exists")));
            }
            let category = Category::new(name);
            data.categories.push(category.clone());
            Ok(category)
        })
    }
}

impl UserRepository for TomlStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.read(|data| data.users.iter().find(|u| u.email == email).cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.read(|data| data.users.iter().find(|u| u.id == id).cloned())
    }

    fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        self.mutate(|data| {
            if data.users.iter().any(|u| u.email == email) {
                return Err(ArchiveError::UserAlreadyExists(email.to_string()));
            }
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                created_at: now,
                updated_at: now,
            };
            data.users.push(user.clone());
            Ok(user)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = TomlStore::new(dir.path().join("archive.toml"));
        let data = store.load().unwrap();
        assert!(data.invoices.is_empty());
        assert!(data.suppliers.is_empty());
    }

    #[test]
    fn test_invoice_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive.toml");

        let store = TomlStore::new(&path);
        let supplier = SupplierRepository::create(&store, "Plomberie Martin").unwrap();
        let created = InvoiceRepository::create(
            &store,
            NewInvoice {
                date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
                supplier_id: supplier.id,
                invoice_number: "2025-001".to_string(),
                description: "réparation fuite".to_string(),
                amount: dec!(125.50),
                payment_status: PaymentStatus::PartiallyPaid,
                partial_payment_amount: Some(dec!(50)),
                partial_payment_date: NaiveDate::from_ymd_opt(2025, 2, 1),
                category_id: None,
                file_path: "invoices/1-fuite.pdf".to_string(),
            },
        )
        .unwrap();

        let reopened = TomlStore::new(&path);
        let found = InvoiceRepository::find_by_id(&reopened, created.id)
            .unwrap()
            .unwrap();
        assert_eq!(found.amount, dec!(125.50));
        assert_eq!(found.partial_payment_amount, Some(dec!(50)));
        assert_eq!(found.payment_status, PaymentStatus::PartiallyPaid);
        assert_eq!(found.supplier_id, supplier.id);
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let dir = TempDir::new().unwrap();
        let store = TomlStore::new(dir.path().join("archive.toml"));
        UserRepository::create(&store, "a@example.com", "hash").unwrap();
        let err = UserRepository::create(&store, "a@example.com", "hash").unwrap_err();
        assert!(matches!(err, ArchiveError::UserAlreadyExists(_)));
    }

    #[test]
    fn test_corrupt_document_is_a_store_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive.toml");
        fs::write(&path, "[[invoices]\nid = ").unwrap();

        let store = TomlStore::new(&path);
        let err = store.load().unwrap_err();
        assert!(matches!(err, ArchiveError::StoreParse { .. }));
        assert!(err.to_string().contains("is corrupt"));
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let store = TomlStore::new(dir.path().join("archive.toml"));
        CategoryRepository::create(&store, "Assurance").unwrap();
        CategoryRepository::create(&store, "Charges").unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["archive.toml", "archive.toml.lock"]);
    }

    #[test]
    fn test_concurrent_handles_lose_no_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive.toml");

        std::thread::scope(|s| {
            for worker in 0..4 {
                let path = path.clone();
                s.spawn(move || {
                    // One handle per thread, like separate CLI processes
                    let store = TomlStore::new(path);
                    for n in 0..25 {
                        SupplierRepository::create(&store, &format!("Supplier {worker}-{n}"))
                            .unwrap();
                    }
                });
            }
        });

        let store = TomlStore::new(&path);
        assert_eq!(SupplierRepository::find_all(&store).unwrap().len(), 100);
    }

    #[test]
    fn test_duplicate_supplier_across_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive.toml");
        let first = TomlStore::new(&path);
        let second = TomlStore::new(&path);

        SupplierRepository::create(&first, "DOM'ELEC").unwrap();
        let err = SupplierRepository::create(&second, "DOM'ELEC").unwrap_err();
        assert!(matches!(err, ArchiveError::SupplierAlreadyExists(_)));
    }
}
