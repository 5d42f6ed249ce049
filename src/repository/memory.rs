use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{
    sort_by_name, sort_invoices, CategoryRepository, InvoiceRepository, SupplierRepository,
    UserRepository,
};
use crate::domain::{Category, Invoice, NewInvoice, Supplier, User};
use crate::error::{ArchiveError, Result};

/// In-memory implementation of every repository, for tests and dry runs
#[derive(Default)]
pub struct MemoryStore {
    invoices: RwLock<HashMap<Uuid, Invoice>>,
    suppliers: RwLock<HashMap<Uuid, Supplier>>,
    categories: RwLock<HashMap<Uuid, Category>>,
    users: RwLock<HashMap<Uuid, User>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| ArchiveError::Store(format!("Failed to acquire read lock: {e}")))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| ArchiveError::Store(format!("Failed to acquire write lock: {e}")))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invoices currently stored
    pub fn invoice_count(&self) -> Result<usize> {
        Ok(read(&self.invoices)?.len())
    }
}

impl InvoiceRepository for MemoryStore {
    fn create(&self, invoice: NewInvoice) -> Result<Invoice> {
        let invoice = invoice.into_invoice(Uuid::new_v4(), Utc::now());
        write(&self.invoices)?.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>> {
        Ok(read(&self.invoices)?.get(&id).cloned())
    }

    fn find_all(&self) -> Result<Vec<Invoice>> {
        let mut all: Vec<Invoice> = read(&self.invoices)?.values().cloned().collect();
        sort_invoices(&mut all);
        Ok(all)
    }

    fn update(&self, invoice: Invoice) -> Result<Invoice> {
        let mut invoices = write(&self.invoices)?;
        match invoices.get_mut(&invoice.id) {
            Some(slot) => {
                *slot = invoice.clone();
                Ok(invoice)
            }
            None => Err(ArchiveError::InvoiceNotFound(invoice.id.to_string())),
        }
    }

    fn delete(&self, id: Uuid) -> Result<()> {
        write(&self.invoices)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ArchiveError::InvoiceNotFound(id.to_string()))
    }
}

impl SupplierRepository for MemoryStore {
    fn find_by_id(&self, id: Uuid) -> Result<Option<Supplier>> {
        Ok(read(&self.suppliers)?.get(&id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Supplier>> {
        Ok(read(&self.suppliers)?
            .values()
            .find(|s| s.name == name)
            .cloned())
    }

    fn find_all(&self) -> Result<Vec<Supplier>> {
        let mut all: Vec<Supplier> = read(&self.suppliers)?.values().cloned().collect();
        sort_by_name(&mut all, |s| s.name.as_str());
        Ok(all)
    }

    fn create(&self, name: &str) -> Result<Supplier> {
        let mut suppliers = write(&self.suppliers)?;
        if suppliers.values().any(|s| s.name == name) {
            return Err(ArchiveError::SupplierAlreadyExists(name.to_string()));
        }
        let supplier = Supplier::new(name);
        suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }
}

impl CategoryRepository for MemoryStore {
    fn find_all(&self) -> Result<Vec<Category>> {
        let mut all: Vec<Category> = read(&self.categories)?.values().cloned().collect();
        sort_by_name(&mut all, |c| c.name.as_str());
        Ok(all)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(read(&self.categories)?.get(&id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(read(&self.categories)?
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    fn create(&self, name: &str) -> Result<Category> {
        let mut categories = write(&self.categories)?;
        if categories.values().any(|c| c.name == name) {
            return Err(ArchiveError::Store(format!("Category '{name}' already exists")));
        }
        let category = Category::new(name);
        categories.insert(category.id, category.clone());
        Ok(category)
    }
}

impl UserRepository for MemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == email) {
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
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn new_invoice(day: u32) -> NewInvoice {
        NewInvoice {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            supplier_id: Uuid::new_v4(),
            invoice_number: format!("F-{day}"),
            description: "test".to_string(),
            amount: dec!(10),
            payment_status: PaymentStatus::NotPaid,
            partial_payment_amount: None,
            partial_payment_date: None,
            category_id: None,
            file_path: format!("invoices/{day}.pdf"),
        }
    }

    #[test]
    fn test_find_all_orders_by_date_descending() {
        let store = MemoryStore::new();
        InvoiceRepository::create(&store, new_invoice(3)).unwrap();
        InvoiceRepository::create(&store, new_invoice(20)).unwrap();
        InvoiceRepository::create(&store, new_invoice(11)).unwrap();

        let numbers: Vec<String> = InvoiceRepository::find_all(&store)
            .unwrap()
            .into_iter()
            .map(|i| i.invoice_number)
            .collect();
        assert_eq!(numbers, vec!["F-20", "F-11", "F-3"]);
    }

    #[test]
    fn test_delete_missing_invoice_is_not_found() {
        let store = MemoryStore::new();
        let err = InvoiceRepository::delete(&store, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ArchiveError::InvoiceNotFound(_)));
    }

    #[test]
    fn test_supplier_names_are_unique() {
        let store = MemoryStore::new();
        SupplierRepository::create(&store, "DOM'ELEC").unwrap();
        let err = SupplierRepository::create(&store, "DOM'ELEC").unwrap_err();
        assert!(matches!(err, ArchiveError::SupplierAlreadyExists(name) if name == "DOM'ELEC"));
    }

    #[test]
    fn test_categories_sorted_by_name() {
        let store = MemoryStore::new();
        for name in ["Réparation", "Assurance", "Charges"] {
            CategoryRepository::create(&store, name).unwrap();
        }
        let names: Vec<String> = CategoryRepository::find_all(&store)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Assurance", "Charges", "Réparation"]);
    }

    #[test]
    fn test_poisoned_lock_is_an_error_not_empty() {
        let store = MemoryStore::new();
        InvoiceRepository::create(&store, new_invoice(1)).unwrap();
        assert_eq!(store.invoice_count().unwrap(), 1);

        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = store.invoices.write().unwrap();
                panic!("writer died holding the lock");
            });
            assert!(handle.join().is_err());
        });

        assert!(matches!(store.invoice_count(), Err(ArchiveError::Store(_))));
        assert!(matches!(
            InvoiceRepository::find_all(&store),
            Err(ArchiveError::Store(_))
        ));
    }
}
