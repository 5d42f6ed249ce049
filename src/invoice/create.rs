use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{Invoice, NewInvoice, PaymentStatus};
use crate::error::{ArchiveError, Result};
use crate::repository::{InvoiceRepository, SupplierRepository};

/// Reject a partial payment larger than the invoice total.
///
/// Only checked for `PartiallyPaid`; any other status ignores the partial amount.
pub fn check_partial_payment(
    status: PaymentStatus,
    partial: Option<Decimal>,
    amount: Decimal,
) -> Result<()> {
    if status != PaymentStatus::PartiallyPaid {
        return Ok(());
    }
    match partial {
        Some(partial) if partial > amount => {
            Err(ArchiveError::PartialPaymentExceedsAmount { partial, amount })
        }
        _ => Ok(()),
    }
}

/// Validates a new invoice against the business rules, then persists it.
///
/// Rules are checked in order and the first violation wins:
/// 1. the amount is strictly positive
/// 2. the supplier exists
/// 3. a partial payment does not exceed the amount
pub struct CreateInvoice {
    invoices: Arc<dyn InvoiceRepository>,
    suppliers: Arc<dyn SupplierRepository>,
}

impl CreateInvoice {
    pub fn new(invoices: Arc<dyn InvoiceRepository>, suppliers: Arc<dyn SupplierRepository>) -> Self {
        Self {
            invoices,
            suppliers,
        }
    }

    pub fn execute(&self, candidate: NewInvoice) -> Result<Invoice> {
        if candidate.amount <= Decimal::ZERO {
            return Err(ArchiveError::InvalidAmount);
        }

        debug!(supplier_id = %candidate.supplier_id, "looking up supplier");
        if self.suppliers.find_by_id(candidate.supplier_id)?.is_none() {
            return Err(ArchiveError::SupplierNotFound(candidate.supplier_id));
        }

        check_partial_payment(
            candidate.payment_status,
            candidate.partial_payment_amount,
            candidate.amount,
        )?;

        let invoice = self.invoices.create(candidate)?;
        info!(id = %invoice.id, number = %invoice.invoice_number, "created invoice");
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn candidate(supplier_id: Uuid, amount: Decimal) -> NewInvoice {
        NewInvoice {
            date: NaiveDate::from_ymd_opt(2025, 9, 29).unwrap(),
            supplier_id,
            invoice_number: "INV-001".to_string(),
            description: "Test invoice".to_string(),
            amount,
            payment_status: PaymentStatus::NotPaid,
            partial_payment_amount: None,
            partial_payment_date: None,
            category_id: None,
            file_path: "invoices/test.pdf".to_string(),
        }
    }

    fn setup() -> (Arc<MemoryStore>, CreateInvoice, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let supplier = SupplierRepository::create(store.as_ref(), "Test Supplier").unwrap();
        let use_case = CreateInvoice::new(store.clone(), store.clone());
        (store, use_case, supplier.id)
    }

    #[test]
    fn test_creates_valid_invoice() {
        let (store, use_case, supplier_id) = setup();
        let input = candidate(supplier_id, dec!(100));

        let invoice = use_case.execute(input.clone()).unwrap();

        assert_eq!(invoice.supplier_id, supplier_id);
        assert_eq!(invoice.amount, dec!(100));
        assert_eq!(invoice.file_path, input.file_path);
        assert_eq!(invoice.created_at, invoice.updated_at);
        assert_eq!(store.invoice_count().unwrap(), 1);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let (store, use_case, supplier_id) = setup();
        let err = use_case
            .execute(candidate(supplier_id, dec!(-50)))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidAmount));
        assert_eq!(store.invoice_count().unwrap(), 0);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let (_, use_case, supplier_id) = setup();
        let err = use_case.execute(candidate(supplier_id, dec!(0))).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidAmount));
    }

    #[test]
    fn test_amount_checked_before_supplier() {
        let (_, use_case, _) = setup();
        let err = use_case
            .execute(candidate(Uuid::new_v4(), dec!(-1)))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidAmount));
    }

    #[test]
    fn test_unknown_supplier_rejected_before_persisting() {
        let (store, use_case, _) = setup();
        let missing = Uuid::new_v4();
        let err = use_case.execute(candidate(missing, dec!(100))).unwrap_err();
        assert!(matches!(err, ArchiveError::SupplierNotFound(id) if id == missing));
        assert_eq!(store.invoice_count().unwrap(), 0);
    }

    #[test]
    fn test_supplier_checked_before_partial_payment() {
        let (_, use_case, _) = setup();
        let mut input = candidate(Uuid::new_v4(), dec!(100));
        input.payment_status = PaymentStatus::PartiallyPaid;
        input.partial_payment_amount = Some(dec!(150));
        let err = use_case.execute(input).unwrap_err();
        assert!(matches!(err, ArchiveError::SupplierNotFound(_)));
    }

    #[test]
    fn test_partial_payment_exceeding_amount_rejected() {
        let (store, use_case, supplier_id) = setup();
        let mut input = candidate(supplier_id, dec!(100));
        input.payment_status = PaymentStatus::PartiallyPaid;
        input.partial_payment_amount = Some(dec!(150));

        let err = use_case.execute(input).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::PartialPaymentExceedsAmount { partial, amount }
                if partial == dec!(150) && amount == dec!(100)
        ));
        assert_eq!(store.invoice_count().unwrap(), 0);
    }

    #[test]
    fn test_partial_payment_equal_to_amount_accepted() {
        let (_, use_case, supplier_id) = setup();
        let mut input = candidate(supplier_id, dec!(100));
        input.payment_status = PaymentStatus::PartiallyPaid;
        input.partial_payment_amount = Some(dec!(100));
        assert!(use_case.execute(input).is_ok());
    }

    #[test]
    fn test_partial_payment_without_amount_accepted() {
        let (_, use_case, supplier_id) = setup();
        let mut input = candidate(supplier_id, dec!(100));
        input.payment_status = PaymentStatus::PartiallyPaid;
        assert!(use_case.execute(input).is_ok());
    }

    #[test]
    fn test_partial_amount_ignored_for_other_statuses() {
        let (_, use_case, supplier_id) = setup();
        for status in [PaymentStatus::NotPaid, PaymentStatus::Paid] {
            let mut input = candidate(supplier_id, dec!(100));
            input.payment_status = status;
            input.partial_payment_amount = Some(dec!(500));
            assert!(use_case.execute(input).is_ok(), "status {status:?}");
        }
    }
}
