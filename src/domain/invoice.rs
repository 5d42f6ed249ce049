use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ArchiveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    NotPaid,
    PartiallyPaid,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::NotPaid => write!(f, "NOT PAID"),
            PaymentStatus::PartiallyPaid => write!(f, "PARTIAL"),
            PaymentStatus::Paid => write!(f, "PAID"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "not-paid" | "unpaid" => Ok(PaymentStatus::NotPaid),
            "partially-paid" | "partial" => Ok(PaymentStatus::PartiallyPaid),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(ArchiveError::InvalidPaymentStatus(s.to_string())),
        }
    }
}

/// An archived supplier invoice
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Invoice {
    pub id: Uuid,
    pub date: NaiveDate,
    pub supplier_id: Uuid,
    pub invoice_number: String,
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub partial_payment_amount: Option<Decimal>,
    #[serde(default)]
    pub partial_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    /// Location returned by the file store at upload time
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Invoice fields supplied by the caller; identity and timestamps come from the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub date: NaiveDate,
    pub supplier_id: Uuid,
    pub invoice_number: String,
    pub description: String,
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub partial_payment_amount: Option<Decimal>,
    pub partial_payment_date: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub file_path: String,
}

impl NewInvoice {
    pub fn into_invoice(self, id: Uuid, now: DateTime<Utc>) -> Invoice {
        Invoice {
            id,
            date: self.date,
            supplier_id: self.supplier_id,
            invoice_number: self.invoice_number,
            description: self.description,
            amount: self.amount,
            payment_status: self.payment_status,
            partial_payment_amount: self.partial_payment_amount,
            partial_payment_date: self.partial_payment_date,
            category_id: self.category_id,
            file_path: self.file_path,
            created_at: now,
            updated_at: now,
        }
    }
}

/// New payment state for an existing invoice
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub partial_payment_amount: Option<Decimal>,
    pub partial_payment_date: Option<NaiveDate>,
}

impl Invoice {
    /// Apply a payment update. Partial fields only survive on a partially paid invoice.
    pub fn apply_payment(&mut self, update: PaymentUpdate, now: DateTime<Utc>) {
        self.payment_status = update.status;
        if update.status == PaymentStatus::PartiallyPaid {
            self.partial_payment_amount = update.partial_payment_amount;
            self.partial_payment_date = update.partial_payment_date;
        } else {
            self.partial_payment_amount = None;
            self.partial_payment_date = None;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Invoice {
        NewInvoice {
            date: NaiveDate::from_ymd_opt(2025, 9, 29).unwrap(),
            supplier_id: Uuid::new_v4(),
            invoice_number: "F.202509145".to_string(),
            description: "interphone".to_string(),
            amount: dec!(90),
            payment_status: PaymentStatus::PartiallyPaid,
            partial_payment_amount: Some(dec!(40)),
            partial_payment_date: NaiveDate::from_ymd_opt(2025, 10, 1),
            category_id: None,
            file_path: "invoices/1-a.pdf".to_string(),
        }
        .into_invoice(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_payment_status_from_str() {
        assert_eq!(
            "PARTIALLY_PAID".parse::<PaymentStatus>().unwrap(),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!("not-paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::NotPaid);
        assert_eq!("Paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_apply_payment_clears_partial_fields_when_paid() {
        let mut invoice = sample();
        invoice.apply_payment(
            PaymentUpdate {
                status: PaymentStatus::Paid,
                partial_payment_amount: Some(dec!(10)),
                partial_payment_date: None,
            },
            Utc::now(),
        );
        assert_eq!(invoice.payment_status, PaymentStatus::Paid);
        assert_eq!(invoice.partial_payment_amount, None);
        assert_eq!(invoice.partial_payment_date, None);
    }

    #[test]
    fn test_payment_status_serializes_screaming_case() {
        let json = serde_json::to_string(&PaymentStatus::PartiallyPaid).unwrap();
        assert_eq!(json, "\"PARTIALLY_PAID\"");
    }
}
