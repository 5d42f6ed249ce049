//! Canonical filename and bank-transfer reference.
//!
//! The canonical name is `YYMMDD.supplier.number_description.<int>E<cents>`,
//! e.g. `250929.DOM'ELEC.F.202509145_interphone.90E00`. Nothing is escaped:
//! callers that need a filesystem-safe name sanitize it themselves.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::money::cents_parts;

/// Build the canonical filename for an invoice
pub fn generate_filename(
    date: NaiveDate,
    supplier_name: &str,
    invoice_number: &str,
    description: &str,
    amount: Decimal,
) -> String {
    let (whole, cents) = cents_parts(amount);
    format!(
        "{}.{}.{}_{}.{}E{}",
        date.format("%y%m%d"),
        supplier_name,
        invoice_number,
        description,
        whole,
        cents
    )
}

/// Turn a canonical filename into a transfer memo: drop the amount suffix,
/// then every `.` and `_` becomes a space
pub fn derive_payment_reference(filename: &str) -> String {
    let without_amount = match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => &filename[..idx],
        _ => filename,
    };
    without_amount.replace(['.', '_'], " ")
}
