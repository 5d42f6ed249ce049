use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ArchiveError, Result};
use crate::repository::SupplierRepository;

/// How an upload names its supplier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierChoice {
    /// An already registered supplier; existence is checked at creation
    Existing(Uuid),
    /// A supplier name, created if no supplier has it yet
    New(String),
}

/// Resolve a supplier choice to an id, creating the supplier if needed.
///
/// Lookup happens before insert so the first writer of a name wins. If the
/// store rejects the insert because another writer got there first, the name
/// is looked up once more.
pub fn resolve_supplier(suppliers: &dyn SupplierRepository, choice: SupplierChoice) -> Result<Uuid> {
    let name = match choice {
        SupplierChoice::Existing(id) => return Ok(id),
        SupplierChoice::New(name) => name.trim().to_string(),
    };
    if name.is_empty() {
        return Err(ArchiveError::EmptySupplierName);
    }

    if let Some(existing) = suppliers.find_by_name(&name)? {
        return Ok(existing.id);
    }

    match suppliers.create(&name) {
        Ok(created) => {
            info!(id = %created.id, name = %created.name, "created supplier");
            Ok(created.id)
        }
        Err(ArchiveError::SupplierAlreadyExists(conflict)) => {
            warn!(name = %conflict, "supplier created concurrently, retrying lookup");
            suppliers
                .find_by_name(&name)?
                .map(|s| s.id)
                .ok_or(ArchiveError::SupplierAlreadyExists(conflict))
        }
        Err(e) => Err(e),
    }
}
