//! Credential checks and the login session gate.

mod session;

pub use session::{Session, Sessions};

use tracing::info;

use crate::domain::User;
use crate::error::{ArchiveError, Result};
use crate::repository::UserRepository;

/// Create a login account with a bcrypt-hashed password
pub fn register(users: &dyn UserRepository, email: &str, password: &str, cost: u32) -> Result<User> {
    let email = email.trim();
    if users.find_by_email(email)?.is_some() {
        return Err(ArchiveError::UserAlreadyExists(email.to_string()));
    }
    let hash = bcrypt::hash(password, cost)?;
    let user = users.create(email, &hash)?;
    info!(id = %user.id, email = %user.email, "registered user");
    Ok(user)
}

/// Check an email/password pair. Unknown emails and wrong passwords look the same.
pub fn authenticate(users: &dyn UserRepository, email: &str, password: &str) -> Result<User> {
    let user = users
        .find_by_email(email.trim())?
        .ok_or(ArchiveError::InvalidCredentials)?;
    if bcrypt::verify(password, &user.password_hash)? {
        Ok(user)
    } else {
        Err(ArchiveError::InvalidCredentials)
    }
}
