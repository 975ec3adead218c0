//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shipdesk_core::{Email, UserId, UserRole};

/// A Shipdesk account.
///
/// The password hash lives only in storage and is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub full_name: String,
    pub role: UserRole,
    /// Argon2 PHC string.
    pub password_hash: String,
}
