//! Authentication service.
//!
//! Password accounts (Argon2id hashes) with stateless bearer tokens, see
//! [`TokenService`].

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;

use shipdesk_core::{Email, UserId, UserRole};

use crate::db::{RepositoryError, Store, UserStore};
use crate::models::{FieldErrors, NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration form. Missing fields deserialize as blank and fail
/// validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Authentication service.
///
/// Handles account creation and password login.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create an account with the given role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` listing every bad field.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        registration: Registration,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let mut errors = FieldErrors::new();
        let email = match Email::parse(&registration.email) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", e.to_string());
                None
            }
        };
        if let Err(message) = validate_password(&registration.password) {
            errors.add("password", message);
        }
        let full_name = registration.full_name.trim().to_owned();
        errors.require("full_name", &full_name);

        let Some(email) = email.filter(|_| errors.is_empty()) else {
            return Err(AuthError::Validation(errors));
        };

        let password_hash = hash_password(&registration.password)?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                full_name,
                role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong,
    /// without saying which.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_user_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Load the account behind a verified token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn current_user(&self, id: UserId) -> Result<User, AuthError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn alice() -> Registration {
        Registration {
            email: "A@X.com".to_owned(),
            password: "pw123456".to_owned(),
            full_name: " Alice ".to_owned(),
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("pw123456").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pw123456", &hash).is_ok());
        assert!(matches!(
            verify_password("pw1234567", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn register_normalizes_and_logs_in() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth.register(alice(), UserRole::Shipper).await.unwrap();
        assert_eq!(user.email.as_str(), "a@x.com");
        assert_eq!(user.full_name, "Alice");
        assert_eq!(user.role, UserRole::Shipper);

        let logged_in = auth.login("a@x.com", "pw123456").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(auth.current_user(user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(alice(), UserRole::Shipper).await.unwrap();
        assert!(matches!(
            auth.register(alice(), UserRole::Shipper).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn registration_reports_every_bad_field() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let err = auth
            .register(
                Registration {
                    email: "nope".to_owned(),
                    password: "short".to_owned(),
                    full_name: "  ".to_owned(),
                },
                UserRole::Shipper,
            )
            .await
            .unwrap_err();

        let AuthError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.get("email").is_some());
        assert_eq!(fields.get("password"), Some("must be at least 8 characters"));
        assert_eq!(fields.get("full_name"), Some("is required"));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(alice(), UserRole::Shipper).await.unwrap();

        for (email, password) in [
            ("a@x.com", "wrong-password"),
            ("b@x.com", "pw123456"),
            ("not-an-email", "pw123456"),
        ] {
            assert!(matches!(
                auth.login(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }
}
