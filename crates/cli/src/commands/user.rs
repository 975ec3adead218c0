//! Account management commands.
//!
//! Carrier and admin accounts cannot be self-registered; operators create
//! them here or promote existing shippers.

use secrecy::{ExposeSecret, SecretString};

use shipdesk_api::db::{PgStore, UserStore};
use shipdesk_api::services::{AuthService, Registration};
use shipdesk_core::{Email, UserRole};

/// Variable the new account's password is read from.
pub const PASSWORD_ENV: &str = "SHIPDESK_USER_PASSWORD";

/// Create an account with `role`.
///
/// # Errors
///
/// Returns an error if the password variable is unset, the input fails
/// validation, or the email is taken.
pub async fn create(
    email: &str,
    name: &str,
    role: UserRole,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let password = std::env::var(PASSWORD_ENV)
        .map(SecretString::from)
        .map_err(|_| format!("{PASSWORD_ENV} not set"))?;

    let store = PgStore::new(pool);
    let user = AuthService::new(&store)
        .register(
            Registration {
                email: email.to_owned(),
                password: password.expose_secret().to_owned(),
                full_name: name.to_owned(),
            },
            role,
        )
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "User created");
    Ok(())
}

/// Change the role of the account registered under `email`.
///
/// # Errors
///
/// Returns an error if the email is invalid or unknown.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let store = PgStore::new(super::connect().await?);

    let user = store.set_user_role(&email, role).await?;
    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        role = %user.role,
        "Role updated; takes effect at the user's next login"
    );
    Ok(())
}
