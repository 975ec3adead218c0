//! Postal addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shipdesk_core::{AddressId, Email, UserId};

use super::{FieldErrors, trim_in_place, trim_optional};

/// The postal and contact fields of an address.
///
/// Used both for address-book entries and for the sender/recipient copies
/// written with each shipment. Missing fields deserialize as blank so that
/// validation can report them per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressDetails {
    pub label: Option<String>,
    pub name: String,
    pub company: Option<String>,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl AddressDetails {
    /// Trim every field and lower-case a valid email.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        trim_optional(&mut self.label);
        trim_optional(&mut self.company);
        for field in [
            &mut self.name,
            &mut self.email,
            &mut self.phone,
            &mut self.street,
            &mut self.city,
            &mut self.state,
            &mut self.zip,
            &mut self.country,
        ] {
            trim_in_place(field);
        }
        if let Ok(email) = Email::parse(&self.email) {
            self.email = email.into();
        }
        self
    }

    /// Check required fields, recording failures under `{prefix}.{field}`.
    pub fn validate(&self, prefix: &str, errors: &mut FieldErrors) {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("country", &self.country),
        ];
        for (field, value) in required {
            errors.require(&format!("{prefix}.{field}"), value);
        }

        let email_field = format!("{prefix}.email");
        if self.email.trim().is_empty() {
            errors.add(email_field, "is required");
        } else if let Err(e) = Email::parse(&self.email) {
            errors.add(email_field, e.to_string());
        }
    }

    /// Where a shipment leaving this address starts: the city, or the state
    /// when no city is given.
    #[must_use]
    pub fn origin_location(&self) -> Option<String> {
        [&self.city, &self.state]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_owned)
    }
}

/// A stored address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub details: AddressDetails,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating an address-book entry.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub user_id: UserId,
    pub details: AddressDetails,
    /// Make this the user's default, clearing the previous default.
    pub is_default: bool,
}
