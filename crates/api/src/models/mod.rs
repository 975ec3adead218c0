//! Domain types for the API.
//!
//! These are validated domain objects, separate from database row types.
//! Request payloads that need validation carry a `validate` method that
//! collects every problem into [`FieldErrors`] instead of stopping at the
//! first one.

pub mod address;
pub mod carrier;
pub mod content;
pub mod shipment;
pub mod user;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

pub use address::{Address, AddressDetails, NewAddress};
pub use carrier::{Carrier, NewCarrier};
pub use content::{
    ClientLogo, ContentSection, ContentSectionInput, HeroSlide, NewClientLogo, NewHeroSlide,
    SiteSettings, SiteSettingsInput,
};
pub use shipment::{
    NewShipment, NewTrackingEvent, PackageDetails, Shipment, ShipmentDetail, ShipmentFilter,
    TrackingEvent,
};
pub use user::{NewUser, User};

/// Field-level validation failures, keyed by dotted field path
/// (`sender.city`, `package.weight`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Require a non-blank string.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
    }

    /// Require a strictly positive number.
    pub fn positive(&mut self, field: &str, value: Decimal) {
        if value <= Decimal::ZERO {
            self.add(field, "must be greater than 0");
        }
    }

    /// Require a number that is zero or more.
    pub fn non_negative(&mut self, field: &str, value: Decimal) {
        if value.is_sign_negative() && !value.is_zero() {
            self.add(field, "must not be negative");
        }
    }

    /// Require a number that a `NUMERIC(precision, scale)` column stores
    /// exactly.
    pub fn fits_numeric(&mut self, field: &str, value: Decimal, precision: u32, scale: u32) {
        if let Some(message) = numeric_column_error(value, precision, scale) {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Why `value` would be rounded or rejected by a `NUMERIC(precision, scale)`
/// column, or `None` when it is stored as-is.
#[must_use]
pub fn numeric_column_error(value: Decimal, precision: u32, scale: u32) -> Option<String> {
    if value.normalize().scale() > scale {
        return Some(format!("must have at most {scale} decimal places"));
    }
    let limit = (scale..precision).fold(Decimal::ONE, |acc, _| acc * Decimal::TEN);
    (value.abs() >= limit).then(|| format!("must be less than {limit}"))
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field} {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Trim a string in place.
pub(crate) fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

/// Trim an optional string, dropping it when blank.
pub(crate) fn trim_optional(value: &mut Option<String>) {
    *value = value
        .take()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty());
}
