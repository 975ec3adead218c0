//! Shipments and their tracking history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shipdesk_core::{
    CarrierId, ServiceOptions, ShipmentId, ShipmentStatus, TrackingEventId, TrackingNumber, UserId,
};

use super::{Address, AddressDetails, FieldErrors, trim_in_place};

/// What is being shipped.
///
/// Numbers travel as JSON numbers. Missing values deserialize as zero and
/// fail validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDetails {
    /// Kilograms.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub weight: Decimal,
    /// Centimetres.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub length: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub width: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub height: Decimal,
    /// Declared value of the contents.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service_type: String,
}

impl PackageDetails {
    #[must_use]
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.description);
        trim_in_place(&mut self.service_type);
        self
    }

    pub fn validate(&self, errors: &mut FieldErrors) {
        for (field, value) in [
            ("package.weight", self.weight),
            ("package.length", self.length),
            ("package.width", self.width),
            ("package.height", self.height),
        ] {
            errors.positive(field, value);
        }
        errors.non_negative("package.value", self.value);

        // Column types of the shipments table.
        errors.fits_numeric("package.weight", self.weight, 10, 3);
        errors.fits_numeric("package.length", self.length, 10, 2);
        errors.fits_numeric("package.width", self.width, 10, 2);
        errors.fits_numeric("package.height", self.height, 10, 2);
        errors.fits_numeric("package.value", self.value, 12, 2);
        errors.require("package.description", &self.description);
        errors.require("package.service_type", &self.service_type);
    }
}

/// A shipment with its sender and recipient addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub tracking_number: TrackingNumber,
    pub user_id: UserId,
    pub carrier_id: CarrierId,
    pub sender: Address,
    pub recipient: Address,
    pub package: PackageDetails,
    pub insurance: bool,
    pub signature_required: bool,
    pub status: ShipmentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shipment {
    #[must_use]
    pub const fn options(&self) -> ServiceOptions {
        ServiceOptions {
            insurance: self.insurance,
            signature_required: self.signature_required,
        }
    }
}

/// One entry of a shipment's append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEvent {
    pub id: TrackingEventId,
    pub shipment_id: ShipmentId,
    pub status: ShipmentStatus,
    pub description: String,
    pub location: Option<String>,
    /// When it physically happened.
    pub event_time: DateTime<Utc>,
    /// When it was recorded; strictly increasing per shipment.
    pub created_at: DateTime<Utc>,
}

/// A tracking event to append.
#[derive(Debug, Clone)]
pub struct NewTrackingEvent {
    pub status: ShipmentStatus,
    pub description: String,
    pub location: Option<String>,
    pub event_time: DateTime<Utc>,
}

/// A shipment together with its events, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentDetail {
    pub shipment: Shipment,
    pub events: Vec<TrackingEvent>,
}

/// Everything needed to persist a new shipment in one transaction.
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub tracking_number: TrackingNumber,
    pub user_id: UserId,
    pub carrier_id: CarrierId,
    pub sender: AddressDetails,
    pub recipient: AddressDetails,
    pub package: PackageDetails,
    pub options: ServiceOptions,
    pub cost: Decimal,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub initial_event: NewTrackingEvent,
}

/// Listing filter for a user's shipments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShipmentFilter {
    pub status: Option<ShipmentStatus>,
    /// `None` returns every match.
    pub limit: Option<u32>,
    pub offset: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn package_numbers_accept_json_numbers() {
        let package: PackageDetails = serde_json::from_str(
            r#"{"weight":2.5,"length":30,"width":20,"height":10,"value":100,
                "description":"Documents","service_type":"standard"}"#,
        )
        .unwrap();
        assert_eq!(package.weight, Decimal::from_str("2.5").unwrap());
        assert_eq!(package.value, Decimal::from(100));

        let json = serde_json::to_value(&package).unwrap();
        assert_eq!(json["weight"], serde_json::json!(2.5));
    }

    #[test]
    fn missing_package_fields_fail_validation() {
        let package: PackageDetails = serde_json::from_str(r#"{"value":0}"#).unwrap();
        let mut errors = FieldErrors::new();
        package.normalized().validate(&mut errors);

        assert_eq!(errors.get("package.weight"), Some("must be greater than 0"));
        assert_eq!(errors.get("package.description"), Some("is required"));
        assert_eq!(errors.get("package.value"), None);
    }

    #[test]
    fn negative_value_is_rejected() {
        let package = PackageDetails {
            weight: Decimal::ONE,
            length: Decimal::ONE,
            width: Decimal::ONE,
            height: Decimal::ONE,
            value: Decimal::NEGATIVE_ONE,
            description: "Box".to_owned(),
            service_type: "standard".to_owned(),
        };
        let mut errors = FieldErrors::new();
        package.validate(&mut errors);
        assert_eq!(errors.get("package.value"), Some("must not be negative"));
        assert_eq!(errors.iter().count(), 1);
    }

    fn boxed(weight: &str, length: &str, value: &str) -> PackageDetails {
        PackageDetails {
            weight: Decimal::from_str(weight).unwrap(),
            length: Decimal::from_str(length).unwrap(),
            width: Decimal::ONE,
            height: Decimal::ONE,
            value: Decimal::from_str(value).unwrap(),
            description: "Box".to_owned(),
            service_type: "standard".to_owned(),
        }
    }

    #[test]
    fn oversized_numbers_are_rejected() {
        let mut errors = FieldErrors::new();
        boxed("10000000", "100000000", "10000000000").validate(&mut errors);

        assert_eq!(
            errors.get("package.weight"),
            Some("must be less than 10000000")
        );
        assert_eq!(
            errors.get("package.length"),
            Some("must be less than 100000000")
        );
        assert_eq!(
            errors.get("package.value"),
            Some("must be less than 10000000000")
        );

        let mut errors = FieldErrors::new();
        boxed("9999999.999", "99999999.99", "9999999999.99").validate(&mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn extra_decimal_places_are_rejected() {
        let mut errors = FieldErrors::new();
        boxed("2.5555", "30.001", "100.005").validate(&mut errors);

        assert_eq!(
            errors.get("package.weight"),
            Some("must have at most 3 decimal places")
        );
        assert_eq!(
            errors.get("package.length"),
            Some("must have at most 2 decimal places")
        );
        assert_eq!(
            errors.get("package.value"),
            Some("must have at most 2 decimal places")
        );

        let mut errors = FieldErrors::new();
        boxed("2.555", "30.50", "100.00").validate(&mut errors);
        assert!(errors.is_empty());
    }
}
