//! Carriers (shipping providers).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shipdesk_core::CarrierId;

/// A shipping provider and its pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Carrier {
    pub id: CarrierId,
    pub name: String,
    /// Serialized as a decimal string (`"20.00"`).
    #[serde(with = "rust_decimal::serde::str")]
    pub base_rate: Decimal,
    pub service_types: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Carrier {
    /// Whether the carrier offers `service_type`. A carrier that lists no
    /// service types accepts any.
    #[must_use]
    pub fn offers(&self, service_type: &str) -> bool {
        self.service_types.is_empty() || self.service_types.iter().any(|s| s == service_type)
    }
}

/// Parameters for creating or replacing a carrier (seed files).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCarrier {
    pub id: CarrierId,
    pub name: String,
    pub base_rate: Decimal,
    #[serde(default)]
    pub service_types: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn carrier(service_types: &[&str]) -> Carrier {
        Carrier {
            id: CarrierId::parse("carrier-1").unwrap(),
            name: "Gulf Express".to_owned(),
            base_rate: Decimal::from_str("20.00").unwrap(),
            service_types: service_types.iter().map(|s| (*s).to_owned()).collect(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn base_rate_serializes_as_string() {
        let json = serde_json::to_value(carrier(&[])).unwrap();
        assert_eq!(json["base_rate"], "20.00");
        assert_eq!(json["id"], "carrier-1");
    }

    #[test]
    fn service_type_check() {
        assert!(carrier(&[]).offers("anything"));
        let c = carrier(&["standard", "express"]);
        assert!(c.offers("express"));
        assert!(!c.offers("overnight"));
    }

    #[test]
    fn new_carrier_defaults_to_active() {
        let new: NewCarrier =
            serde_json::from_str(r#"{"id":"carrier-2","name":"Desert Freight","base_rate":"15.50"}"#)
                .unwrap();
        assert!(new.is_active);
        assert!(new.service_types.is_empty());
        assert_eq!(new.base_rate, Decimal::from_str("15.50").unwrap());
    }
}
