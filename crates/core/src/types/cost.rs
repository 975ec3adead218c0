//! Shipping cost derivation.
//!
//! A shipment's cost is never an input. It is derived from the carrier's
//! base rate plus flat surcharges for the optional services, using exact
//! decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat surcharges for optional services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingFees {
    /// Added when the shipment is insured.
    pub insurance: Decimal,
    /// Added when a signature is required on delivery.
    pub signature: Decimal,
}

impl ShippingFees {
    /// Default insurance surcharge (5.00).
    pub const DEFAULT_INSURANCE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);
    /// Default signature surcharge (3.00).
    pub const DEFAULT_SIGNATURE: Decimal = Decimal::from_parts(300, 0, 0, false, 2);

    /// Derive the cost breakdown for a base rate and service options.
    #[must_use]
    pub fn quote(&self, base_rate: Decimal, options: ServiceOptions) -> CostBreakdown {
        let insurance_fee = if options.insurance {
            self.insurance
        } else {
            Decimal::ZERO
        };
        let signature_fee = if options.signature_required {
            self.signature
        } else {
            Decimal::ZERO
        };

        CostBreakdown {
            base: base_rate,
            insurance_fee,
            signature_fee,
            total: base_rate + insurance_fee + signature_fee,
        }
    }
}

impl Default for ShippingFees {
    fn default() -> Self {
        Self {
            insurance: Self::DEFAULT_INSURANCE,
            signature: Self::DEFAULT_SIGNATURE,
        }
    }
}

/// Optional services chosen for a shipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceOptions {
    #[serde(default)]
    pub insurance: bool,
    #[serde(default)]
    pub signature_required: bool,
}

/// Itemized shipping cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub base: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub insurance_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub signature_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}
