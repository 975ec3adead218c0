//! Core types for Shipdesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cost;
pub mod email;
pub mod id;
pub mod role;
pub mod status;
pub mod tracking_number;

pub use cost::{CostBreakdown, ServiceOptions, ShippingFees};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::UserRole;
pub use status::{ShipmentStatus, StatusTone, TransitionError};
pub use tracking_number::{TrackingNumber, TrackingNumberError, TrackingNumberGenerator};
