//! Shipment lifecycle.
//!
//! ```text
//! pending -> picked_up -> in_transit -> out_for_delivery -> delivered
//!    \___________\______________\_______________\
//!                                                 `-> failed | returned | cancelled
//! ```
//!
//! The happy path must be walked one step at a time. `failed`, `returned`
//! and `cancelled` are reachable from every non-terminal state. Terminal
//! states never change again.

use serde::{Deserialize, Serialize};

/// Status of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shipment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Booked, waiting for the carrier to collect it.
    #[default]
    Pending,
    /// Collected from the sender.
    PickedUp,
    /// Moving through the carrier network.
    InTransit,
    /// On the delivery vehicle.
    OutForDelivery,
    /// Handed to the recipient.
    Delivered,
    /// Delivery could not be completed.
    Failed,
    /// Sent back to the sender.
    Returned,
    /// Withdrawn before delivery.
    Cancelled,
}

/// Statuses that end a shipment's lifecycle without delivery.
const EXCEPTIONS: [ShipmentStatus; 3] = [
    ShipmentStatus::Failed,
    ShipmentStatus::Returned,
    ShipmentStatus::Cancelled,
];

/// Every non-terminal status.
const OPEN: [ShipmentStatus; 4] = [
    ShipmentStatus::Pending,
    ShipmentStatus::PickedUp,
    ShipmentStatus::InTransit,
    ShipmentStatus::OutForDelivery,
];

/// How a status should be presented on dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Neutral,
    Info,
    Progress,
    Success,
    Warning,
    Danger,
}

/// A rejected status change.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("shipment is already {from} and cannot change status")]
    Terminal { from: ShipmentStatus },
    #[error("shipment is already {status}")]
    Unchanged { status: ShipmentStatus },
    #[error("cannot move a shipment from {from} to {to}")]
    NotAllowed {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },
}

impl ShipmentStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::Pending,
        Self::PickedUp,
        Self::InTransit,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Failed,
        Self::Returned,
        Self::Cancelled,
    ];

    /// Statuses a shipment may be in immediately before entering `self`.
    #[must_use]
    pub const fn allowed_predecessors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[],
            Self::PickedUp => &[Self::Pending],
            Self::InTransit => &[Self::PickedUp],
            Self::OutForDelivery => &[Self::InTransit],
            Self::Delivered => &[Self::OutForDelivery],
            Self::Failed | Self::Returned | Self::Cancelled => &OPEN,
        }
    }

    /// Whether no further status change is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Failed | Self::Returned | Self::Cancelled
        )
    }

    /// Whether `self -> target` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        target.allowed_predecessors().contains(&self)
    }

    /// Validate a transition and return the new status.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] explaining why the change is illegal.
    pub fn transition_to(self, target: Self) -> Result<Self, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal { from: self });
        }
        if self == target {
            return Err(TransitionError::Unchanged { status: self });
        }
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(TransitionError::NotAllowed {
                from: self,
                to: target,
            })
        }
    }

    /// Statuses this one may move to next.
    #[must_use]
    pub fn next_statuses(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(*target))
            .collect()
    }

    /// Whether this status ended the lifecycle without a delivery.
    #[must_use]
    pub fn is_exception(self) -> bool {
        EXCEPTIONS.contains(&self)
    }

    /// The status' wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PickedUp => "picked_up",
            Self::InTransit => "in_transit",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::PickedUp => "Picked up",
            Self::InTransit => "In transit",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Failed => "Delivery failed",
            Self::Returned => "Returned to sender",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Display tone for status badges.
    #[must_use]
    pub const fn tone(self) -> StatusTone {
        match self {
            Self::Pending | Self::Cancelled => StatusTone::Neutral,
            Self::PickedUp => StatusTone::Info,
            Self::InTransit | Self::OutForDelivery => StatusTone::Progress,
            Self::Delivered => StatusTone::Success,
            Self::Returned => StatusTone::Warning,
            Self::Failed => StatusTone::Danger,
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid shipment status: {s}"))
    }
}
