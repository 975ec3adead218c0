//! Account roles.

use serde::{Deserialize, Serialize};

/// Role of a Shipdesk account.
///
/// Every self-registered account is a [`UserRole::Shipper`]. Carrier and
/// admin roles are granted by operators through the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Books and tracks their own shipments.
    #[default]
    Shipper,
    /// Reports progress on shipments in transit.
    Carrier,
    /// Manages site content and may act on any shipment.
    Admin,
}

impl UserRole {
    /// Whether this role may manage site content.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role may move any shipment through its lifecycle.
    #[must_use]
    pub const fn operates_shipments(self) -> bool {
        matches!(self, Self::Carrier | Self::Admin)
    }

    /// The role's wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipper => "shipper",
            Self::Carrier => "carrier",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipper" => Ok(Self::Shipper),
            "carrier" => Ok(Self::Carrier),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        for role in [UserRole::Shipper, UserRole::Carrier, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("super_admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn permissions() {
        assert!(!UserRole::Shipper.operates_shipments());
        assert!(UserRole::Carrier.operates_shipments());
        assert!(!UserRole::Carrier.is_admin());
        assert!(UserRole::Admin.is_admin());
    }
}
