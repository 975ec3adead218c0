//! Business logic sitting between the routes and the store.

pub mod auth;
pub mod carriers;
pub mod shipments;

pub use auth::{AuthError, AuthService, Claims, Registration, TokenService};
pub use carriers::CarrierDirectory;
pub use shipments::{ShipmentError, ShipmentService};
