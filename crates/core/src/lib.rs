//! Shipdesk Core - Shared domain types.
//!
//! This crate provides the types used across all Shipdesk components:
//! - `api` - The REST service (dashboard, public tracking, content admin)
//! - `cli` - Command-line tools for migrations, seeding and accounts
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. The optional `postgres` feature adds `sqlx`
//! encoding for the types that are stored.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, roles, the shipment status machine,
//!   cost derivation and tracking numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
