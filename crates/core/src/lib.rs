//! Bazaar Core - Shared domain types.
//!
//! This crate provides the domain vocabulary used across Bazaar components:
//! - `api` - The REST backend (accounts, catalog, cart, orders)
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and the rules attached to them - no I/O,
//! no database access, no HTTP clients. Cart merge semantics, order status
//! transitions, and price/quantity validation live here so they can be tested
//! without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, addresses, carts, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
