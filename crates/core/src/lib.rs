//! FastBite Core - Shared types library.
//!
//! This crate provides the types used across the FastBite client workspace:
//! - `client` - Session, request gateway, live channels, and cart runtime
//! - `cli` - Terminal front end driving the runtime
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, roles, and statuses
//! - [`models`] - Wire records exchanged with the ordering backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use types::*;
