//! Core types for FastBite.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{CommentId, OrderId, ProductId, UserId};
pub use price::{Price, PriceError};
pub use status::{OrderEventType, OrderStatus, Role};
