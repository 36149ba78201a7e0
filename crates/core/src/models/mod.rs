//! Wire records exchanged with the ordering backend.
//!
//! All records use the backend's camelCase field names. Optional fields are
//! tolerated as missing so older server builds still deserialize.

pub mod auth;
pub mod catalog;
pub mod comment;
pub mod event;
pub mod order;

pub use auth::{AuthResponse, LoginRequest, RegisterRequest};
pub use catalog::Product;
pub use comment::{Comment, CreateCommentRequest};
pub use event::OrderEvent;
pub use order::{CartItemRequest, CreateOrderRequest, Order, OrderItem, UpdateStatusRequest};
