//! Push events emitted on the order channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::Order;
use crate::types::{OrderEventType, OrderId, OrderStatus};

/// One frame on `/orders/stream` or `/orders/{id}/stream`.
///
/// `order` and `status` are absent on [`OrderEventType::CommentAdded`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub event_type: OrderEventType,
    pub order_id: OrderId,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
