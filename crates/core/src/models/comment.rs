//! Order comment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CommentId, OrderId, Role, UserId};

/// A message attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: Option<CommentId>,
    pub order_id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_role: Option<Role>,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /orders/{id}/comments`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest {
    pub message: String,
}

impl CreateCommentRequest {
    /// Longest message the backend stores.
    pub const MAX_LENGTH: usize = 500;
}
