//! Order records and order mutation payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OrderStatus, Price, ProductId, UserId};

/// One product line of a placed order, priced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl OrderItem {
    /// Line subtotal (`unit_price * quantity`).
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub customer_id: Option<UserId>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total: Option<Price>,
    pub status: OrderStatus,
    #[serde(default)]
    pub assigned_delivery_id: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total reported by the backend, or the sum of line subtotals if absent.
    #[must_use]
    pub fn effective_total(&self) -> Price {
        self.total
            .unwrap_or_else(|| self.items.iter().map(OrderItem::subtotal).sum())
    }
}

/// One requested line of a new order. The backend re-prices it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub delivery_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<CartItemRequest>,
}

/// Body of `PATCH /orders/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_from_backend_shape() {
        let json = r#"{
            "id": "o1",
            "customerId": "u1",
            "customerName": "Ana",
            "deliveryAddress": "Calle 1",
            "items": [
                {"productId": "7", "productName": "Taco", "unitPrice": 3.50, "quantity": 2}
            ],
            "total": 7.00,
            "status": "RECIBIDO",
            "createdAt": "2024-05-01T12:00:00Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Received);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.effective_total(), Price::parse("7").unwrap());
    }

    #[test]
    fn test_effective_total_falls_back_to_items() {
        let order = Order {
            id: OrderId::new("o2"),
            customer_id: None,
            customer_name: None,
            customer_phone: None,
            delivery_address: None,
            notes: None,
            items: vec![
                OrderItem {
                    product_id: ProductId::from(1),
                    product_name: "Taco".to_string(),
                    unit_price: Price::parse("3.50").unwrap(),
                    quantity: 2,
                },
                OrderItem {
                    product_id: ProductId::from(2),
                    product_name: "Agua".to_string(),
                    unit_price: Price::parse("1.25").unwrap(),
                    quantity: 1,
                },
            ],
            total: None,
            status: OrderStatus::Ready,
            assigned_delivery_id: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(order.effective_total(), Price::parse("8.25").unwrap());
    }

    #[test]
    fn test_update_status_body() {
        let body = serde_json::to_value(UpdateStatusRequest {
            status: OrderStatus::OnTheWay,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"status": "EN_CAMINO"}));
    }

    #[test]
    fn test_create_order_body_shape() {
        let body = serde_json::to_value(CreateOrderRequest {
            delivery_address: "Calle 1".to_string(),
            notes: None,
            items: vec![CartItemRequest {
                product_id: ProductId::from(7),
                quantity: 2,
            }],
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "deliveryAddress": "Calle 1",
                "items": [{"productId": "7", "quantity": 2}]
            })
        );
    }
}
