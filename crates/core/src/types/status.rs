//! Role and status enums shared by the backend contract.
//!
//! The backend speaks Spanish wire names (`COCINA`, `EN_CAMINO`, ...). The
//! Rust names are English; serde maps between the two.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User role as reported by the backend.
///
/// Unknown role strings are preserved in [`Role::Unrecognized`] rather than
/// rejected, so a stored profile with a role this build does not know about
/// still loads. Navigation treats such a role as unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Orders food (`CLIENTE`).
    Customer,
    /// Prepares orders (`COCINA`).
    Kitchen,
    /// Delivers orders (`REPARTIDOR`).
    Delivery,
    /// Any other role string, kept verbatim.
    Unrecognized(String),
}

impl Role {
    /// Wire name understood by the backend.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Customer => "CLIENTE",
            Self::Kitchen => "COCINA",
            Self::Delivery => "REPARTIDOR",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Returns `true` for the three roles this client knows how to serve.
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "CLIENTE" | "CUSTOMER" => Self::Customer,
            "COCINA" | "KITCHEN" => Self::Kitchen,
            "REPARTIDOR" | "DELIVERY" => Self::Delivery,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unrecognized(raw) => raw,
            known => known.as_wire().to_owned(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from(s.to_owned()) {
            Self::Unrecognized(raw) => Err(format!("invalid role: {raw}")),
            role => Ok(role),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed, waiting for the kitchen.
    #[serde(rename = "RECIBIDO")]
    Received,
    /// Being cooked.
    #[serde(rename = "PREPARANDO")]
    Preparing,
    /// Cooked, waiting for a driver.
    #[serde(rename = "LISTO")]
    Ready,
    /// Picked up by a driver.
    #[serde(rename = "EN_CAMINO")]
    OnTheWay,
    /// Handed to the customer.
    #[serde(rename = "ENTREGADO")]
    Delivered,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Received,
        Self::Preparing,
        Self::Ready,
        Self::OnTheWay,
        Self::Delivered,
    ];

    /// Wire name understood by the backend.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Received => "RECIBIDO",
            Self::Preparing => "PREPARANDO",
            Self::Ready => "LISTO",
            Self::OnTheWay => "EN_CAMINO",
            Self::Delivered => "ENTREGADO",
        }
    }

    /// Whether `role` may move an order from `self` to `next`.
    ///
    /// Mirrors the backend's transition table so views can hide actions the
    /// server would reject. The server stays authoritative.
    #[must_use]
    pub fn can_advance_to(self, next: Self, role: &Role) -> bool {
        match role {
            Role::Kitchen => matches!(
                (self, next),
                (Self::Received, Self::Preparing) | (Self::Preparing, Self::Ready)
            ),
            Role::Delivery => matches!(
                (self, next),
                (Self::Ready, Self::OnTheWay) | (Self::OnTheWay, Self::Delivered)
            ),
            Role::Customer | Role::Unrecognized(_) => false,
        }
    }

    /// Statuses shown on the kitchen queue.
    #[must_use]
    pub const fn is_kitchen_visible(self) -> bool {
        matches!(self, Self::Received | Self::Preparing | Self::Ready)
    }

    /// Statuses shown on the delivery queue.
    #[must_use]
    pub const fn is_delivery_visible(self) -> bool {
        matches!(self, Self::Ready | Self::OnTheWay)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| {
                status.as_wire() == wanted
                    || format!("{status:?}").to_ascii_uppercase() == wanted.replace('_', "")
            })
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Kind of change carried by an order event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    /// A new order was placed.
    Created,
    /// An order moved to a new status.
    StatusChanged,
    /// Someone commented on an order.
    CommentAdded,
}

impl OrderEventType {
    /// Wire name understood by the backend.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::CommentAdded => "COMMENT_ADDED",
        }
    }
}

impl fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_wire_and_english_names() {
        let wire: Role = serde_json::from_str("\"COCINA\"").unwrap();
        let english: Role = serde_json::from_str("\"Kitchen\"").unwrap();
        assert_eq!(wire, Role::Kitchen);
        assert_eq!(english, Role::Kitchen);
    }

    #[test]
    fn test_role_serializes_wire_name() {
        assert_eq!(serde_json::to_string(&Role::Delivery).unwrap(), "\"REPARTIDOR\"");
    }

    #[test]
    fn test_unknown_role_is_preserved() {
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Unrecognized("ADMIN".to_string()));
        assert!(!role.is_recognized());
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"ADMIN\"");
    }

    #[test]
    fn test_role_from_str_rejects_unknown() {
        assert_eq!("customer".parse::<Role>(), Ok(Role::Customer));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_status_wire_names() {
        let status: OrderStatus = serde_json::from_str("\"EN_CAMINO\"").unwrap();
        assert_eq!(status, OrderStatus::OnTheWay);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Preparing).unwrap(),
            "\"PREPARANDO\""
        );
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("listo".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert_eq!("on-the-way".parse::<OrderStatus>(), Ok(OrderStatus::OnTheWay));
        assert_eq!("Delivered".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_kitchen_transitions() {
        let kitchen = Role::Kitchen;
        assert!(OrderStatus::Received.can_advance_to(OrderStatus::Preparing, &kitchen));
        assert!(OrderStatus::Preparing.can_advance_to(OrderStatus::Ready, &kitchen));
        assert!(!OrderStatus::Ready.can_advance_to(OrderStatus::OnTheWay, &kitchen));
        assert!(!OrderStatus::Received.can_advance_to(OrderStatus::Ready, &kitchen));
    }

    #[test]
    fn test_delivery_transitions() {
        let delivery = Role::Delivery;
        assert!(OrderStatus::Ready.can_advance_to(OrderStatus::OnTheWay, &delivery));
        assert!(OrderStatus::OnTheWay.can_advance_to(OrderStatus::Delivered, &delivery));
        assert!(!OrderStatus::Received.can_advance_to(OrderStatus::Preparing, &delivery));
    }

    #[test]
    fn test_customer_cannot_advance() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert!(!from.can_advance_to(to, &Role::Customer));
            }
        }
    }

    #[test]
    fn test_event_type_wire_names() {
        let kind: OrderEventType = serde_json::from_str("\"STATUS_CHANGED\"").unwrap();
        assert_eq!(kind, OrderEventType::StatusChanged);
    }
}
