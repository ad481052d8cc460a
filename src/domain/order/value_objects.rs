use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

/// Lifecycle status carried in the `event` field of every order snapshot.
///
/// Variants are declared in lifecycle order, so the derived `Ord` is the
/// lifecycle order: an order may only ever move to a greater status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Sent to kitchen")]
    SentToKitchen,
    #[serde(rename = "Cooking")]
    Cooking,
    #[serde(rename = "Ready for delivery")]
    ReadyForDelivery,
    #[serde(rename = "Delivery started")]
    DeliveryStarted,
    #[serde(rename = "Order picked up by driver")]
    PickedUpByDriver,
    #[serde(rename = "En-route")]
    EnRoute,
    #[serde(rename = "Nearby")]
    Nearby,
    #[serde(rename = "Delivered")]
    Delivered,
}

/// The service that owns (emits) a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Store,
    Kitchen,
    Delivery,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::SentToKitchen,
        OrderStatus::Cooking,
        OrderStatus::ReadyForDelivery,
        OrderStatus::DeliveryStarted,
        OrderStatus::PickedUpByDriver,
        OrderStatus::EnRoute,
        OrderStatus::Nearby,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::SentToKitchen => "Sent to kitchen",
            OrderStatus::Cooking => "Cooking",
            OrderStatus::ReadyForDelivery => "Ready for delivery",
            OrderStatus::DeliveryStarted => "Delivery started",
            OrderStatus::PickedUpByDriver => "Order picked up by driver",
            OrderStatus::EnRoute => "En-route",
            OrderStatus::Nearby => "Nearby",
            OrderStatus::Delivered => "Delivered",
        }
    }

    /// Zero-based position in the lifecycle.
    pub fn stage(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<OrderStatus> {
        Self::ALL.get(self.stage() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }

    pub fn owner(&self) -> Service {
        match self {
            OrderStatus::SentToKitchen => Service::Store,
            OrderStatus::Cooking | OrderStatus::ReadyForDelivery => Service::Kitchen,
            OrderStatus::DeliveryStarted
            | OrderStatus::PickedUpByDriver
            | OrderStatus::EnRoute
            | OrderStatus::Nearby
            | OrderStatus::Delivered => Service::Delivery,
        }
    }

    /// The worker that takes the order over from this status, if ownership
    /// changes at the next step (`Sent to kitchen` and `Ready for delivery`).
    pub fn handed_to(&self) -> Option<Service> {
        let next = self.next()?.owner();
        (next != self.owner()).then_some(next)
    }

    /// Transitions are strictly forward; re-entering the current status is refused.
    pub fn can_advance_to(&self, target: OrderStatus) -> bool {
        target > *self
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| OrderError::Validation(format!("unknown order event: {s}")))
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Store => "pizza-store",
            Service::Kitchen => "pizza-kitchen",
            Service::Delivery => "pizza-delivery",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_order() {
        let mut status = OrderStatus::SentToKitchen;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            assert!(next > status);
            seen.push(next);
            status = next;
        }
        assert_eq!(seen, OrderStatus::ALL.to_vec());
        assert!(status.is_terminal());
    }

    #[test]
    fn test_only_delivered_is_terminal() {
        let terminal: Vec<_> = OrderStatus::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![&OrderStatus::Delivered]);
        assert_eq!(OrderStatus::Delivered.next(), None);
    }

    #[test]
    fn test_serializes_as_workshop_strings() {
        let json = serde_json::to_string(&OrderStatus::PickedUpByDriver).unwrap();
        assert_eq!(json, "\"Order picked up by driver\"");

        let status: OrderStatus = serde_json::from_str("\"Ready for delivery\"").unwrap();
        assert_eq!(status, OrderStatus::ReadyForDelivery);
    }

    #[test]
    fn test_from_str_matches_as_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!(matches!(
            "Burnt".parse::<OrderStatus>(),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn test_cannot_advance_backwards_or_in_place() {
        assert!(OrderStatus::Cooking.can_advance_to(OrderStatus::ReadyForDelivery));
        assert!(OrderStatus::Cooking.can_advance_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Cooking.can_advance_to(OrderStatus::Cooking));
        assert!(!OrderStatus::EnRoute.can_advance_to(OrderStatus::SentToKitchen));
    }

    #[test]
    fn test_hand_offs_happen_where_ownership_changes() {
        assert_eq!(OrderStatus::SentToKitchen.handed_to(), Some(Service::Kitchen));
        assert_eq!(OrderStatus::ReadyForDelivery.handed_to(), Some(Service::Delivery));

        let hand_offs = OrderStatus::ALL.iter().filter(|s| s.handed_to().is_some()).count();
        assert_eq!(hand_offs, 2);
        assert_eq!(OrderStatus::Delivered.handed_to(), None);
    }

    #[test]
    fn test_ownership() {
        assert_eq!(OrderStatus::SentToKitchen.owner(), Service::Store);
        assert_eq!(OrderStatus::Cooking.owner(), Service::Kitchen);
        assert_eq!(OrderStatus::ReadyForDelivery.owner(), Service::Kitchen);
        for status in &OrderStatus::ALL[3..] {
            assert_eq!(status.owner(), Service::Delivery);
        }
    }
}
