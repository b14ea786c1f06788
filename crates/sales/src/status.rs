use core::str::FromStr;

use serde::{Deserialize, Serialize};

use shopdesk_core::{DomainError, DomainResult};

/// Order status lifecycle.
///
/// Main path: `Pending -> Processing -> Shipped -> Delivered`. Any non-terminal
/// status may be cancelled. Forward skips along the main path are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position on the main path; `None` for `Cancelled`.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }

    pub fn ensure_transition(&self, next: OrderStatus) -> DomainResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "cannot move order from {self} to {next}"
            )))
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn main_path_moves_forward_including_skips() {
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Shipped));
        assert!(Pending.can_transition_to(Delivered));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
    }

    #[test]
    fn cancellation_allowed_from_non_terminal_states() {
        for from in [Pending, Processing, Shipped] {
            assert!(from.can_transition_to(Cancelled), "{from} -> CANCELLED");
        }
    }

    #[test]
    fn backward_self_and_terminal_moves_are_rejected() {
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Pending));
        for s in OrderStatus::ALL {
            assert!(!s.can_transition_to(s), "self transition {s}");
            assert!(!Delivered.can_transition_to(s));
            assert!(!Cancelled.can_transition_to(s));
        }
    }

    #[test]
    fn rejected_transition_is_validation_error() {
        match Delivered.ensure_transition(Cancelled) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("DELIVERED")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn parses_case_insensitively_and_serializes_uppercase() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), Shipped);
        assert!("LOST".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_value(Cancelled).unwrap(), "CANCELLED");
    }
}
