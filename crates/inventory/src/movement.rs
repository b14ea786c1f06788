use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdesk_auth::PrincipalId;
use shopdesk_core::{DomainError, DomainResult, MovementId, ProductId};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }

    /// Signed effect of `quantity` units moving in this direction.
    pub fn signed(&self, quantity: i64) -> i64 {
        match self {
            Direction::In => quantity,
            Direction::Out => -quantity,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            other => Err(DomainError::validation(format!(
                "unknown movement direction '{other}'"
            ))),
        }
    }
}

/// A requested change to one product's on-hand quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub direction: Direction,
    pub quantity: i64,
}

impl StockAdjustment {
    pub fn new(product_id: ProductId, direction: Direction, quantity: i64) -> Self {
        Self {
            product_id,
            direction,
            quantity,
        }
    }

    pub fn inbound(product_id: ProductId, quantity: i64) -> Self {
        Self::new(product_id, Direction::In, quantity)
    }

    pub fn outbound(product_id: ProductId, quantity: i64) -> Self {
        Self::new(product_id, Direction::Out, quantity)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }

    pub fn delta(&self) -> i64 {
        self.direction.signed(self.quantity)
    }
}

/// Append-only ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub direction: Direction,
    pub quantity: i64,
    /// `None` for system-originated movements (marketplace import).
    pub actor: Option<PrincipalId>,
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    pub fn record(
        adjustment: &StockAdjustment,
        actor: Option<PrincipalId>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            product_id: adjustment.product_id,
            direction: adjustment.direction,
            quantity: adjustment.quantity,
            actor,
            occurred_at,
        }
    }

    pub fn delta(&self) -> i64 {
        self.direction.signed(self.quantity)
    }
}

/// Query over the movement log. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MovementFilter {
    pub const DEFAULT_LIMIT: usize = 100;
    pub const MAX_LIMIT: usize = 1000;

    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        self.product_id.is_none_or(|id| id == movement.product_id)
            && self.direction.is_none_or(|d| d == movement.direction)
    }

    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}
