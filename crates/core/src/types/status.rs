//! Status enums and the order fulfillment state machine.
//!
//! ```text
//!            +-----------+     +-----------+
//!   pending -+-> confirmed -+-> delivered |
//!            |             |
//!            +-> rejected  +-> cancelled
//!            |
//!            +-> cancelled
//! ```
//!
//! `delivered`, `rejected` and `cancelled` are terminal. Whether the table is
//! enforced is decided by [`TransitionPolicy`].

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the known order statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order status: {0}")]
pub struct UnknownOrderStatus(pub String);

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bazaar.order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Submitted by the buyer, awaiting the seller.
    #[default]
    Pending,
    /// Accepted by the seller.
    Confirmed,
    /// Handed over to the buyer and paid in cash.
    Delivered,
    /// Withdrawn before delivery.
    Cancelled,
    /// Declined by the seller.
    Rejected,
}

impl OrderStatus {
    /// Every status, in vocabulary order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Delivered,
        Self::Cancelled,
        Self::Rejected,
    ];

    /// The wire/database spelling of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// Whether no further transition is expected from this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Cancelled)
    }

    /// Statuses reachable from this one in a single step.
    #[must_use]
    pub const fn next_statuses(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Rejected, Self::Cancelled],
            Self::Confirmed => &[Self::Delivered, Self::Cancelled],
            Self::Delivered | Self::Cancelled | Self::Rejected => &[],
        }
    }

    /// Whether moving from `self` to `next` follows the transition table.
    ///
    /// Re-asserting the current status is always allowed so that a repeated
    /// click on the dashboard is harmless.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        *self == next || self.next_statuses().contains(&next)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownOrderStatus(s.to_owned()))
    }
}

/// How strictly status updates follow the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionPolicy {
    /// Only transitions in the table are allowed.
    #[default]
    Strict,
    /// Any status may follow any other (last write wins).
    Legacy,
}

impl TransitionPolicy {
    /// Whether this policy permits moving from `from` to `to`.
    #[must_use]
    pub fn permits(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            Self::Strict => from.can_transition_to(to),
            Self::Legacy => true,
        }
    }
}

impl std::str::FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "legacy" => Ok(Self::Legacy),
            _ => Err(format!("invalid transition policy: {s} (expected strict or legacy)")),
        }
    }
}

/// Payment method for an order. Cash on delivery is the only one offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "bazaar.payment_method"))]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cod")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "cod"))]
    CashOnDelivery,
}

impl PaymentMethod {
    /// The wire/database spelling of the payment method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cod",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::CashOnDelivery),
            _ => Err(format!("unsupported payment method: {s}")),
        }
    }
}

/// Who wrote a product chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Buyer,
    Seller,
}
