//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `orders` - Order submission, the status state machine and seller stats
//! - `catalog` - Product and shopkeeper management
//! - `chat` - Per-product chat rooms (in memory)
//!
//! Services validate raw request input, talk to the stores through the
//! `db` traits and report failures as [`ServiceError`].

pub mod catalog;
pub mod chat;
pub mod orders;

use thiserror::Error;

use bazaar_core::{OrderStatus, UnknownOrderStatus};

use crate::db::RepositoryError;

pub use catalog::CatalogService;
pub use chat::{ChatMessage, ChatRooms};
pub use orders::OrderService;

/// Errors that can occur in storefront services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation. Nothing was persisted.
    #[error("{0}")]
    Validation(String),

    /// The named entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Status string outside the known vocabulary.
    #[error(transparent)]
    InvalidStatus(#[from] UnknownOrderStatus),

    /// Status change not allowed by the transition table.
    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Storage failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl ServiceError {
    /// Shorthand for a validation failure.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Trim a required text field, rejecting missing or blank values.
pub(crate) fn required_text(value: Option<&str>, field: &str) -> Result<String, ServiceError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_owned()),
        _ => Err(ServiceError::validation(format!("{field} is required"))),
    }
}

/// Trim an optional text field, treating blank values as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
