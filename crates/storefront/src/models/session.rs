//! Session-related types.
//!
//! The buyer's cart and navigation state live in the session, never in the
//! relational store.

/// Session keys for buyer state.
pub mod keys {
    /// Key for the serialized [`bazaar_core::Cart`].
    pub const CART: &str = "cart";

    /// Key for the serialized [`bazaar_core::ViewState`].
    pub const VIEW: &str = "view";
}
