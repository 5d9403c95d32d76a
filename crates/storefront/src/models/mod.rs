//! Domain models for the storefront.
//!
//! Pure domain types (ids, prices, the cart and the status machine) live in
//! `bazaar-core`. This module holds the persisted records and the request
//! bodies built on top of them.

pub mod catalog;
pub mod order;
pub mod session;

pub use session::keys as session_keys;
