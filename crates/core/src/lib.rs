//! Bazaar Core - Shared domain library.
//!
//! This crate provides the domain model used across all Bazaar components:
//! - `storefront` - JSON API for buyers and shopkeepers
//! - `cli` - Command-line tools for migrations and seed data
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows the cart and the order
//! state machine to be tested without any infrastructure.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, phone numbers and statuses
//! - [`cart`] - The buyer's cart aggregate
//! - [`view`] - Shopping-stage navigation state
//! - [`dashboard`] - Seller dashboard statistics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod dashboard;
pub mod types;
pub mod view;

pub use cart::{Cart, CartItem, OrderLine};
pub use dashboard::SellerStats;
pub use types::*;
pub use view::{View, ViewState};
