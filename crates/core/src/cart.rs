//! The buyer's cart aggregate.
//!
//! A cart is an ordered list of line items, at most one per product. Unit
//! prices are captured when an item is added and are never re-checked against
//! the catalog. The cart is owned by the buyer's session; it is never stored
//! alongside orders.
//!
//! Adding a product that is already in the cart bumps its quantity by one,
//! whatever quantity the incoming item carries. Setting a quantity to zero
//! keeps the line (at zero) until it is removed or pruned; zero lines are
//! never turned into order items.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, ShopkeeperId};

/// A product in the cart with its captured unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub title: String,
    /// Unit price at the time the product was added.
    pub price: Price,
    pub quantity: u32,
    pub shopkeeper_id: ShopkeeperId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartItem {
    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A snapshot of one cart line, ready to become an order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

/// The cart aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The cart's line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Add a product to the cart.
    ///
    /// If the product already has a line its quantity goes up by exactly one.
    /// Otherwise the item is appended with its own quantity (at least one).
    pub fn add_item(&mut self, item: CartItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }

        let quantity = item.quantity.max(1);
        self.items.push(CartItem { quantity, ..item });
    }

    /// Remove the line for a product. Does nothing if there is none.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.items.retain(|i| &i.product_id != product_id);
    }

    /// Set a line's quantity, clamping negatives to zero.
    ///
    /// A line set to zero stays in the cart; call [`Cart::remove_item`] or
    /// [`Cart::prune_empty`] to drop it. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        let clamped = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = clamped;
        }
    }

    /// Drop every line whose quantity is zero.
    pub fn prune_empty(&mut self) {
        self.items.retain(|i| i.quantity > 0);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of price times quantity over all lines, saturating at the decimal
    /// range.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all lines (badge count).
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Lines with a positive quantity, as order item inputs.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .filter(|i| i.quantity > 0)
            .map(|i| OrderLine {
                product_id: i.product_id.clone(),
                quantity: i.quantity,
                price: i.price,
            })
            .collect()
    }
}
