//! Buyer-side navigation state.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// The screen the buyer is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Home,
    Cart,
    ProductDetail,
    AddProduct,
    Checkout,
}

/// Current view plus the product being looked at, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub current_view: View,
    pub selected_product_id: Option<ProductId>,
}

impl ViewState {
    /// Switch screens. Any selected product is forgotten.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.selected_product_id = None;
    }

    /// Open the detail screen for a product.
    pub fn go_to_product_detail(&mut self, product_id: ProductId) {
        self.current_view = View::ProductDetail;
        self.selected_product_id = Some(product_id);
    }

    /// Change the selected product without changing the screen.
    pub fn set_selected_product(&mut self, product_id: Option<ProductId>) {
        self.selected_product_id = product_id;
    }
}
