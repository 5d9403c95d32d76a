//! Order submission and the fulfillment state machine.
//!
//! Submission trusts the client's unit prices and total; product ids and stock
//! are not checked. Setting `STOREFRONT_VERIFY_ORDER_TOTALS` makes a total that
//! differs from the items a validation error instead of a warning.
//!
//! Status updates overwrite the order's owner with the acting shopkeeper. The
//! transition table applies unless the legacy policy is configured.

use std::sync::Arc;

use tracing::instrument;

use bazaar_core::{
    OrderId, OrderLine, OrderStatus, PaymentMethod, Price, ProductId, SellerStats, ShopkeeperId,
    TransitionPolicy,
};

use super::{ServiceError, required_text};
use crate::db::{CatalogStore, OrderStore, RepositoryError};
use crate::models::order::{
    NewOrder, Order, OrderItemRequest, OrderWithProducts, OwnershipTransfer, SubmitOrderRequest,
    UpdateStatusRequest,
};

/// Order workflow service.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    policy: TransitionPolicy,
    verify_totals: bool,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
        policy: TransitionPolicy,
        verify_totals: bool,
    ) -> Self {
        Self {
            orders,
            catalog,
            policy,
            verify_totals,
        }
    }

    /// Validate and persist a new order with its items.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for missing or malformed input (nothing
    /// is stored), or `ServiceError::Persistence` if the store fails.
    #[instrument(skip(self, request), fields(items = request.order_items.len()))]
    pub async fn submit(&self, request: SubmitOrderRequest) -> Result<Order, ServiceError> {
        let mut order = validate_order(request)?;

        let computed = items_total(&order.items)?;
        if computed != order.total_amount {
            if self.verify_totals {
                return Err(ServiceError::validation(format!(
                    "totalAmount {} does not match items total {computed}",
                    order.total_amount
                )));
            }
            tracing::warn!(
                submitted = %order.total_amount,
                computed = %computed,
                "Order total does not match its items"
            );
        }

        order.shopkeeper_id = self.single_owner(&order.items).await?;

        let created = self.orders.insert_order(order).await?;
        tracing::info!(
            order_id = %created.id,
            shopkeeper_id = ?created.shopkeeper_id,
            total = %created.total_amount.display(),
            "Order created"
        );

        Ok(created)
    }

    /// Fetch an order with product snapshots.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown id.
    pub async fn get(&self, id: &OrderId) -> Result<OrderWithProducts, ServiceError> {
        self.orders
            .get_order(id)
            .await?
            .ok_or(ServiceError::NotFound("Order"))
    }

    /// Move an order to a new status on behalf of a shopkeeper.
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidStatus` if the status is not a known one
    /// - `ServiceError::Validation` if the acting shopkeeper is missing
    /// - `ServiceError::NotFound` if the order does not exist
    /// - `ServiceError::InvalidTransition` if the policy forbids the change
    #[instrument(skip(self, request), fields(order_id = %id))]
    pub async fn update_status(
        &self,
        id: &OrderId,
        request: UpdateStatusRequest,
    ) -> Result<OrderWithProducts, ServiceError> {
        let status: OrderStatus = request.status.as_deref().unwrap_or_default().parse()?;
        let shopkeeper_id =
            ShopkeeperId::new(required_text(request.shopkeeper_id.as_deref(), "shopkeeperId")?);

        // Early refusal; the store re-checks against the locked row
        let current = self.get(id).await?;
        if !self.policy.permits(current.status, status) {
            return Err(ServiceError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = self
            .orders
            .set_status(id, status, &shopkeeper_id, self.policy)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::NotFound("Order"),
                RepositoryError::StatusConflict { current } => ServiceError::InvalidTransition {
                    from: current,
                    to: status,
                },
                other => other.into(),
            })?;

        tracing::info!(
            from = %current.status,
            to = %status,
            shopkeeper_id = %shopkeeper_id,
            "Order status updated"
        );

        Ok(updated)
    }

    /// Orders owned by a shopkeeper, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if the store fails.
    pub async fn list_for_shopkeeper(
        &self,
        shopkeeper_id: &ShopkeeperId,
    ) -> Result<Vec<OrderWithProducts>, ServiceError> {
        Ok(self.orders.list_for_shopkeeper(shopkeeper_id).await?)
    }

    /// Dashboard figures for a shopkeeper.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if the store fails.
    pub async fn stats(&self, shopkeeper_id: &ShopkeeperId) -> Result<SellerStats, ServiceError> {
        let orders = self.orders.list_for_shopkeeper(shopkeeper_id).await?;
        let total_products = self.catalog.count_products(shopkeeper_id).await?;

        Ok(SellerStats::from_orders(
            orders.iter().map(|o| (o.status, o.total_amount)),
            total_products,
        ))
    }

    /// Owner changes recorded for an order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown order.
    pub async fn ownership_transfers(
        &self,
        id: &OrderId,
    ) -> Result<Vec<OwnershipTransfer>, ServiceError> {
        self.get(id).await?;
        Ok(self.orders.ownership_transfers(id).await?)
    }

    /// The shopkeeper owning every item's product, if there is exactly one.
    async fn single_owner(
        &self,
        lines: &[OrderLine],
    ) -> Result<Option<ShopkeeperId>, ServiceError> {
        let mut ids: Vec<ProductId> = lines.iter().map(|l| l.product_id.clone()).collect();
        ids.sort();
        ids.dedup();

        let products = self.catalog.get_products(&ids).await?;
        if products.len() != ids.len() {
            return Ok(None);
        }

        let mut owners = products.into_iter().map(|p| p.shopkeeper_id);
        let first = owners.next();
        Ok(first.filter(|owner| owners.all(|o| &o == owner)))
    }
}

/// Check a submitted order and turn it into a storable one.
fn validate_order(request: SubmitOrderRequest) -> Result<NewOrder, ServiceError> {
    let buyer_name = required_text(request.buyer_name.as_deref(), "buyerName")?;
    let buyer_phone = required_text(request.buyer_phone.as_deref(), "buyerPhone")?;
    let buyer_address = required_text(request.buyer_address.as_deref(), "buyerAddress")?;

    if request.order_items.is_empty() {
        return Err(ServiceError::validation("orderItems must not be empty"));
    }

    let total_amount = request
        .total_amount
        .ok_or_else(|| ServiceError::validation("totalAmount is required"))?;
    if total_amount.is_negative() {
        return Err(ServiceError::validation("totalAmount must not be negative"));
    }

    let payment_method = match non_blank(request.payment_method.as_deref()) {
        Some(method) => method
            .parse::<PaymentMethod>()
            .map_err(ServiceError::Validation)?,
        None => PaymentMethod::default(),
    };

    let status = match non_blank(request.status.as_deref()) {
        Some(status) => status
            .parse::<OrderStatus>()
            .map_err(|e| ServiceError::validation(e.to_string()))?,
        None => OrderStatus::default(),
    };

    let items = request
        .order_items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_line(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewOrder {
        buyer_name,
        buyer_phone,
        buyer_address,
        total_amount,
        payment_method,
        status,
        shopkeeper_id: None,
        items,
    })
}

fn validate_line(index: usize, item: &OrderItemRequest) -> Result<OrderLine, ServiceError> {
    let product_id = required_text(
        item.product_id.as_deref(),
        &format!("orderItems[{index}].productId"),
    )?;

    let quantity = item
        .quantity
        .filter(|q| *q > 0)
        .and_then(|q| u32::try_from(q).ok())
        .ok_or_else(|| {
            ServiceError::validation(format!("orderItems[{index}].quantity must be positive"))
        })?;

    let price = item
        .price
        .ok_or_else(|| ServiceError::validation(format!("orderItems[{index}].price is required")))?;
    if price.is_negative() {
        return Err(ServiceError::validation(format!(
            "orderItems[{index}].price must not be negative"
        )));
    }

    Ok(OrderLine {
        product_id: ProductId::new(product_id),
        quantity,
        price,
    })
}

/// Sum of price times quantity over the lines.
fn items_total(items: &[OrderLine]) -> Result<Price, ServiceError> {
    items
        .iter()
        .enumerate()
        .try_fold(Price::ZERO, |total, (index, line)| {
            line.price
                .checked_times(line.quantity)
                .ok_or_else(|| {
                    ServiceError::validation(format!("orderItems[{index}] total out of range"))
                })?
                .checked_add(total)
                .ok_or_else(|| ServiceError::validation("orderItems total out of range"))
        })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
