//! Seller dashboard figures.

use serde::{Deserialize, Serialize};

use crate::types::{OrderStatus, Price};

/// Headline numbers for a seller's dashboard.
///
/// Revenue only counts delivered orders, since payment is cash on delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub confirmed_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    pub rejected_orders: u64,
    pub total_products: u64,
    pub total_revenue: Price,
}

impl SellerStats {
    /// Tally a seller's orders given as `(status, total)` pairs.
    #[must_use]
    pub fn from_orders<I>(orders: I, total_products: u64) -> Self
    where
        I: IntoIterator<Item = (OrderStatus, Price)>,
    {
        let mut stats = Self {
            total_products,
            ..Self::default()
        };

        for (status, total) in orders {
            stats.total_orders += 1;
            match status {
                OrderStatus::Pending => stats.pending_orders += 1,
                OrderStatus::Confirmed => stats.confirmed_orders += 1,
                OrderStatus::Delivered => {
                    stats.delivered_orders += 1;
                    stats.total_revenue = stats.total_revenue + total;
                }
                OrderStatus::Cancelled => stats.cancelled_orders += 1,
                OrderStatus::Rejected => stats.rejected_orders += 1,
            }
        }

        stats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_revenue_counts_delivered_only() {
        let orders = [
            (OrderStatus::Delivered, Price::from_units(1500)),
            (OrderStatus::Pending, Price::from_units(900)),
            (OrderStatus::Delivered, Price::from_units(2500)),
            (OrderStatus::Cancelled, Price::from_units(4000)),
            (OrderStatus::Confirmed, Price::from_units(100)),
        ];

        let stats = SellerStats::from_orders(orders, 7);

        assert_eq!(stats.total_orders, 5);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.confirmed_orders, 1);
        assert_eq!(stats.delivered_orders, 2);
        assert_eq!(stats.cancelled_orders, 1);
        assert_eq!(stats.rejected_orders, 0);
        assert_eq!(stats.total_products, 7);
        assert_eq!(stats.total_revenue, Price::from_units(4000));
    }

    #[test]
    fn test_no_orders() {
        let stats = SellerStats::from_orders([], 0);
        assert_eq!(stats, SellerStats::default());
    }

    #[test]
    fn test_json_field_names() {
        let stats = SellerStats::from_orders([(OrderStatus::Delivered, Price::from_units(10))], 1);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalOrders"], 1);
        assert_eq!(json["totalProducts"], 1);
        assert_eq!(json["deliveredOrders"], 1);
        assert_eq!(json["totalRevenue"].as_f64(), Some(10.0));
    }
}
