//! Sales aggregates over a set of orders.
//!
//! Everything here is a fold over orders the caller already fetched.
//! Cancelled orders are counted per status but never contribute revenue,
//! product sales or coupon usage.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::order::Order;
use crate::types::{Money, OrderStatus, ProductId};

/// Units and revenue for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub revenue: Money,
}

/// Redemptions and total discount for one coupon code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponUsage {
    pub code: String,
    pub orders: u32,
    pub discount: Money,
}

/// The dashboard summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub revenue: Money,
    /// Orders that count toward revenue.
    pub order_count: u32,
    pub average_order_value: Money,
    pub revenue_by_date: BTreeMap<NaiveDate, Money>,
    pub status_counts: BTreeMap<String, u32>,
    pub top_products: Vec<ProductSales>,
    pub coupon_usage: Vec<CouponUsage>,
}

/// Sum of totals over orders that count toward revenue.
#[must_use]
pub fn total_revenue(orders: &[Order]) -> Money {
    revenue_orders(orders).map(|o| o.total_amount).sum()
}

/// Revenue divided by the number of revenue orders, or zero.
#[must_use]
pub fn average_order_value(orders: &[Order]) -> Money {
    let count = revenue_orders(orders).count();
    if count == 0 {
        return Money::ZERO;
    }
    Money::new(total_revenue(orders).amount() / rust_decimal::Decimal::from(count))
}

/// Revenue grouped by the UTC calendar date each order was placed.
#[must_use]
pub fn revenue_by_date(orders: &[Order]) -> BTreeMap<NaiveDate, Money> {
    let mut by_date = BTreeMap::new();
    for order in revenue_orders(orders) {
        *by_date.entry(order.created_at.date_naive()).or_insert(Money::ZERO) += order.total_amount;
    }
    by_date
}

/// Order count per status. Every status appears, zero or not.
#[must_use]
pub fn status_counts(orders: &[Order]) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = OrderStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_owned(), 0))
        .collect();
    for order in orders {
        *counts.entry(order.status.as_str().to_owned()).or_insert(0) += 1;
    }
    counts
}

/// Best sellers by units sold, ties broken by revenue then title.
#[must_use]
pub fn top_products(orders: &[Order], limit: usize) -> Vec<ProductSales> {
    let mut by_product: HashMap<ProductId, ProductSales> = HashMap::new();
    for item in revenue_orders(orders).flat_map(|o| o.items.iter()) {
        let entry = by_product.entry(item.product_id).or_insert_with(|| ProductSales {
            product_id: item.product_id,
            title: item.title.clone(),
            quantity: 0,
            revenue: Money::ZERO,
        });
        entry.quantity = entry.quantity.saturating_add(item.quantity);
        entry.revenue += item.line_total();
    }
    let mut sales: Vec<ProductSales> = by_product.into_values().collect();
    sales.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue.cmp(&a.revenue))
            .then_with(|| a.title.cmp(&b.title))
    });
    sales.truncate(limit);
    sales
}

/// Redemptions per coupon code, most used first.
#[must_use]
pub fn coupon_usage(orders: &[Order]) -> Vec<CouponUsage> {
    let mut by_code: BTreeMap<&str, CouponUsage> = BTreeMap::new();
    for order in revenue_orders(orders) {
        let Some(code) = order.coupon_code.as_deref() else {
            continue;
        };
        let entry = by_code.entry(code).or_insert_with(|| CouponUsage {
            code: code.to_owned(),
            orders: 0,
            discount: Money::ZERO,
        });
        entry.orders += 1;
        entry.discount += order.discount_amount;
    }
    let mut usage: Vec<CouponUsage> = by_code.into_values().collect();
    usage.sort_by(|a, b| b.orders.cmp(&a.orders).then_with(|| a.code.cmp(&b.code)));
    usage
}

/// All aggregates at once.
#[must_use]
pub fn summarize(orders: &[Order], top_n: usize) -> SalesSummary {
    SalesSummary {
        revenue: total_revenue(orders),
        order_count: u32::try_from(revenue_orders(orders).count()).unwrap_or(u32::MAX),
        average_order_value: average_order_value(orders),
        revenue_by_date: revenue_by_date(orders),
        status_counts: status_counts(orders),
        top_products: top_products(orders, top_n),
        coupon_usage: coupon_usage(orders),
    }
}

fn revenue_orders(orders: &[Order]) -> impl Iterator<Item = &Order> {
    orders.iter().filter(|o| o.status.counts_as_revenue())
}
