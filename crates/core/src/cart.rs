//! The cart reducer.
//!
//! A cart is an ordered list of line items plus a derived total. Every
//! transition goes through [`Cart::apply`] and recomputes the total as
//! `Σ price × quantity`, so the two can never drift apart.
//!
//! Rows are unique on `(product_id, color, size)`. Note the asymmetry kept
//! from the storefront's behaviour: [`CartAction::Add`] matches on the full
//! key, while [`CartAction::Remove`] and [`CartAction::UpdateQuantity`] match
//! on the product id alone and therefore affect every variant of a product.
//! [`CartAction::RemoveVariant`] removes exactly one row.

use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductId};

/// Identity of a cart row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartKey {
    pub product_id: ProductId,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// One product entry in the cart, with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl CartItem {
    /// The row identity.
    #[must_use]
    pub fn key(&self) -> CartKey {
        CartKey {
            product_id: self.product_id,
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }

    fn has_key(&self, key: &CartKey) -> bool {
        self.product_id == key.product_id && self.color == key.color && self.size == key.size
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// A cart transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    /// Merge into the row with the same key, or append.
    Add(CartItem),
    /// Drop every row for a product, whatever its variant.
    Remove { product_id: ProductId },
    /// Drop the single row with this key.
    RemoveVariant(CartKey),
    /// Set the quantity of every row for a product. Not clamped.
    UpdateQuantity { product_id: ProductId, quantity: u32 },
    /// Empty the cart.
    Clear,
}

/// The cart state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
    total: Money,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transition and recompute the total.
    pub fn apply(&mut self, action: CartAction) -> &mut Self {
        match action {
            CartAction::Add(item) => {
                let key = item.key();
                if let Some(existing) = self.items.iter_mut().find(|i| i.has_key(&key)) {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                } else {
                    self.items.push(item);
                }
            }
            CartAction::Remove { product_id } => {
                self.items.retain(|i| i.product_id != product_id);
            }
            CartAction::RemoveVariant(key) => {
                self.items.retain(|i| !i.has_key(&key));
            }
            CartAction::UpdateQuantity {
                product_id,
                quantity,
            } => {
                for item in self.items.iter_mut().filter(|i| i.product_id == product_id) {
                    item.quantity = quantity;
                }
            }
            CartAction::Clear => self.items.clear(),
        }
        self.recompute();
        self
    }

    /// Shorthand for [`CartAction::Add`].
    pub fn add(&mut self, item: CartItem) -> &mut Self {
        self.apply(CartAction::Add(item))
    }

    /// Shorthand for [`CartAction::Remove`].
    pub fn remove(&mut self, product_id: ProductId) -> &mut Self {
        self.apply(CartAction::Remove { product_id })
    }

    /// Shorthand for [`CartAction::UpdateQuantity`].
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> &mut Self {
        self.apply(CartAction::UpdateQuantity {
            product_id,
            quantity,
        })
    }

    /// Shorthand for [`CartAction::Clear`].
    pub fn clear(&mut self) -> &mut Self {
        self.apply(CartAction::Clear)
    }

    fn recompute(&mut self) {
        self.total = self.items.iter().map(CartItem::line_total).sum();
    }

    /// Rows in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Every row (variant) of a product.
    pub fn rows_for(&self, product_id: ProductId) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(move |i| i.product_id == product_id)
    }

    /// `Σ price × quantity` over all rows.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    /// Total units across rows.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when there is nothing to pay for: no rows, or every row at zero quantity.
    #[must_use]
    pub fn is_checkout_empty(&self) -> bool {
        self.item_count() == 0
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        let mut cart = Self {
            items,
            total: Money::ZERO,
        };
        cart.recompute();
        cart
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, cents: i64, qty: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Money::from_cents(cents),
            image: None,
            quantity: qty,
            color: None,
            size: None,
        }
    }

    fn variant(id: i32, cents: i64, qty: u32, color: &str, size: &str) -> CartItem {
        CartItem {
            color: Some(color.to_owned()),
            size: Some(size.to_owned()),
            ..item(id, cents, qty)
        }
    }

    #[test]
    fn test_reference_walkthrough() {
        let a = ProductId::new(1);
        let b = ProductId::new(2);
        let mut cart = Cart::new();
        cart.add(item(1, 1000, 2)).add(item(2, 500, 1));
        assert_eq!(cart.total(), Money::from_cents(2500));

        cart.update_quantity(a, 3);
        assert_eq!(cart.total(), Money::from_cents(3500));

        cart.remove(b);
        assert_eq!(cart.total(), Money::from_cents(3000));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = Cart::new();
        cart.add(variant(1, 1000, 1, "red", "M"))
            .add(variant(1, 1000, 2, "red", "M"));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), Money::from_cents(3000));
    }

    #[test]
    fn test_add_different_variant_appends() {
        let mut cart = Cart::new();
        cart.add(variant(1, 1000, 1, "red", "M"))
            .add(variant(1, 1000, 1, "red", "L"))
            .add(variant(1, 1000, 1, "blue", "M"));
        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_remove_drops_every_variant_of_a_product() {
        let mut cart = Cart::new();
        cart.add(variant(1, 1000, 1, "red", "M"))
            .add(variant(1, 1200, 1, "red", "L"))
            .add(item(2, 300, 1));
        cart.remove(ProductId::new(1));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Money::from_cents(300));
    }

    #[test]
    fn test_remove_variant_drops_one_row() {
        let mut cart = Cart::new();
        cart.add(variant(1, 1000, 1, "red", "M"))
            .add(variant(1, 1200, 1, "red", "L"));
        cart.apply(CartAction::RemoveVariant(CartKey {
            product_id: ProductId::new(1),
            color: Some("red".to_owned()),
            size: Some("M".to_owned()),
        }));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Money::from_cents(1200));
    }

    #[test]
    fn test_update_quantity_is_not_clamped() {
        let mut cart = Cart::new();
        cart.add(item(1, 1000, 2));
        cart.update_quantity(ProductId::new(1), 0);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Money::ZERO);
        assert!(cart.is_checkout_empty());
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(item(1, 1000, 2)).clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::ZERO);
    }

    #[test]
    fn test_total_invariant_holds_after_every_action() {
        let actions = vec![
            CartAction::Add(item(1, 999, 3)),
            CartAction::Add(variant(2, 1450, 1, "green", "S")),
            CartAction::Add(item(1, 999, 1)),
            CartAction::UpdateQuantity {
                product_id: ProductId::new(2),
                quantity: 4,
            },
            CartAction::Remove {
                product_id: ProductId::new(1),
            },
            CartAction::Add(item(3, 5, 7)),
            CartAction::Clear,
        ];
        let mut cart = Cart::new();
        for action in actions {
            cart.apply(action);
            let expected: Money = cart.items().iter().map(|i| i.price * i.quantity).sum();
            assert_eq!(cart.total(), expected);
        }
    }

    #[test]
    fn test_deserialize_recomputes_total() {
        let mut cart = Cart::new();
        cart.add(item(1, 1000, 2)).add(item(2, 500, 1));
        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.total(), Money::from_cents(2500));
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_rows_for_lists_every_variant() {
        let mut cart = Cart::new();
        cart.add(variant(2, 1450, 1, "green", "S"))
            .add(item(1, 999, 1))
            .add(variant(2, 1450, 2, "green", "M"));
        let sizes: Vec<_> = cart
            .rows_for(ProductId::new(2))
            .map(|i| i.size.as_deref())
            .collect();
        assert_eq!(sizes, vec![Some("S"), Some("M")]);
        assert_eq!(cart.rows_for(ProductId::new(9)).count(), 0);
    }
}
