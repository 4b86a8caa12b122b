//! Products and their color/size variations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductId};

/// Errors raised when a product or variation cannot satisfy a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The product has variations but none matches the requested color/size.
    #[error("no variation of product {product} matches color {color:?} / size {size:?}")]
    UnknownVariation {
        product: ProductId,
        color: Option<String>,
        size: Option<String>,
    },
    /// The requested quantity exceeds the variation's stock.
    #[error("only {available} left in stock")]
    OutOfStock { available: u32 },
    /// More units of one line than a single order may carry.
    #[error("at most {max} of an item per order")]
    QuantityTooLarge { max: u32 },
    /// Product input failed validation.
    #[error("invalid product: {0}")]
    Invalid(String),
}

/// Upper bound on the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Refuse quantities above [`MAX_LINE_QUANTITY`].
///
/// # Errors
///
/// Returns [`CatalogError::QuantityTooLarge`].
pub const fn ensure_quantity_allowed(quantity: u32) -> Result<(), CatalogError> {
    if quantity > MAX_LINE_QUANTITY {
        Err(CatalogError::QuantityTooLarge {
            max: MAX_LINE_QUANTITY,
        })
    } else {
        Ok(())
    }
}

/// A color/size combination of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    /// Units on hand; `None` means untracked.
    #[serde(default)]
    pub stock: Option<u32>,
    /// Added to the product's base price (may be negative).
    #[serde(default)]
    pub price_adjustment: Money,
}

impl Variation {
    fn matches(&self, color: Option<&str>, size: Option<&str>) -> bool {
        self.color.as_deref() == color && self.size.as_deref() == size
    }
}

/// A product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub images: Vec<String>,
    pub category: String,
    pub variations: Vec<Variation>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The primary (first) image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Find the variation for a color/size pair.
    ///
    /// Products without variations accept only `(None, None)`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownVariation`] when nothing matches.
    pub fn variation(
        &self,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Result<Option<&Variation>, CatalogError> {
        if self.variations.is_empty() && color.is_none() && size.is_none() {
            return Ok(None);
        }
        self.variations
            .iter()
            .find(|v| v.matches(color, size))
            .map(Some)
            .ok_or_else(|| CatalogError::UnknownVariation {
                product: self.id,
                color: color.map(str::to_owned),
                size: size.map(str::to_owned),
            })
    }

    /// Base price plus the matching variation's adjustment, floored at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownVariation`] when nothing matches.
    pub fn unit_price(&self, color: Option<&str>, size: Option<&str>) -> Result<Money, CatalogError> {
        let adjustment = self
            .variation(color, size)?
            .map_or(Money::ZERO, |v| v.price_adjustment);
        let price = self.price + adjustment;
        Ok(if price.is_negative() { Money::ZERO } else { price })
    }

    /// Check that `quantity` units of a variation are available.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::OutOfStock`] when the variation tracks stock and
    /// has fewer units, [`CatalogError::QuantityTooLarge`] above
    /// [`MAX_LINE_QUANTITY`], or [`CatalogError::UnknownVariation`].
    pub fn ensure_in_stock(
        &self,
        color: Option<&str>,
        size: Option<&str>,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        ensure_quantity_allowed(quantity)?;
        match self.variation(color, size)?.and_then(|v| v.stock) {
            Some(available) if available < quantity => Err(CatalogError::OutOfStock { available }),
            _ => Ok(()),
        }
    }
}

/// Fields an admin supplies when creating or replacing a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub variations: Vec<Variation>,
    #[serde(default)]
    pub featured: bool,
}

impl ProductInput {
    /// Basic shape validation.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::Invalid("title is required".to_owned()));
        }
        if self.category.trim().is_empty() {
            return Err(CatalogError::Invalid("category is required".to_owned()));
        }
        if self.price.is_negative() {
            return Err(CatalogError::Invalid("price cannot be negative".to_owned()));
        }
        for (i, a) in self.variations.iter().enumerate() {
            if self
                .variations
                .iter()
                .skip(i + 1)
                .any(|b| b.color == a.color && b.size == a.size)
            {
                return Err(CatalogError::Invalid(format!(
                    "duplicate variation {:?}/{:?}",
                    a.color, a.size
                )));
            }
        }
        Ok(())
    }
}

/// Sort orders offered by product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Title,
}

/// Filters for product listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    /// Case-insensitive substring of the title.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<ProductSort>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Default page size.
    pub const DEFAULT_LIMIT: u32 = 48;
    /// Largest page a client may request.
    pub const MAX_LIMIT: u32 = 200;

    /// The effective limit, clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Trimmed, non-empty search term.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tee() -> Product {
        Product {
            id: ProductId::new(1),
            title: "Linen Tee".to_owned(),
            description: "Soft".to_owned(),
            price: Money::from_cents(2000),
            images: vec!["/media/tee.jpg".to_owned()],
            category: "shirts".to_owned(),
            variations: vec![
                Variation {
                    color: Some("white".to_owned()),
                    size: Some("M".to_owned()),
                    stock: Some(3),
                    price_adjustment: Money::ZERO,
                },
                Variation {
                    color: Some("white".to_owned()),
                    size: Some("XL".to_owned()),
                    stock: None,
                    price_adjustment: Money::from_cents(250),
                },
            ],
            featured: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unit_price_applies_adjustment() {
        let p = tee();
        assert_eq!(p.unit_price(Some("white"), Some("M")).unwrap(), Money::from_cents(2000));
        assert_eq!(p.unit_price(Some("white"), Some("XL")).unwrap(), Money::from_cents(2250));
    }

    #[test]
    fn test_unknown_variation() {
        let p = tee();
        assert!(matches!(
            p.unit_price(Some("black"), Some("M")),
            Err(CatalogError::UnknownVariation { .. })
        ));
        assert!(p.unit_price(None, None).is_err());
    }

    #[test]
    fn test_plain_product_accepts_no_variant() {
        let mut p = tee();
        p.variations.clear();
        assert_eq!(p.unit_price(None, None).unwrap(), p.price);
        assert!(p.unit_price(Some("red"), None).is_err());
    }

    #[test]
    fn test_stock_check() {
        let p = tee();
        assert!(p.ensure_in_stock(Some("white"), Some("M"), 3).is_ok());
        assert_eq!(
            p.ensure_in_stock(Some("white"), Some("M"), 4),
            Err(CatalogError::OutOfStock { available: 3 })
        );
        assert!(p.ensure_in_stock(Some("white"), Some("XL"), 99).is_ok());
    }

    #[test]
    fn test_untracked_stock_still_capped() {
        let p = tee();
        assert_eq!(
            p.ensure_in_stock(Some("white"), Some("XL"), 500),
            Err(CatalogError::QuantityTooLarge { max: 99 })
        );
        assert!(ensure_quantity_allowed(MAX_LINE_QUANTITY).is_ok());
        assert!(ensure_quantity_allowed(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_input_validation() {
        let input = ProductInput {
            title: " ".to_owned(),
            description: String::new(),
            price: Money::from_cents(100),
            images: vec![],
            category: "hats".to_owned(),
            variations: vec![],
            featured: false,
        };
        assert!(input.validate().is_err());

        let dup = Variation {
            color: Some("red".to_owned()),
            size: None,
            stock: None,
            price_adjustment: Money::ZERO,
        };
        let input = ProductInput {
            title: "Cap".to_owned(),
            variations: vec![dup.clone(), dup],
            ..input
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_query_limit_clamped() {
        let q = ProductQuery {
            limit: Some(10_000),
            ..ProductQuery::default()
        };
        assert_eq!(q.effective_limit(), ProductQuery::MAX_LIMIT);
        assert_eq!(ProductQuery::default().effective_limit(), 48);
    }
}
