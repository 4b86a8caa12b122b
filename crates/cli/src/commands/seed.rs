//! Seed the shop from a YAML file.
//!
//! ```yaml
//! settings:
//!   store_name: Marigold Goods
//!   currency: USD
//! products:
//!   - title: Linen Apron
//!     price: "38.00"
//!     category: kitchen
//!     images: [https://cdn.example.com/apron.jpg]
//!     variations:
//!       - { color: sand, stock: 12 }
//! coupons:
//!   - code: SAVE10
//!     discount_type: percentage
//!     discount_value: "10"
//!     min_purchase: "20.00"
//!     starts_at: 2026-01-01T00:00:00Z
//!     ends_at: 2026-12-31T23:59:59Z
//! posts:
//!   - title: Caring for linen
//!     body: "Wash cold, line dry."
//!     author: Marigold
//!     published: true
//! ```
//!
//! Every entry is validated before anything is written. Coupons and posts
//! whose code or slug already exists are skipped, so a file can be applied
//! more than once; products are always inserted.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use marigold_admin::db::{BlogRepository, CouponRepository, ProductRepository, SettingsRepository};
use marigold_core::catalog::ProductInput;
use marigold_core::content::BlogPostInput;
use marigold_core::coupon::CouponInput;
use marigold_storefront::db::RepositoryError;
use marigold_storefront::db::settings::keys;

use super::connect;

/// Top-level seed document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub settings: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub products: Vec<ProductInput>,
    #[serde(default)]
    pub coupons: Vec<CouponInput>,
    #[serde(default)]
    pub posts: Vec<BlogPostInput>,
}

/// Rows written by one run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub settings: usize,
    pub products: usize,
    pub coupons: usize,
    pub posts: usize,
    pub skipped: usize,
}

impl SeedFile {
    /// Parse a seed document.
    ///
    /// # Errors
    ///
    /// Returns the YAML error for malformed input.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Validate every entry, normalizing posts in place.
    ///
    /// Returns one message per problem; empty means the file is good.
    pub fn validate(&mut self) -> Vec<String> {
        let mut errors = Vec::new();

        for key in self.settings.keys() {
            if !keys::ALL.contains(&key.as_str()) {
                errors.push(format!("settings: unknown key {key}"));
            }
        }
        for (i, product) in self.products.iter().enumerate() {
            if let Err(e) = product.validate() {
                errors.push(format!("products[{i}] ({}): {e}", product.title));
            }
        }
        for (i, coupon) in self.coupons.iter().enumerate() {
            if let Err(e) = coupon.validate() {
                errors.push(format!("coupons[{i}] ({}): {e}", coupon.code));
            }
        }

        let mut posts = Vec::with_capacity(self.posts.len());
        for (i, post) in std::mem::take(&mut self.posts).into_iter().enumerate() {
            let title = post.title.clone();
            match post.normalized() {
                Ok(post) => posts.push(post),
                Err(e) => errors.push(format!("posts[{i}] ({title}): {e}")),
            }
        }
        self.posts = posts;

        errors
    }
}

/// Load, validate and apply a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let mut seed = SeedFile::parse(&content)?;

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }
    info!(
        products = seed.products.len(),
        coupons = seed.coupons.len(),
        posts = seed.posts.len(),
        "Seed file validated"
    );

    let pool = connect().await?;
    let mut report = SeedReport::default();

    let settings = SettingsRepository::new(&pool);
    for (key, value) in &seed.settings {
        settings.set(key, value).await?;
        report.settings += 1;
    }

    let products = ProductRepository::new(&pool);
    for input in &seed.products {
        products.create(input).await?;
        report.products += 1;
    }

    let coupons = CouponRepository::new(&pool);
    for input in &seed.coupons {
        match coupons.create(input).await {
            Ok(_) => report.coupons += 1,
            Err(RepositoryError::Conflict(_)) => {
                warn!(code = %input.code, "Coupon exists, skipping");
                report.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let posts = BlogRepository::new(&pool);
    for input in &seed.posts {
        match posts.create(input).await {
            Ok(_) => report.posts += 1,
            Err(RepositoryError::Conflict(_)) => {
                warn!(title = %input.title, "Post slug exists, skipping");
                report.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeding complete!");
    info!("  Settings written: {}", report.settings);
    info!("  Products inserted: {}", report.products);
    info!("  Coupons inserted: {}", report.coupons);
    info!("  Posts inserted: {}", report.posts);
    info!("  Skipped (already exist): {}", report.skipped);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
settings:
  store_name: Marigold Goods
products:
  - title: Linen Apron
    price: "38.00"
    category: kitchen
    variations:
      - { color: sand, stock: 12 }
coupons:
  - code: save10
    discount_type: percentage
    discount_value: "10"
    min_purchase: "20.00"
    starts_at: 2026-01-01T00:00:00Z
    ends_at: 2026-12-31T23:59:59Z
posts:
  - title: Caring for Linen
    body: Wash cold, line dry.
    author: Marigold
    tags: [Care, care]
"#;

    #[test]
    fn test_parse_and_validate_sample() {
        let mut seed = SeedFile::parse(SAMPLE).unwrap();
        assert!(seed.validate().is_empty());

        assert_eq!(seed.products.len(), 1);
        assert_eq!(seed.coupons[0].usage_limit, None);
        assert!(seed.coupons[0].active);
        assert_eq!(seed.posts[0].slug.as_deref(), Some("caring-for-linen"));
        assert_eq!(seed.posts[0].tags, vec!["care".to_owned()]);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut seed = SeedFile::parse(
            r#"
settings:
  theme: dark
products:
  - title: ""
    price: "5.00"
    category: misc
posts:
  - title: Draft
    body: ""
    author: Marigold
"#,
        )
        .unwrap();

        let errors = seed.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].starts_with("settings"));
        assert!(errors[1].starts_with("products[0]"));
        assert!(errors[2].starts_with("posts[0]"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(SeedFile::parse("customers: []").is_err());
    }
}
