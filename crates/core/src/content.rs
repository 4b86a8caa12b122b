//! Blog posts, comments and product reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PostId, ProductId, ReviewId, UserId};

/// Longest comment or review body accepted.
pub const MAX_BODY_LEN: usize = 5_000;

/// Validation failures for authored content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
}

/// A blog post. `body` is markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: PostId,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub author: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin supplies when creating or replacing a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPostInput {
    pub title: String,
    /// Derived from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub body: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: String,
    #[serde(default)]
    pub published: bool,
}

impl BlogPostInput {
    /// Validate and normalise: resolves the slug and cleans tags.
    ///
    /// # Errors
    ///
    /// Returns a [`ContentError`] for missing fields or a bad slug.
    pub fn normalized(mut self) -> Result<Self, ContentError> {
        if self.title.trim().is_empty() {
            return Err(ContentError::Required("title"));
        }
        if self.body.trim().is_empty() {
            return Err(ContentError::Required("body"));
        }
        if self.author.trim().is_empty() {
            return Err(ContentError::Required("author"));
        }
        let slug = match self.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => {
                if slugify(s) != s {
                    return Err(ContentError::InvalidSlug(s.to_owned()));
                }
                s.to_owned()
            }
            _ => slugify(&self.title),
        };
        if slug.is_empty() {
            return Err(ContentError::InvalidSlug(self.title));
        }
        self.slug = Some(slug);
        self.tags = normalize_tags(&self.tags);
        Ok(self)
    }
}

/// Lowercase ASCII letters and digits joined by single hyphens.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Trim, lowercase and de-duplicate tags, keeping first-seen order.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// A comment on a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: String,
    pub rating: u8,
    pub title: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Check a comment body.
///
/// # Errors
///
/// Empty or over [`MAX_BODY_LEN`] characters.
pub fn validate_body(body: &str) -> Result<(), ContentError> {
    if body.trim().is_empty() {
        return Err(ContentError::Required("body"));
    }
    if body.chars().count() > MAX_BODY_LEN {
        return Err(ContentError::TooLong {
            field: "body",
            max: MAX_BODY_LEN,
        });
    }
    Ok(())
}

/// Check a rating is within `1..=5`.
///
/// # Errors
///
/// [`ContentError::InvalidRating`] otherwise.
pub fn validate_rating(rating: u8) -> Result<(), ContentError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ContentError::InvalidRating)
    }
}

/// Mean rating rounded to one decimal place, or `None` without reviews.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<Decimal> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some((Decimal::from(sum) / Decimal::from(reviews.len())).round_dp(1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> BlogPostInput {
        BlogPostInput {
            title: "Spring Linen: A Field Guide!".to_owned(),
            slug: None,
            excerpt: None,
            body: "# Hello".to_owned(),
            cover_image: None,
            tags: vec![" Linen ".to_owned(), "linen".to_owned(), "Guides".to_owned(), String::new()],
            author: "Marigold".to_owned(),
            published: true,
        }
    }

    fn review(rating: u8) -> Review {
        Review {
            id: ReviewId::new(1),
            product_id: ProductId::new(1),
            user_id: UserId::new(1),
            author_name: "Sam".to_owned(),
            rating,
            title: None,
            body: "Nice".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Spring Linen: A Field Guide!"), "spring-linen-a-field-guide");
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_normalized_derives_slug_and_cleans_tags() {
        let post = input().normalized().unwrap();
        assert_eq!(post.slug.as_deref(), Some("spring-linen-a-field-guide"));
        assert_eq!(post.tags, vec!["linen", "guides"]);
    }

    #[test]
    fn test_explicit_slug_must_be_clean() {
        let bad = BlogPostInput {
            slug: Some("Not A Slug".to_owned()),
            ..input()
        };
        assert!(matches!(bad.normalized(), Err(ContentError::InvalidSlug(_))));

        let good = BlogPostInput {
            slug: Some("linen-guide".to_owned()),
            ..input()
        };
        assert_eq!(good.normalized().unwrap().slug.as_deref(), Some("linen-guide"));
    }

    #[test]
    fn test_required_fields() {
        let no_body = BlogPostInput {
            body: "  ".to_owned(),
            ..input()
        };
        assert_eq!(no_body.normalized().unwrap_err(), ContentError::Required("body"));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert_eq!(validate_rating(0), Err(ContentError::InvalidRating));
        assert_eq!(validate_rating(6), Err(ContentError::InvalidRating));
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        let avg = average_rating(&[review(5), review(4), review(4)]).unwrap();
        assert_eq!(avg, Decimal::new(43, 1));
    }

    #[test]
    fn test_body_limits() {
        assert!(validate_body("ok").is_ok());
        assert!(validate_body(" ").is_err());
        assert!(validate_body(&"x".repeat(MAX_BODY_LEN + 1)).is_err());
    }
}
