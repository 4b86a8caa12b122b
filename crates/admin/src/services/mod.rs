//! Business logic services for admin.

pub mod media;
pub mod notifier;

pub use media::{MediaError, MediaStore, StoredMedia};
pub use notifier::OrderNotifier;
