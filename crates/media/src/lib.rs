//! External image storage for CampusSwap listings.
//!
//! Listing images live on a third-party CDN; this crate owns the upload
//! seam. The [`ImageStore`] trait is object-safe so the server can inject
//! any implementation: the HTTP store in production, the in-memory store in
//! tests, or the disabled store when no endpoint is configured.

pub mod error;
pub mod store;

pub use error::MediaError;
pub use store::{DisabledImageStore, HttpImageStore, ImageStore, MemoryImageStore, StoredImage};
