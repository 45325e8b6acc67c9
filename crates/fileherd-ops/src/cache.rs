//! Directory listing cache notifications.

use std::path::Path;

use crate::engine::BoxFuture;

/// A cache of directory listings shown to the user.
///
/// Told about each item a delete removed, one item at a time. Implementations
/// handle their own synchronization.
pub trait ListingCache: Send + Sync {
    /// Forget the entry at `path`.
    fn remove_item<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, ()>;
}
