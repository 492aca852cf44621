// Review page: record loading, per-page display state, object URLs.
// Page and registry locks are std mutexes; never hold one across an await.

pub mod handlers;
pub mod loader;
pub mod object_url;
pub mod page;
pub mod viewers;

use std::sync::{Mutex, MutexGuard};

pub use loader::LoadFault;
pub use object_url::ObjectUrls;
pub use page::{PageStatus, PageView};
pub use viewers::ViewerPages;

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
