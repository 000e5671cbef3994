//! The remote-store contract consumed by the cache controller.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;

/// Delivered for every authoritative value pushed through a subscription.
pub type DataCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// Delivered when the subscription channel fails.
pub type ErrorCallback = Arc<dyn Fn(RemoteError) + Send + Sync>;

/// One-shot closure closing a remote subscription.
pub type RemoteUnsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// A remote real-time document database reachable by path.
///
/// Subscription registration is synchronous; the store may deliver the
/// current value to `on_data` before `subscribe` returns. Writes are
/// asynchronous, and an accepted write is echoed back through every open
/// subscription for the path — the cache treats that echo, not the write
/// call, as the source of truth for the read path.
///
/// Retry and backoff are the implementation's responsibility; the cache
/// layers no retries of its own on top.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// Open a subscription for `path`. The returned closure closes it.
    fn subscribe(
        &self,
        path: &str,
        on_data: DataCallback,
        on_error: ErrorCallback,
    ) -> RemoteUnsubscribe;

    /// Write `value` wholesale to `path`.
    async fn write(&self, path: &str, value: Value) -> Result<(), RemoteError>;
}
