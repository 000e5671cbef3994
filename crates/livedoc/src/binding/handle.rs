//! DocBinding — the per-document consumer surface.
//!
//! The shape a reactive framework's external-store adapter consumes:
//! `subscribe(callback) -> unsubscribe`, a synchronous `snapshot()`, and the
//! `loading`/`error` side channels. A binding is cheap to clone and carries
//! its own initial value, so every consumer of the same key reads the same
//! stable snapshots without threading defaults around.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::CacheController;
use crate::error::{RemoteError, WriteError};
use crate::types::{DocKey, DocPhase, DocWrite, Unsubscribe};

/// Handle binding one consumer-facing document to the shared cache.
#[derive(Clone)]
pub struct DocBinding {
    controller: Arc<CacheController>,
    key: DocKey,
    initial: Arc<Value>,
}

impl DocBinding {
    pub fn new(controller: Arc<CacheController>, key: DocKey, initial: Value) -> Self {
        Self {
            controller,
            key,
            initial: Arc::new(initial),
        }
    }

    pub fn key(&self) -> &DocKey {
        &self.key
    }

    /// Register interest; `notify` is pinged on every change for the key.
    pub fn subscribe(&self, notify: impl Fn() + Send + Sync + 'static) -> Unsubscribe {
        self.controller
            .subscribe_doc(&self.key, Arc::clone(&self.initial), notify)
    }

    /// Tear-free synchronous read. Returns the binding's initial value until
    /// an entry exists; thereafter the identical `Arc` until a genuine update.
    pub fn snapshot(&self) -> Arc<Value> {
        self.controller.get_doc_data(&self.key, &self.initial)
    }

    pub fn loading(&self) -> bool {
        self.controller.get_doc_loading(&self.key)
    }

    pub fn error(&self) -> Option<RemoteError> {
        self.controller.get_doc_error(&self.key)
    }

    pub fn phase(&self) -> DocPhase {
        self.controller.doc_phase(&self.key)
    }

    /// Write through to the remote store; readers see the result only via
    /// the authoritative echo.
    pub async fn write(&self, write: DocWrite) -> Result<(), WriteError> {
        self.controller.set_doc_data(&self.key, write).await
    }

    /// Write a literal value.
    pub async fn replace(&self, value: impl Into<Value> + Send) -> Result<(), WriteError> {
        self.controller.set_doc_value(&self.key, value).await
    }

    /// Write the result of `f` applied to the latest cached value.
    pub async fn update(
        &self,
        f: impl FnOnce(Option<&Value>) -> Value + Send + 'static,
    ) -> Result<(), WriteError> {
        self.controller.update_doc(&self.key, f).await
    }
}
