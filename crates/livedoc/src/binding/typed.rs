//! TypedDoc<T> — serde-typed view over a [`DocBinding`].
//!
//! Deserializes on demand and serializes through the shared write path.
//! Decode failures belong to the caller; they never enter the entry's
//! subscription-channel error slot.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DecodeError, RemoteError, WriteError};
use crate::types::{DocPhase, Unsubscribe};

use super::handle::DocBinding;

/// Typed wrapper over a document binding.
pub struct TypedDoc<T> {
    binding: DocBinding,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedDoc<T>
where
    T: DeserializeOwned + Serialize,
{
    pub fn new(binding: DocBinding) -> Self {
        Self {
            binding,
            _marker: PhantomData,
        }
    }

    /// The untyped binding underneath.
    pub fn binding(&self) -> &DocBinding {
        &self.binding
    }

    pub fn subscribe(&self, notify: impl Fn() + Send + Sync + 'static) -> Unsubscribe {
        self.binding.subscribe(notify)
    }

    /// Decode the current snapshot as `T`.
    pub fn snapshot(&self) -> Result<T, DecodeError> {
        let value = self.binding.snapshot();
        serde_json::from_value((*value).clone()).map_err(|source| DecodeError {
            path: self.binding.key().path(),
            type_name: std::any::type_name::<T>(),
            source,
        })
    }

    /// Serialize `value` and write it through the shared write path.
    pub async fn write(&self, value: &T) -> Result<(), WriteError> {
        let json = serde_json::to_value(value).map_err(|source| WriteError::Serialize {
            path: self.binding.key().path(),
            source,
        })?;
        self.binding.replace(json).await
    }

    pub fn loading(&self) -> bool {
        self.binding.loading()
    }

    pub fn error(&self) -> Option<RemoteError> {
        self.binding.error()
    }

    pub fn phase(&self) -> DocPhase {
        self.binding.phase()
    }
}
