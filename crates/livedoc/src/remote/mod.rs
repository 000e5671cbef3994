//! Remote document store seam.
//!
//! - [`traits`] — the [`RemoteDocumentStore`] contract the cache consumes.
//! - [`memory`] — [`MemoryRemoteStore`], a fully functional in-process
//!   implementation with synchronous echo semantics.

pub mod memory;
pub mod traits;

pub use memory::MemoryRemoteStore;
pub use traits::{DataCallback, ErrorCallback, RemoteDocumentStore, RemoteUnsubscribe};
