//! Store framework: persistence, the store task and its client.
//!
//! # Main Components
//!
//! - [`Record`] - Trait that record types implement to live in the store
//! - [`StoreActor`] - The single task owning the inventory document
//! - [`StoreClient`] - Cloneable handle for typed CRUD calls
//! - [`BlobStore`] - Key-value persistence behind the store
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test store consumers without spawning
//! the real store.

pub mod blob;
pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use core::*;
