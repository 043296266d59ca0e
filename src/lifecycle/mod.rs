//! # System Lifecycle
//!
//! The application context. [`InventorySystem`] starts the store task, builds
//! one controller per collection, restores the session and the language
//! preference, and tears everything down in order.
//!
//! ## Shutdown Order
//!
//! The store task exits once every [`StoreClient`](crate::framework::StoreClient)
//! is gone. The dashboard refresher holds one, and it only exits when the
//! change-event channel closes. So shutdown drops the controllers and the event
//! sender first, awaits the refresher, and then awaits the store.

pub mod inventory_system;
pub mod tracing;

pub use inventory_system::{InventorySystem, SystemError};
