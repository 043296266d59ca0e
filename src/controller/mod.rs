//! One generic controller per entity screen.
//!
//! [`EntityController<T>`] owns a table's view state (search, filters, sort,
//! page) and orchestrates CRUD against the store. Everything entity-specific
//! comes from the record type's [`Descriptor`](crate::model::Descriptor).

pub mod entity;
pub mod error;
pub mod export;
pub mod form;

pub use entity::*;
pub use error::ControllerError;
pub use export::*;
pub use form::*;

use crate::model::{Collection, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Published after every successful mutation so dependent views can refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub id: RecordId,
    pub kind: ChangeKind,
}
