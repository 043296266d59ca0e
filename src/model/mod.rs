//! Pure data structures implementing the [`Record`](crate::framework::Record) trait.

pub mod category;
pub mod document;
pub mod field;
pub mod order;
pub mod product;
pub mod supplier;
pub mod warehouse;

pub use category::*;
pub use document::*;
pub use field::*;
pub use order::*;
pub use product::*;
pub use supplier::*;
pub use warehouse::*;
