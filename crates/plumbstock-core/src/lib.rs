//! plumbstock-core: the inventory item store behind the plumbstock catalog.
//!
//! Items live as one JSON array in a key-value backend, newest first and
//! capped at a fixed size. [`ItemStore`] is the only way in or out of that
//! array; category views, row queries and stock figures are computed from
//! what it lists.

pub mod category;
pub mod config;
pub mod draft;
pub mod error;
pub mod event;
pub mod image;
pub mod item;
pub mod query;
pub mod stats;
pub mod storage;
pub mod store;

pub use category::*;
pub use config::*;
pub use draft::*;
pub use error::*;
pub use event::*;
pub use item::*;
pub use query::*;
pub use stats::*;
pub use storage::*;
pub use store::*;
