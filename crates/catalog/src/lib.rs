//! Catalog collaborator for the parts storefront.
//!
//! The order core only ever needs three things from the catalog: look a part
//! up by ID, deduct stock with an atomic compare-and-clamp, and add stock
//! back. Browsing, filtering, and categories stay outside this crate.

pub mod error;
pub mod memory;
pub mod part;
pub mod postgres;
pub mod store;

pub use error::{CatalogError, Result};
pub use memory::InMemoryPartStore;
pub use part::Part;
pub use postgres::PostgresPartStore;
pub use store::PartStore;
