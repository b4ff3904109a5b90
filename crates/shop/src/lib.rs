//! Order and inventory core for the parts storefront.
//!
//! This crate owns the only subsystem of the storefront with real
//! invariants: the session cart, the immutable order snapshot taken at
//! checkout, and the exactly-once stock application that follows order
//! status changes. Catalog browsing, templates, and the membership screens
//! live elsewhere and talk to this crate through [`ShopService`].
//!
//! The flow, end to end:
//! - a [`cart::Cart`] accumulates (part, quantity) intent in the session;
//! - checkout validates the cart and freezes it into an [`order::Order`]
//!   with price/title snapshots, status `Requested`, stock untouched;
//! - an admin confirming payment calls [`ShopService::transition_status`],
//!   which deducts stock exactly once; moving the order back out of
//!   `Confirmed` restores it exactly once, guarded by the order's
//!   `stock_applied` flag.

pub mod cart;
pub mod checkout;
pub mod error;
pub mod identity;
pub mod order;
pub mod service;
pub mod session;
pub mod stock;

pub use cart::{Cart, CartLine};
pub use error::{Result, ShopError, ValidationError};
pub use identity::{GuestContact, Identity, PasswordHasher};
pub use order::{
    Buyer, InMemoryOrderStore, Order, OrderItem, OrderStatus, OrderStore, OrderStoreError,
    PostgresOrderStore,
};
pub use service::ShopService;
pub use session::{InMemorySessionStore, SessionError, SessionStore};
