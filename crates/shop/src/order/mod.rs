//! Order aggregate and its persistence.

mod aggregate;
mod postgres;
mod status;
mod store;

pub use aggregate::{Buyer, Order, OrderItem};
pub use postgres::PostgresOrderStore;
pub use status::OrderStatus;
pub use store::{InMemoryOrderStore, OrderStore, OrderStoreError};
