//! Shared types for the parts storefront.
//!
//! Typed identifiers prevent mixing up orders, users, parts, and sessions,
//! and [`Money`] keeps all monetary arithmetic in integer minor units.

pub mod types;

pub use types::{Money, OrderId, PartId, SessionId, UserId};
