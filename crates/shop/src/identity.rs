//! Buyer identity supplied at checkout.

use common::UserId;
use serde::{Deserialize, Serialize};

/// Who is placing an order, as presented by the caller.
///
/// Guests carry their raw password here; it is hashed during checkout and
/// never stored.
#[derive(Debug, Clone)]
pub enum Identity {
    /// An authenticated member.
    Member(UserId),

    /// A guest supplying contact details for later lookup.
    Guest {
        name: String,
        phone: String,
        email: String,
        password: String,
    },
}

/// Contact details stored on a guest order.
///
/// `password_hash` is the only form the guest password ever takes at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
}

/// Hashing seam for guest order passwords.
///
/// The scheme itself is chosen by the surrounding application; the core
/// only requires that hashing is irreversible and verification is exact.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a raw password for storage.
    fn hash(&self, raw: &str) -> String;

    /// Verifies a raw password against a stored hash.
    fn verify(&self, raw: &str, hash: &str) -> bool;
}
