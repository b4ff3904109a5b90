//! Checkout validation and buyer resolution.
//!
//! Everything here runs immediately before the order insert; a failure at
//! this stage leaves no state behind anywhere.

use crate::cart::CartLine;
use crate::error::ValidationError;
use crate::identity::{GuestContact, Identity, PasswordHasher};
use crate::order::Buyer;

/// Checks the preconditions for turning resolved lines into an order.
///
/// Time passes between showing the cart and submitting it, so these checks
/// repeat against the freshly resolved lines even when the UI already
/// displayed warnings.
pub fn validate_lines(lines: &[CartLine]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    for line in lines {
        if line.is_inquiry_only() {
            return Err(ValidationError::InquiryOnlyItem {
                part_id: line.part.id.clone(),
            });
        }
        if !line.stock_ok {
            return Err(ValidationError::InsufficientStock {
                part_id: line.part.id.clone(),
                requested: line.quantity,
                available: line.part.stock,
            });
        }
    }
    Ok(())
}

/// Turns a caller identity into a storable buyer.
///
/// Guest fields are trimmed and all four are required; the raw password is
/// replaced by its hash and never stored.
pub fn resolve_buyer(
    identity: Identity,
    hasher: &dyn PasswordHasher,
) -> Result<Buyer, ValidationError> {
    match identity {
        Identity::Member(user_id) => Ok(Buyer::Member(user_id)),
        Identity::Guest {
            name,
            phone,
            email,
            password,
        } => {
            let name = name.trim();
            let phone = phone.trim();
            let email = email.trim();
            let password = password.trim();

            let missing = [
                ("name", name),
                ("phone", phone),
                ("email", email),
                ("password", password),
            ]
            .into_iter()
            .find(|(_, value)| value.is_empty());
            if let Some((field, _)) = missing {
                return Err(ValidationError::IncompleteGuestContact { field });
            }

            Ok(Buyer::Guest(GuestContact {
                name: name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                password_hash: hasher.hash(password),
            }))
        }
    }
}
