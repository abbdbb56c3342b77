//! Cart rules: the store, the availability reconciler and the checkout
//! finalizer. Everything here is synchronous and owned by one caller; the
//! [`crate::cart_actor`] serializes access.

pub mod checkout;
pub mod error;
pub mod reconcile;
pub mod store;

pub use checkout::checkout;
pub use error::*;
pub use reconcile::{LineStatus, ProductAvailability};
pub use store::{Adjustment, Cart};
