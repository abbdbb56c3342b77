use tracing::{info, warn};

use super::error::CheckoutError;
use super::reconcile::conflicts;
use super::store::Cart;
use crate::catalog::CatalogSnapshot;
use crate::domain::Receipt;

/// Commits the cart against the current catalog.
///
/// All or nothing: if any line no longer fits, the cart is left exactly as
/// it was and every offending product id is reported. On success the cart is
/// emptied and its lines move into the receipt.
pub fn checkout(cart: &mut Cart, catalog: &CatalogSnapshot) -> Result<Receipt, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let conflicting = conflicts(cart, catalog);
    if !conflicting.is_empty() {
        warn!(conflicts = ?conflicting, revision = catalog.revision(), "Checkout rejected");
        return Err(CheckoutError::Conflict(conflicting));
    }

    let receipt = Receipt::from_lines(cart.take_lines());
    info!(receipt_id = %receipt.id, total = %receipt.total, lines = receipt.lines.len(), "Checkout complete");
    Ok(receipt)
}
