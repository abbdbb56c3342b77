use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::error::CartError;
use crate::catalog::CatalogSnapshot;
use crate::domain::{CartLine, Product};

/// A session's cart. At most one line per product, kept in the order the
/// products were first added.
///
/// Every quantity check reads the catalog snapshot passed in by the caller,
/// so availability is always derived from the latest feed state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

/// A correction made by [`Cart::clamp_to`].
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub product_id: String,
    pub from: Decimal,
    /// Zero when the line was dropped.
    pub to: Decimal,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    pub fn held(&self, product_id: &str) -> Decimal {
        self.line(product_id)
            .map(|line| line.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id == product_id)
    }

    /// Adds one unit of `product`, creating the line on first add.
    pub fn add(&mut self, product: &Product, catalog: &CatalogSnapshot) -> Result<&CartLine, CartError> {
        if !catalog.contains(&product.id) {
            warn!(product_id = %product.id, "Rejected add: product not in catalog");
            return Err(CartError::Unavailable(product.id.clone()));
        }
        let available = catalog.quantity_of(&product.id);
        let requested = self
            .held(&product.id)
            .checked_add(Decimal::ONE)
            .ok_or_else(|| CartError::TotalOverflow {
                product_id: product.id.clone(),
                quantity: self.held(&product.id),
            })?;
        if requested > available {
            warn!(product_id = %product.id, %requested, %available, "Rejected add: over limit");
            return Err(CartError::OverLimit {
                product_id: product.id.clone(),
                requested,
                available,
            });
        }

        let listed = catalog.product(&product.id).unwrap_or(product);
        let unit_price = self
            .line(&product.id)
            .map_or(listed.price, |line| line.unit_price);
        self.check_total(&product.id, unit_price, requested)?;

        let index = match self.position(&product.id) {
            Some(index) => {
                self.lines[index].quantity = requested;
                index
            }
            None => {
                self.lines.push(CartLine {
                    product_id: listed.id.clone(),
                    name: listed.name.clone(),
                    unit_price,
                    quantity: requested,
                });
                self.lines.len() - 1
            }
        };
        debug!(product_id = %product.id, quantity = %requested, "Added to cart");
        Ok(&self.lines[index])
    }

    /// Sets the held quantity. Zero or less removes the line and returns `None`.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        quantity: Decimal,
        catalog: &CatalogSnapshot,
    ) -> Result<Option<&CartLine>, CartError> {
        if quantity <= Decimal::ZERO {
            self.remove(product_id);
            return Ok(None);
        }
        let Some(index) = self.position(product_id) else {
            return Err(CartError::NotInCart(product_id.to_string()));
        };
        if !catalog.contains(product_id) {
            warn!(product_id, "Rejected update: product no longer listed");
            return Err(CartError::Unavailable(product_id.to_string()));
        }
        let available = catalog.quantity_of(product_id);
        if quantity > available {
            warn!(product_id, requested = %quantity, %available, "Rejected update: over limit");
            return Err(CartError::OverLimit {
                product_id: product_id.to_string(),
                requested: quantity,
                available,
            });
        }

        self.check_total(product_id, self.lines[index].unit_price, quantity)?;

        self.lines[index].quantity = quantity;
        debug!(product_id, %quantity, "Updated quantity");
        Ok(Some(&self.lines[index]))
    }

    /// Fails when holding `quantity` of `product_id` at `unit_price` would
    /// take its line total or the cart total past what `Decimal` can hold.
    fn check_total(&self, product_id: &str, unit_price: Decimal, quantity: Decimal) -> Result<(), CartError> {
        let others = self
            .lines
            .iter()
            .filter(|line| line.product_id != product_id)
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.checked_line_total()?));
        let total = others.and_then(|sum| sum.checked_add(unit_price.checked_mul(quantity)?));
        if total.is_none() {
            warn!(product_id, %quantity, "Rejected: total would overflow");
            return Err(CartError::TotalOverflow {
                product_id: product_id.to_string(),
                quantity,
            });
        }
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) -> Option<CartLine> {
        let index = self.position(product_id)?;
        debug!(product_id, "Removed from cart");
        Some(self.lines.remove(index))
    }

    /// Sum of captured unit price times held quantity.
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |sum, line| sum.saturating_add(line.line_total()))
    }

    pub(crate) fn take_lines(&mut self) -> Vec<CartLine> {
        std::mem::take(&mut self.lines)
    }

    /// Drops lines whose product is gone from `catalog`.
    pub fn evict_missing(&mut self, catalog: &CatalogSnapshot) -> Vec<CartLine> {
        let (kept, evicted) = self
            .take_lines()
            .into_iter()
            .partition(|line| catalog.contains(&line.product_id));
        self.lines = kept;
        evicted
    }

    /// Lowers every over-limit line to what the catalog has, dropping lines
    /// with nothing left.
    pub fn clamp_to(&mut self, catalog: &CatalogSnapshot) -> Vec<Adjustment> {
        let mut adjustments = Vec::new();
        self.lines.retain_mut(|line| {
            let available = catalog.quantity_of(&line.product_id).max(Decimal::ZERO);
            if line.quantity <= available {
                return true;
            }
            adjustments.push(Adjustment {
                product_id: line.product_id.clone(),
                from: line.quantity,
                to: available,
            });
            line.quantity = available;
            available > Decimal::ZERO
        });
        adjustments
    }
}
