//! Availability derived from the catalog and the cart. Nothing here is
//! stored; callers recompute on every snapshot and every cart change.

use rust_decimal::Decimal;
use serde::Serialize;

use super::store::Cart;
use crate::catalog::CatalogSnapshot;
use crate::domain::{CartLine, Product};

/// Listed quantity minus what the cart holds. May be negative when the
/// catalog shrank below a held quantity.
pub fn remaining(product: &Product, cart: &Cart) -> Decimal {
    product.quantity.saturating_sub(cart.held(&product.id))
}

/// [`remaining`] clamped at zero, for display.
pub fn display_remaining(product: &Product, cart: &Cart) -> Decimal {
    remaining(product, cart).max(Decimal::ZERO)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineStatus {
    Available,
    /// The catalog now lists less than the cart holds.
    Exceeds { held: Decimal, available: Decimal },
    /// The product is no longer listed.
    Unavailable,
}

impl LineStatus {
    pub fn is_conflict(&self) -> bool {
        !matches!(self, LineStatus::Available)
    }
}

pub fn line_status(line: &CartLine, catalog: &CatalogSnapshot) -> LineStatus {
    match catalog.product(&line.product_id) {
        None => LineStatus::Unavailable,
        Some(product) if line.quantity > product.quantity => LineStatus::Exceeds {
            held: line.quantity,
            available: product.quantity,
        },
        Some(_) => LineStatus::Available,
    }
}

/// Product ids whose lines no longer fit the catalog, in cart order.
pub fn conflicts(cart: &Cart, catalog: &CatalogSnapshot) -> Vec<String> {
    cart.lines()
        .iter()
        .filter(|line| line_status(line, catalog).is_conflict())
        .map(|line| line.product_id.clone())
        .collect()
}

/// A catalog entry as the marketplace lists it for this cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAvailability {
    pub product: Product,
    pub in_cart: Decimal,
    pub remaining: Decimal,
}

pub fn catalog_availability(catalog: &CatalogSnapshot, cart: &Cart) -> Vec<ProductAvailability> {
    catalog
        .records()
        .iter()
        .map(|product| ProductAvailability {
            in_cart: cart.held(&product.id),
            remaining: display_remaining(product, cart),
            product: product.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn setup() -> (Cart, CatalogSnapshot) {
        let millet = Product::new("millet", "Millet", dec!(55), dec!(6));
        let chilli = Product::new("chilli", "Chilli", dec!(120), dec!(3));
        let snapshot = CatalogSnapshot::new(1, vec![millet.clone(), chilli.clone()]);
        let mut cart = Cart::new();
        cart.add(&millet, &snapshot).unwrap();
        cart.update_quantity("millet", dec!(4), &snapshot).unwrap();
        cart.add(&chilli, &snapshot).unwrap();
        (cart, snapshot)
    }

    #[test]
    fn remaining_subtracts_held_quantity() {
        let (cart, snapshot) = setup();
        let millet = snapshot.product("millet").unwrap();
        assert_eq!(remaining(millet, &cart), dec!(2));

        let untouched = Product::new("ragi", "Ragi", dec!(1), dec!(7));
        assert_eq!(remaining(&untouched, &cart), dec!(7));
    }

    #[test]
    fn display_value_is_clamped_but_raw_value_is_not() {
        let (cart, _) = setup();
        let shrunk = Product::new("millet", "Millet", dec!(55), dec!(1));
        assert_eq!(remaining(&shrunk, &cart), dec!(-3));
        assert_eq!(display_remaining(&shrunk, &cart), dec!(0));
    }

    #[test]
    fn line_status_tracks_catalog_changes() {
        let (cart, _) = setup();
        let next = CatalogSnapshot::new(
            2,
            vec![Product::new("millet", "Millet", dec!(55), dec!(2))],
        );
        let statuses: Vec<LineStatus> = cart
            .lines()
            .iter()
            .map(|line| line_status(line, &next))
            .collect();
        assert_eq!(
            statuses,
            vec![
                LineStatus::Exceeds { held: dec!(4), available: dec!(2) },
                LineStatus::Unavailable,
            ]
        );
        assert_eq!(conflicts(&cart, &next), vec!["millet".to_string(), "chilli".to_string()]);
    }

    #[test]
    fn availability_follows_snapshot_order() {
        let (cart, snapshot) = setup();
        let listing = catalog_availability(&snapshot, &cart);
        let rows: Vec<(&str, Decimal, Decimal)> = listing
            .iter()
            .map(|row| (row.product.id.as_str(), row.in_cart, row.remaining))
            .collect();
        let expected_order: Vec<&str> = snapshot.records().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(rows.iter().map(|r| r.0).collect::<Vec<_>>(), expected_order);
        assert!(rows.contains(&("millet", dec!(4), dec!(2))));
        assert!(rows.contains(&("chilli", dec!(1), dec!(2))));
    }
}
