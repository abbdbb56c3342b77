use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{Product, ProductId};
use crate::live_collection::{Record, Snapshot};

impl Record for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Snapshot<Product> {
    /// Listed quantity for `id`. Products missing from the snapshot have
    /// nothing available.
    pub fn quantity_of(&self, id: &str) -> Decimal {
        self.product(id)
            .map(|product| product.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.records().iter().find(|product| product.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.product(id).is_some()
    }
}
