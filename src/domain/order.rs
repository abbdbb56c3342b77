use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProductId;

/// One product held in the cart.
///
/// `name` and `unit_price` are captured from the catalog when the line is
/// created and are not refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
}

impl CartLine {
    /// Saturates at `Decimal::MAX`. The cart refuses quantities that would
    /// get there, so this only matters for lines built elsewhere.
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(self.quantity)
    }

    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A finalized, catalog-validated order handed to order placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub lines: Vec<ReceiptLine>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub line_total: Decimal,
}

impl Receipt {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let lines: Vec<ReceiptLine> = lines
            .into_iter()
            .map(|line| ReceiptLine {
                line_total: line.line_total(),
                product_id: line.product_id,
                name: line.name,
                unit_price: line.unit_price,
                quantity: line.quantity,
            })
            .collect();
        let total = lines
            .iter()
            .fold(Decimal::ZERO, |sum, line| sum.saturating_add(line.line_total));
        Self {
            id: Uuid::new_v4(),
            lines,
            total,
            created_at: Utc::now(),
        }
    }
}
