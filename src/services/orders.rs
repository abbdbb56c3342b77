use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::domain::Receipt;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderPlacementError {
    #[error("Order rejected: {0}")]
    Rejected(String),
    #[error("Order placement unavailable: {0}")]
    Unavailable(String),
}

/// Where finalized receipts go. The cart engine only produces receipts.
#[async_trait]
pub trait OrderPlacement: Send + Sync {
    async fn place(&self, receipt: Receipt) -> Result<String, OrderPlacementError>;
}

/// Accepts every receipt and logs it as JSON. Used by the demo binary.
#[derive(Debug, Default)]
pub struct LoggingOrderDesk;

#[async_trait]
impl OrderPlacement for LoggingOrderDesk {
    async fn place(&self, receipt: Receipt) -> Result<String, OrderPlacementError> {
        let body = serde_json::to_string(&receipt)
            .map_err(|e| OrderPlacementError::Rejected(e.to_string()))?;
        info!(receipt_id = %receipt.id, %body, "Order placed");
        Ok(receipt.id.to_string())
    }
}
