use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::cart::{Adjustment, CartError, CheckoutError, LineStatus, ProductAvailability};
use crate::domain::{CartLine, ProductId, Receipt};
use crate::live_collection::FeedError;

pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

#[derive(Debug)]
pub enum CartRequest {
    AddToCart {
        product_id: ProductId,
        respond_to: ServiceResponse<CartLine, CartError>,
    },
    UpdateQuantity {
        product_id: ProductId,
        quantity: Decimal,
        respond_to: ServiceResponse<Option<CartLine>, CartError>,
    },
    RemoveFromCart {
        product_id: ProductId,
        respond_to: ServiceResponse<Option<CartLine>, CartError>,
    },
    GetTotal {
        respond_to: ServiceResponse<Decimal, CartError>,
    },
    GetView {
        respond_to: ServiceResponse<CartView, CartError>,
    },
    CatalogAvailability {
        respond_to: ServiceResponse<Vec<ProductAvailability>, CartError>,
    },
    ClampToAvailability {
        respond_to: ServiceResponse<Vec<Adjustment>, CartError>,
    },
    Checkout {
        respond_to: ServiceResponse<Receipt, CheckoutError>,
    },
    Shutdown,
    #[cfg(test)]
    GetRevision {
        respond_to: ServiceResponse<u64, CartError>,
    },
}

/// State of the catalog subscription as the cart last saw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum FeedStatus {
    /// No snapshot has arrived yet.
    Connecting,
    Live,
    /// The feed failed. The cart keeps working on the last snapshot it saw.
    Degraded(String),
}

impl From<&FeedError> for FeedStatus {
    fn from(error: &FeedError) -> Self {
        FeedStatus::Degraded(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineView {
    pub line: CartLine,
    pub status: LineStatus,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
    pub catalog_revision: u64,
    pub feed: FeedStatus,
}
