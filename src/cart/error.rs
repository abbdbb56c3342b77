use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::ProductId;

/// Rejections from cart operations. A rejected operation never changes the cart.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    #[error("Over limit for {product_id}: requested {requested}, available {available}")]
    OverLimit {
        product_id: ProductId,
        requested: Decimal,
        available: Decimal,
    },
    #[error("Product unavailable: {0}")]
    Unavailable(ProductId),
    #[error("Product not in cart: {0}")]
    NotInCart(ProductId),
    #[error("Total for {product_id} at quantity {quantity} is too large")]
    TotalOverflow {
        product_id: ProductId,
        quantity: Decimal,
    },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// Why a checkout could not be committed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    #[error("Checkout conflicts with current availability: {}", .0.join(", "))]
    Conflict(Vec<ProductId>),
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
