use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use super::macros::client_method;
use crate::cart::{Adjustment, CartError, CheckoutError, ProductAvailability};
use crate::cart_actor::{CartRequest, CartView};
use crate::domain::{CartLine, Product, ProductId, Receipt};
use crate::live_collection::{FeedEvent, Outbox};

/// Handle to a running [`crate::cart_actor::CartService`].
#[derive(Clone)]
pub struct CartClient {
    sender: mpsc::Sender<CartRequest>,
    feed: Outbox<Product>,
}

impl CartClient {
    pub(crate) fn new(sender: mpsc::Sender<CartRequest>, feed: Outbox<Product>) -> Self {
        Self { sender, feed }
    }

    /// Callback for a catalog subscription. The cart picks events up between
    /// user requests, never while one runs. A snapshot the cart has not
    /// reached yet is replaced by a newer one.
    pub fn catalog_sink(&self) -> impl FnMut(FeedEvent<Product>) + Send + 'static {
        let feed = self.feed.clone();
        move |event| {
            if !feed.push(event) {
                debug!("Cart stopped; dropping catalog event");
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), CartError> {
        debug!("Sending shutdown request");
        self.sender
            .send(CartRequest::Shutdown)
            .await
            .map_err(|e| CartError::ActorCommunicationError(e.to_string()))
    }
}

client_method!(CartClient => fn add_to_cart(product_id: ProductId) -> CartLine as CartRequest::AddToCart, Error = CartError);
client_method!(CartClient => fn update_quantity(product_id: ProductId, quantity: Decimal) -> Option<CartLine> as CartRequest::UpdateQuantity, Error = CartError);
client_method!(CartClient => fn remove_from_cart(product_id: ProductId) -> Option<CartLine> as CartRequest::RemoveFromCart, Error = CartError);
client_method!(CartClient => fn get_total() -> Decimal as CartRequest::GetTotal, Error = CartError);
client_method!(CartClient => fn get_view() -> CartView as CartRequest::GetView, Error = CartError);
client_method!(CartClient => fn catalog_availability() -> Vec<ProductAvailability> as CartRequest::CatalogAvailability, Error = CartError);
client_method!(CartClient => fn clamp_to_availability() -> Vec<Adjustment> as CartRequest::ClampToAvailability, Error = CartError);
client_method!(CartClient => fn checkout() -> Receipt as CartRequest::Checkout, Error = CheckoutError);
#[cfg(test)]
client_method!(CartClient => fn get_revision() -> u64 as CartRequest::GetRevision, Error = CartError);
