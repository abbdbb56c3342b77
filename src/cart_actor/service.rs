use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::messages::{CartLineView, CartRequest, CartView, FeedStatus, ServiceResponse};
use crate::app_system::DeletedProductPolicy;
use crate::cart::{self, reconcile, Adjustment, Cart, CartError, CheckoutError, ProductAvailability};
use crate::catalog::CatalogSnapshot;
use crate::clients::CartClient;
use crate::domain::{CartLine, Product, ProductId, Receipt};
use crate::live_collection::{self, FeedEvent, Inbox};

/// Owns one session's cart and the latest catalog snapshot.
///
/// User requests and catalog events share a single run loop, so each one is
/// handled to completion before the next is looked at. Snapshots can land
/// between any two user operations; availability is re-derived from
/// `catalog` on every request.
pub struct CartService {
    receiver: mpsc::Receiver<CartRequest>,
    feed: Inbox<Product>,
    cart: Cart,
    catalog: CatalogSnapshot,
    feed_status: FeedStatus,
    policy: DeletedProductPolicy,
}

impl CartService {
    pub fn new(buffer_size: usize, policy: DeletedProductPolicy) -> (Self, CartClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (feed_sender, feed) = live_collection::feed_lane();
        let service = Self {
            receiver,
            feed,
            cart: Cart::new(),
            catalog: CatalogSnapshot::empty(),
            feed_status: FeedStatus::Connecting,
            policy,
        };
        (service, CartClient::new(sender, feed_sender))
    }

    #[instrument(name = "cart_service", skip(self))]
    pub async fn run(mut self) {
        info!("CartService starting");

        let mut feed_open = true;
        loop {
            tokio::select! {
                msg = self.receiver.recv() => {
                    let Some(msg) = msg else { break };
                    if !self.handle_request(msg) {
                        break;
                    }
                }
                open = self.feed.changed(), if feed_open => {
                    feed_open = open;
                    for event in self.feed.take() {
                        self.handle_feed_event(event);
                    }
                }
            }
        }

        info!("CartService stopped");
    }

    /// Returns `false` once the service should stop.
    fn handle_request(&mut self, msg: CartRequest) -> bool {
        match msg {
            CartRequest::AddToCart { product_id, respond_to } => {
                self.handle_add_to_cart(product_id, respond_to);
            }
            CartRequest::UpdateQuantity {
                product_id,
                quantity,
                respond_to,
            } => {
                self.handle_update_quantity(product_id, quantity, respond_to);
            }
            CartRequest::RemoveFromCart { product_id, respond_to } => {
                self.handle_remove_from_cart(product_id, respond_to);
            }
            CartRequest::GetTotal { respond_to } => {
                let _ = respond_to.send(Ok(self.cart.total()));
            }
            CartRequest::GetView { respond_to } => {
                let _ = respond_to.send(Ok(self.view()));
            }
            CartRequest::CatalogAvailability { respond_to } => {
                self.handle_catalog_availability(respond_to);
            }
            CartRequest::ClampToAvailability { respond_to } => {
                self.handle_clamp(respond_to);
            }
            CartRequest::Checkout { respond_to } => {
                self.handle_checkout(respond_to);
            }
            CartRequest::Shutdown => {
                info!("CartService shutting down");
                return false;
            }
            #[cfg(test)]
            CartRequest::GetRevision { respond_to } => {
                let _ = respond_to.send(Ok(self.catalog.revision()));
            }
        }
        true
    }

    #[instrument(fields(product_id = %product_id), skip(self, respond_to))]
    fn handle_add_to_cart(&mut self, product_id: ProductId, respond_to: ServiceResponse<CartLine, CartError>) {
        debug!("Processing add_to_cart request");

        let result = match self.catalog.product(&product_id) {
            Some(product) => self.cart.add(product, &self.catalog).cloned(),
            None => {
                warn!("Rejected add: product not in catalog");
                Err(CartError::Unavailable(product_id))
            }
        };
        if let Ok(line) = &result {
            info!(quantity = %line.quantity, "Added to cart");
        }
        let _ = respond_to.send(result);
    }

    #[instrument(fields(product_id = %product_id, quantity = %quantity), skip(self, respond_to))]
    fn handle_update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: Decimal,
        respond_to: ServiceResponse<Option<CartLine>, CartError>,
    ) {
        debug!("Processing update_quantity request");

        let result = self
            .cart
            .update_quantity(&product_id, quantity, &self.catalog)
            .map(|line| line.cloned());
        let _ = respond_to.send(result);
    }

    #[instrument(fields(product_id = %product_id), skip(self, respond_to))]
    fn handle_remove_from_cart(
        &mut self,
        product_id: ProductId,
        respond_to: ServiceResponse<Option<CartLine>, CartError>,
    ) {
        debug!("Processing remove_from_cart request");
        let _ = respond_to.send(Ok(self.cart.remove(&product_id)));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_catalog_availability(&self, respond_to: ServiceResponse<Vec<ProductAvailability>, CartError>) {
        debug!("Processing catalog_availability request");
        let listing = reconcile::catalog_availability(&self.catalog, &self.cart);
        let _ = respond_to.send(Ok(listing));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_clamp(&mut self, respond_to: ServiceResponse<Vec<Adjustment>, CartError>) {
        debug!("Processing clamp_to_availability request");
        let adjustments = self.cart.clamp_to(&self.catalog);
        for adjustment in &adjustments {
            info!(
                product_id = %adjustment.product_id,
                from = %adjustment.from,
                to = %adjustment.to,
                "Cart line adjusted to availability"
            );
        }
        let _ = respond_to.send(Ok(adjustments));
    }

    #[instrument(fields(lines = self.cart.len(), revision = self.catalog.revision()), skip(self, respond_to))]
    fn handle_checkout(&mut self, respond_to: ServiceResponse<Receipt, CheckoutError>) {
        debug!("Processing checkout request");
        let _ = respond_to.send(cart::checkout(&mut self.cart, &self.catalog));
    }

    fn handle_feed_event(&mut self, event: FeedEvent<Product>) {
        match event {
            FeedEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            FeedEvent::Failed(e) => {
                error!(error = %e, "Catalog feed failed; keeping last snapshot");
                self.feed_status = FeedStatus::from(&e);
            }
        }
    }

    #[instrument(fields(revision = snapshot.revision(), products = snapshot.len()), skip(self, snapshot))]
    fn apply_snapshot(&mut self, snapshot: CatalogSnapshot) {
        debug!("Applying catalog snapshot");

        for line in self.cart.lines() {
            match reconcile::line_status(line, &snapshot) {
                reconcile::LineStatus::Available => {}
                reconcile::LineStatus::Exceeds { held, available } => {
                    warn!(product_id = %line.product_id, %held, %available, "Catalog now lists less than the cart holds");
                }
                reconcile::LineStatus::Unavailable => {
                    warn!(product_id = %line.product_id, "Product in cart was delisted");
                }
            }
        }

        if self.policy == DeletedProductPolicy::Evict {
            for line in self.cart.evict_missing(&snapshot) {
                info!(product_id = %line.product_id, quantity = %line.quantity, "Evicted delisted product from cart");
            }
        }

        self.catalog = snapshot;
        self.feed_status = FeedStatus::Live;
    }

    fn view(&self) -> CartView {
        let lines = self
            .cart
            .lines()
            .iter()
            .map(|line| CartLineView {
                status: reconcile::line_status(line, &self.catalog),
                line_total: line.line_total(),
                line: line.clone(),
            })
            .collect();
        CartView {
            lines,
            total: self.cart.total(),
            catalog_revision: self.catalog.revision(),
            feed: self.feed_status.clone(),
        }
    }
}
