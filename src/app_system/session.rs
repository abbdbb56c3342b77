use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use super::config::EngineConfig;
use crate::cart::CartError;
use crate::cart_actor::CartService;
use crate::catalog::CatalogClient;
use crate::clients::CartClient;
use crate::domain::{Dashboard, Language, Theme, UserProfile};
use crate::live_collection::{FeedError, Subscription};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("Catalog subscription failed: {0}")]
    Feed(#[from] FeedError),
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
    #[error("Session task failed: {0}")]
    TaskFailed(String),
}

/// Everything that lives for one signed-in user: their profile and
/// preferences, and a cart kept in sync with the catalog.
///
/// Created by [`Session::login`] and torn down by [`Session::logout`].
pub struct Session {
    pub profile: UserProfile,
    pub language: Language,
    pub theme: Theme,
    pub cart: CartClient,
    catalog_subscription: Subscription,
    cart_handle: JoinHandle<()>,
}

impl Session {
    #[instrument(fields(user_id = %profile.id, role = ?profile.role), skip(profile, catalog, config))]
    pub async fn login(
        profile: UserProfile,
        catalog: &CatalogClient,
        config: &EngineConfig,
    ) -> Result<Self, SessionError> {
        let (cart_service, cart) =
            CartService::new(config.cart_buffer_size, config.deleted_product_policy);
        let cart_handle = tokio::spawn(cart_service.run());

        let catalog_subscription = match catalog.subscribe(cart.catalog_sink()).await {
            Ok(subscription) => subscription,
            Err(e) => {
                error!(error = %e, "Could not subscribe cart to catalog");
                let _ = cart.shutdown().await;
                let _ = cart_handle.await;
                return Err(e.into());
            }
        };

        info!(dashboard = ?profile.role.dashboard(), "Session started");
        Ok(Self {
            profile,
            language: Language::default(),
            theme: Theme::default(),
            cart,
            catalog_subscription,
            cart_handle,
        })
    }

    pub fn dashboard(&self) -> Dashboard {
        self.profile.role.dashboard()
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggle();
        self.theme
    }

    /// Stops catalog delivery, then the cart. The cart's contents are
    /// discarded.
    #[instrument(fields(user_id = %self.profile.id), skip(self))]
    pub async fn logout(self) -> Result<(), SessionError> {
        self.catalog_subscription.unsubscribe().await;
        self.cart.shutdown().await?;
        self.cart_handle
            .await
            .map_err(|e| SessionError::TaskFailed(e.to_string()))?;
        info!("Session ended");
        Ok(())
    }
}
