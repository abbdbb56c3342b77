//! # Agri Cart
//!
//! Cart and catalog reconciliation for a farm produce marketplace.
//!
//! The catalog arrives as a stream of full snapshots from a live
//! collection. Each signed-in user gets a cart that is checked against the
//! latest snapshot on every operation, so a cart never claims more of a
//! product than the catalog currently lists.
//!
//! ## Terminology
//!
//! - **Service** (e.g. [`CartService`]) owns state and runs one request at a time
//! - **Client** (e.g. [`CartClient`]) is the cloneable handle used to talk to it
//!
//! ## Pieces
//!
//! - **Live collections** - ordered snapshots pushed to subscribers → [`CollectionActor`], [`Subscription`]
//!     - **Catalog** → [`catalog::CatalogClient`]
//!     - **Community posts** → [`community::PostClient`]
//! - **Cart rules** - synchronous, owned by one caller
//!     - **Store** - add, update, remove, total → [`Cart`]
//!     - **Reconciler** - remaining quantity and line status → [`cart::reconcile`]
//!     - **Checkout** - all-or-nothing against one snapshot → [`cart::checkout()`]
//! - **Cart service** - serializes user requests and catalog events → [`CartService`]
//! - **System** - shared feeds, per-user sessions, config and tracing → [`Marketplace`], [`Session`], [`EngineConfig`]
//! - **Collaborator contracts** - order placement, diagnosis, assistant → [`services`]
//!
//! ## Example Usage
//!
//! ```no_run
//! # use agri_cart::{EngineConfig, Marketplace, Session};
//! # use agri_cart::domain::{Role, UserProfile};
//! # async fn demo() -> anyhow::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let market = Marketplace::start(&config);
//!
//! let profile = UserProfile::new("u1", "Ravi", Role::Consumer);
//! let session = Session::login(profile, &market.catalog, &config).await?;
//! session.cart.add_to_cart("rice".to_string()).await?;
//!
//! session.logout().await?;
//! market.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Expected Tracing Output
//!
//! ```text
//! INFO marketplace: Starting marketplace feeds
//! INFO collection{collection="catalog"}: Collection starting
//! INFO login{user_id="u1" role=Consumer}: Session started dashboard=Marketplace
//! DEBUG add_to_cart{}: Sending request
//! DEBUG cart_service:handle_add_to_cart{product_id=rice}: Processing add_to_cart request
//! INFO cart_service:handle_add_to_cart{product_id=rice}: Added to cart quantity=1
//! ```

pub mod app_system;
pub mod cart;
pub mod cart_actor;
pub mod catalog;
pub mod clients;
pub mod community;
pub mod domain;
pub mod live_collection;
pub mod services;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;

pub use app_system::{setup_tracing, DeletedProductPolicy, EngineConfig, Marketplace, Session, SessionError};
pub use cart::{Cart, CartError, CheckoutError};
pub use cart_actor::{CartService, CartView, FeedStatus};
pub use clients::CartClient;
pub use live_collection::{CollectionActor, CollectionClient, FeedError, FeedEvent, Snapshot, Subscription};
