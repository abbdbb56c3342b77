use tracing::{error, info, instrument};

use super::config::EngineConfig;
use crate::catalog::{self, CatalogClient};
use crate::community::{self, PostClient};

/// Starts and stops the shared live collections (catalog and community
/// posts). Sessions subscribe to these; they outlive any one session.
pub struct Marketplace {
    pub catalog: CatalogClient,
    pub posts: PostClient,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Marketplace {
    #[instrument(name = "marketplace", skip(config))]
    pub fn start(config: &EngineConfig) -> Self {
        info!("Starting marketplace feeds");

        let (catalog_actor, catalog) = catalog::catalog(config.feed_buffer_size);
        let (posts_actor, posts) = community::community_feed(config.feed_buffer_size);
        let handles = vec![
            tokio::spawn(catalog_actor.run()),
            tokio::spawn(posts_actor.run()),
        ];

        Self {
            catalog,
            posts,
            handles,
        }
    }

    /// Stops both collections and waits for them. Errors are logged and the
    /// shutdown carries on.
    #[instrument(skip(self))]
    pub async fn shutdown(self) {
        info!("Shutting down marketplace feeds");

        let _ = self.catalog.shutdown().await;
        let _ = self.posts.shutdown().await;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Feed shutdown error");
            }
        }

        info!("Marketplace feeds stopped");
    }
}
