//! The product catalog as seen by the cart: a live collection of [`Product`]s.

pub mod entity;

use crate::domain::Product;
use crate::live_collection::{CollectionActor, CollectionClient, Snapshot};

pub type CatalogSnapshot = Snapshot<Product>;
pub type CatalogClient = CollectionClient<Product>;
pub type CatalogActor = CollectionActor<Product>;

pub fn catalog(buffer_size: usize) -> (CatalogActor, CatalogClient) {
    CollectionActor::new("catalog", buffer_size)
}
