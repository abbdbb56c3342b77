//! Community posts, synchronized the same way as the catalog.

use chrono::{DateTime, Utc};

use crate::domain::Post;
use crate::live_collection::{CollectionActor, CollectionClient, Record, Snapshot};

pub type PostFeed = Snapshot<Post>;
pub type PostClient = CollectionClient<Post>;

impl Record for Post {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

pub fn community_feed(buffer_size: usize) -> (CollectionActor<Post>, PostClient) {
    CollectionActor::new("community", buffer_size)
}
