use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A community feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            body: body.into(),
            image_url: None,
            created_at: Utc::now(),
        }
    }
}
