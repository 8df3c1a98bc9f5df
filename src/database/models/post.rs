use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, SimpleObject)]
#[graphql(complex)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub published: bool,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub published: Option<bool>,
}

/// Post predicate; every `Some` field must match.
#[derive(Debug, Clone, Default)]
pub struct PostWhere {
    pub id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub published: Option<bool>,
    /// Case-insensitive substring of title or body
    pub search: Option<String>,
}

impl PostWhere {
    /// The ownership predicate: this post, written by this author.
    pub fn owned(id: Uuid, author_id: Uuid) -> Self {
        Self {
            id: Some(id),
            author_id: Some(author_id),
            ..Default::default()
        }
    }

    pub fn published(id: Uuid) -> Self {
        Self {
            id: Some(id),
            published: Some(true),
            ..Default::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.id.map_or(true, |id| post.id == id)
            && self.author_id.map_or(true, |author| post.author_id == author)
            && self.published.map_or(true, |published| post.published == published)
            && self.search.as_deref().map_or(true, |needle| {
                let needle = needle.to_lowercase();
                post.title.to_lowercase().contains(&needle) || post.body.to_lowercase().contains(&needle)
            })
    }
}
