use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, SimpleObject)]
#[graphql(complex)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
    pub text: Option<String>,
}

/// Comment predicate; every `Some` field must match.
#[derive(Debug, Clone, Default)]
pub struct CommentWhere {
    pub id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    /// Publication state of the parent post
    pub post_published: Option<bool>,
}

impl CommentWhere {
    pub fn owned(id: Uuid, author_id: Uuid) -> Self {
        Self {
            id: Some(id),
            author_id: Some(author_id),
            ..Default::default()
        }
    }

    pub fn on_post(post_id: Uuid) -> Self {
        Self {
            post_id: Some(post_id),
            ..Default::default()
        }
    }
}
