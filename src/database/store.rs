use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Comment, CommentPatch, CommentWhere, NewComment, NewPost, NewUser, Post, PostPatch, PostWhere, User,
    UserPatch,
};

/// Persistence boundary for users, posts and comments.
///
/// Implementations enforce referential cascades: deleting a user removes their
/// posts and comments, deleting a post removes its comments. Update and delete
/// by id return `DatabaseError::NotFound` when the row is gone, and creating a
/// post or comment whose author or post no longer exists does the same.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn create_user(&self, data: NewUser) -> Result<User, DatabaseError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    /// Users ordered by creation, optionally filtered by a case-insensitive name substring
    async fn users(&self, name_contains: Option<&str>) -> Result<Vec<User>, DatabaseError>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, DatabaseError>;
    async fn delete_user(&self, id: Uuid) -> Result<User, DatabaseError>;

    async fn create_post(&self, data: NewPost) -> Result<Post, DatabaseError>;
    async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>, DatabaseError>;
    async fn post_exists(&self, filter: &PostWhere) -> Result<bool, DatabaseError>;
    async fn posts(&self, filter: &PostWhere) -> Result<Vec<Post>, DatabaseError>;
    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Post, DatabaseError>;
    /// Apply `patch`, first deleting every comment on the post if it is published
    /// at that moment. The check, the delete and the update are one atomic unit.
    /// Returns the updated post and the number of comments removed.
    async fn unpublish_post(&self, id: Uuid, patch: PostPatch) -> Result<(Post, u64), DatabaseError>;
    async fn delete_post(&self, id: Uuid) -> Result<Post, DatabaseError>;

    async fn create_comment(&self, data: NewComment) -> Result<Comment, DatabaseError>;
    async fn comment_exists(&self, filter: &CommentWhere) -> Result<bool, DatabaseError>;
    async fn comments(&self, filter: &CommentWhere) -> Result<Vec<Comment>, DatabaseError>;
    async fn update_comment(&self, id: Uuid, patch: CommentPatch) -> Result<Comment, DatabaseError>;
    async fn delete_comment(&self, id: Uuid) -> Result<Comment, DatabaseError>;
    async fn delete_comments(&self, filter: &CommentWhere) -> Result<u64, DatabaseError>;
}
