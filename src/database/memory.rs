use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Comment, CommentPatch, CommentWhere, NewComment, NewPost, NewUser, Post, PostPatch, PostWhere, User,
    UserPatch,
};
use super::store::ResourceStore;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Tables {
    fn comment_matches(&self, filter: &CommentWhere, comment: &Comment) -> bool {
        filter.id.map_or(true, |id| comment.id == id)
            && filter.author_id.map_or(true, |author| comment.author_id == author)
            && filter.post_id.map_or(true, |post| comment.post_id == post)
            && filter.post_published.map_or(true, |published| {
                self.posts
                    .iter()
                    .any(|post| post.id == comment.post_id && post.published == published)
            })
    }

    /// Remove every comment matching `filter`, returning how many went
    fn remove_comments(&mut self, filter: &CommentWhere) -> u64 {
        let doomed: Vec<Uuid> = self
            .comments
            .iter()
            .filter(|comment| self.comment_matches(filter, comment))
            .map(|comment| comment.id)
            .collect();
        self.comments.retain(|comment| !doomed.contains(&comment.id));
        doomed.len() as u64
    }

    /// Remove a post and its comments
    fn remove_post(&mut self, id: Uuid) -> Option<Post> {
        let index = self.posts.iter().position(|post| post.id == id)?;
        let post = self.posts.remove(index);
        self.comments.retain(|comment| comment.post_id != id);
        Some(post)
    }
}

/// In-process `ResourceStore` used for development without Postgres and in tests.
///
/// Every call takes the table lock once, so multi-step operations such as
/// `unpublish_post` are atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str) -> DatabaseError {
    DatabaseError::NotFound(format!("{} not found", what))
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_user(&self, data: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|user| user.email == data.email) {
            return Err(DatabaseError::UniqueViolation("Email".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password: data.password,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.email == email).cloned())
    }

    async fn users(&self, name_contains: Option<&str>) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        let needle = name_contains.map(str::to_lowercase);
        Ok(tables
            .users
            .iter()
            .filter(|user| {
                needle
                    .as_deref()
                    .map_or(true, |needle| user.name.to_lowercase().contains(needle))
            })
            .cloned()
            .collect())
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &patch.email {
            if tables.users.iter().any(|user| user.id != id && &user.email == email) {
                return Err(DatabaseError::UniqueViolation("Email".to_string()));
            }
        }

        let user = tables
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| not_found("User"))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(password) = patch.password {
            user.password = password;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .users
            .iter()
            .position(|user| user.id == id)
            .ok_or_else(|| not_found("User"))?;
        let user = tables.users.remove(index);

        let owned_posts: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();
        for post_id in owned_posts {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|comment| comment.author_id != id);
        Ok(user)
    }

    async fn create_post(&self, data: NewPost) -> Result<Post, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|user| user.id == data.author_id) {
            return Err(not_found("Author"));
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: data.title,
            body: data.body,
            published: data.published,
            author_id: data.author_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn post_exists(&self, filter: &PostWhere) -> Result<bool, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().any(|post| filter.matches(post)))
    }

    async fn posts(&self, filter: &PostWhere) -> Result<Vec<Post>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().filter(|post| filter.matches(post)).cloned().collect())
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Post, DatabaseError> {
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| not_found("Post"))?;
        apply_post_patch(post, patch);
        Ok(post.clone())
    }

    async fn unpublish_post(&self, id: Uuid, patch: PostPatch) -> Result<(Post, u64), DatabaseError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .posts
            .iter()
            .position(|post| post.id == id)
            .ok_or_else(|| not_found("Post"))?;

        let removed = if tables.posts[index].published {
            tables.remove_comments(&CommentWhere::on_post(id))
        } else {
            0
        };

        let post = &mut tables.posts[index];
        apply_post_patch(post, patch);
        Ok((post.clone(), removed))
    }

    async fn delete_post(&self, id: Uuid) -> Result<Post, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.remove_post(id).ok_or_else(|| not_found("Post"))
    }

    async fn create_comment(&self, data: NewComment) -> Result<Comment, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|user| user.id == data.author_id) {
            return Err(not_found("Author"));
        }
        if !tables.posts.iter().any(|post| post.id == data.post_id) {
            return Err(not_found("Post"));
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            text: data.text,
            author_id: data.author_id,
            post_id: data.post_id,
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn comment_exists(&self, filter: &CommentWhere) -> Result<bool, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .any(|comment| tables.comment_matches(filter, comment)))
    }

    async fn comments(&self, filter: &CommentWhere) -> Result<Vec<Comment>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .filter(|comment| tables.comment_matches(filter, comment))
            .cloned()
            .collect())
    }

    async fn update_comment(&self, id: Uuid, patch: CommentPatch) -> Result<Comment, DatabaseError> {
        let mut tables = self.tables.write().await;
        let comment = tables
            .comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or_else(|| not_found("Comment"))?;
        if let Some(text) = patch.text {
            comment.text = text;
        }
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<Comment, DatabaseError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .comments
            .iter()
            .position(|comment| comment.id == id)
            .ok_or_else(|| not_found("Comment"))?;
        Ok(tables.comments.remove(index))
    }

    async fn delete_comments(&self, filter: &CommentWhere) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.remove_comments(filter))
    }
}

fn apply_post_patch(post: &mut Post, patch: PostPatch) {
    if let Some(title) = patch.title {
        post.title = title;
    }
    if let Some(body) = patch.body {
        post.body = body;
    }
    if let Some(published) = patch.published {
        post.published = published;
    }
    post.updated_at = Utc::now();
}
