use async_trait::async_trait;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    Comment, CommentPatch, CommentWhere, NewComment, NewPost, NewUser, Post, PostPatch, PostWhere, User,
    UserPatch,
};
use super::store::ResourceStore;

const POST_FILTER: &str = r#"
    ($1::uuid IS NULL OR id = $1)
    AND ($2::uuid IS NULL OR author_id = $2)
    AND ($3::bool IS NULL OR published = $3)
    AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%' OR body ILIKE '%' || $4 || '%')
"#;

const COMMENT_FILTER: &str = r#"
    ($1::uuid IS NULL OR c.id = $1)
    AND ($2::uuid IS NULL OR c.author_id = $2)
    AND ($3::uuid IS NULL OR c.post_id = $3)
    AND ($4::bool IS NULL OR p.published = $4)
"#;

/// `ResourceStore` backed by Postgres. Cascades come from the schema's
/// `ON DELETE CASCADE` foreign keys.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique-key violation into a domain error
fn map_unique(err: sqlx::Error, field: &str) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return DatabaseError::UniqueViolation(field.to_string());
        }
    }
    DatabaseError::Sqlx(err)
}

/// Translate a foreign-key violation (the referenced author or post is gone)
/// into `NotFound`, so a stale token fails the same way as on `MemoryStore`.
fn map_reference(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            let what = match db_err.constraint() {
                Some(constraint) if constraint.contains("post_id") => "Post",
                _ => "Author",
            };
            return DatabaseError::NotFound(format!("{} not found", what));
        }
    }
    DatabaseError::Sqlx(err)
}

async fn delete_matching_comments<'e, E>(executor: E, filter: &CommentWhere) -> Result<u64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "DELETE FROM comments WHERE id IN (SELECT c.id FROM comments c JOIN posts p ON p.id = c.post_id WHERE {})",
        COMMENT_FILTER
    );
    let removed = sqlx::query(&query)
        .bind(filter.id)
        .bind(filter.author_id)
        .bind(filter.post_id)
        .bind(filter.post_published)
        .execute(executor)
        .await?
        .rows_affected();
    Ok(removed)
}

fn missing<T>(row: Option<T>, what: &str) -> Result<T, DatabaseError> {
    row.ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn create_user(&self, data: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Email"))
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn users(&self, name_contains: Option<&str>) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%') ORDER BY created_at, id",
        )
        .bind(name_contains)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, DatabaseError> {
        let query = r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password = COALESCE($4, password),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#;

        let row = sqlx::query_as::<_, User>(query)
            .bind(id)
            .bind(patch.name)
            .bind(patch.email)
            .bind(patch.password)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique(e, "Email"))?;
        missing(row, "User")
    }

    async fn delete_user(&self, id: Uuid) -> Result<User, DatabaseError> {
        let row = sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        missing(row, "User")
    }

    async fn create_post(&self, data: NewPost) -> Result<Post, DatabaseError> {
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts (id, title, body, published, author_id) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(&data.body)
        .bind(data.published)
        .bind(data.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_reference)?;
        Ok(post)
    }

    async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>, DatabaseError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn post_exists(&self, filter: &PostWhere) -> Result<bool, DatabaseError> {
        let query = format!("SELECT EXISTS (SELECT 1 FROM posts WHERE {})", POST_FILTER);
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(filter.id)
            .bind(filter.author_id)
            .bind(filter.published)
            .bind(filter.search.as_deref())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn posts(&self, filter: &PostWhere) -> Result<Vec<Post>, DatabaseError> {
        let query = format!("SELECT * FROM posts WHERE {} ORDER BY created_at, id", POST_FILTER);
        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(filter.id)
            .bind(filter.author_id)
            .bind(filter.published)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Post, DatabaseError> {
        let query = r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                body = COALESCE($3, body),
                published = COALESCE($4, published),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#;

        let row = sqlx::query_as::<_, Post>(query)
            .bind(id)
            .bind(patch.title)
            .bind(patch.body)
            .bind(patch.published)
            .fetch_optional(&self.pool)
            .await?;
        missing(row, "Post")
    }

    async fn unpublish_post(&self, id: Uuid, patch: PostPatch) -> Result<(Post, u64), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Row lock holds the publication state until commit
        let published = sqlx::query_scalar::<_, bool>("SELECT published FROM posts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let published = missing(published, "Post")?;

        let removed = if published {
            delete_matching_comments(&mut *tx, &CommentWhere::on_post(id)).await?
        } else {
            0
        };

        let query = r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                body = COALESCE($3, body),
                published = COALESCE($4, published),
                updated_at = now()
            WHERE id = $1
            RETURNING *
        "#;

        let post = sqlx::query_as::<_, Post>(query)
            .bind(id)
            .bind(patch.title)
            .bind(patch.body)
            .bind(patch.published)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((post, removed))
    }

    async fn delete_post(&self, id: Uuid) -> Result<Post, DatabaseError> {
        let row = sqlx::query_as::<_, Post>("DELETE FROM posts WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        missing(row, "Post")
    }

    async fn create_comment(&self, data: NewComment) -> Result<Comment, DatabaseError> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, text, author_id, post_id) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.text)
        .bind(data.author_id)
        .bind(data.post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_reference)?;
        Ok(comment)
    }

    async fn comment_exists(&self, filter: &CommentWhere) -> Result<bool, DatabaseError> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM comments c JOIN posts p ON p.id = c.post_id WHERE {})",
            COMMENT_FILTER
        );
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(filter.id)
            .bind(filter.author_id)
            .bind(filter.post_id)
            .bind(filter.post_published)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn comments(&self, filter: &CommentWhere) -> Result<Vec<Comment>, DatabaseError> {
        let query = format!(
            "SELECT c.* FROM comments c JOIN posts p ON p.id = c.post_id WHERE {} ORDER BY c.created_at, c.id",
            COMMENT_FILTER
        );
        let comments = sqlx::query_as::<_, Comment>(&query)
            .bind(filter.id)
            .bind(filter.author_id)
            .bind(filter.post_id)
            .bind(filter.post_published)
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn update_comment(&self, id: Uuid, patch: CommentPatch) -> Result<Comment, DatabaseError> {
        let row = sqlx::query_as::<_, Comment>(
            "UPDATE comments SET text = COALESCE($2, text), updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.text)
        .fetch_optional(&self.pool)
        .await?;
        missing(row, "Comment")
    }

    async fn delete_comment(&self, id: Uuid) -> Result<Comment, DatabaseError> {
        let row = sqlx::query_as::<_, Comment>("DELETE FROM comments WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        missing(row, "Comment")
    }

    async fn delete_comments(&self, filter: &CommentWhere) -> Result<u64, DatabaseError> {
        delete_matching_comments(&self.pool, filter).await
    }
}
