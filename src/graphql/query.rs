use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::{request, service};
use crate::database::models::{Comment, CommentWhere, Post, PostWhere, User};
use crate::error::{ApiError, GraphQLResultExt};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The authenticated user
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let service = service(ctx)?;
        let identity = service.tokens().identify(&request(ctx)).into_gql()?;

        service
            .store()
            .user_by_id(identity.user_id)
            .await
            .map_err(ApiError::from)
            .and_then(|user| user.ok_or_else(|| ApiError::not_found("User not found")))
            .into_gql()
    }

    async fn users(&self, ctx: &Context<'_>, query: Option<String>) -> Result<Vec<User>> {
        service(ctx)?
            .store()
            .users(query.as_deref())
            .await
            .map_err(ApiError::from)
            .into_gql()
    }

    /// Published posts, optionally matching `query` in title or body
    async fn posts(&self, ctx: &Context<'_>, query: Option<String>) -> Result<Vec<Post>> {
        let filter = PostWhere {
            published: Some(true),
            search: query,
            ..Default::default()
        };
        service(ctx)?.store().posts(&filter).await.map_err(ApiError::from).into_gql()
    }

    /// The authenticated user's posts, drafts included
    async fn my_posts(&self, ctx: &Context<'_>, query: Option<String>) -> Result<Vec<Post>> {
        let service = service(ctx)?;
        let identity = service.tokens().identify(&request(ctx)).into_gql()?;

        let filter = PostWhere {
            author_id: Some(identity.user_id),
            search: query,
            ..Default::default()
        };
        service.store().posts(&filter).await.map_err(ApiError::from).into_gql()
    }

    /// A published post, or one of the caller's own drafts
    async fn post(&self, ctx: &Context<'_>, id: Uuid) -> Result<Option<Post>> {
        let service = service(ctx)?;
        let viewer = service.tokens().identify_optional(&request(ctx)).into_gql()?;

        let post = service.store().post_by_id(id).await.map_err(ApiError::from).into_gql()?;
        Ok(post.filter(|post| {
            post.published || viewer.map_or(false, |identity| identity.user_id == post.author_id)
        }))
    }

    /// Comments on published posts
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        let filter = CommentWhere {
            post_published: Some(true),
            ..Default::default()
        };
        service(ctx)?.store().comments(&filter).await.map_err(ApiError::from).into_gql()
    }
}
