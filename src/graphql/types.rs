// Relation resolvers for the store models
use async_graphql::{ComplexObject, Context, Result};

use super::{request, service};
use crate::database::models::{Comment, CommentWhere, Post, PostWhere, User};
use crate::error::{ApiError, GraphQLResultExt};

#[ComplexObject]
impl User {
    /// Only visible to the user themself
    async fn email(&self, ctx: &Context<'_>) -> Result<Option<String>> {
        let viewer = service(ctx)?.tokens().identify_optional(&request(ctx)).into_gql()?;

        Ok(viewer
            .filter(|identity| identity.user_id == self.id)
            .map(|_| self.email.clone()))
    }

    /// Published posts by this user
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let filter = PostWhere {
            author_id: Some(self.id),
            published: Some(true),
            ..Default::default()
        };
        service(ctx)?.store().posts(&filter).await.map_err(ApiError::from).into_gql()
    }

    /// This user's comments on published posts
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        let filter = CommentWhere {
            author_id: Some(self.id),
            post_published: Some(true),
            ..Default::default()
        };
        service(ctx)?.store().comments(&filter).await.map_err(ApiError::from).into_gql()
    }
}

#[ComplexObject]
impl Post {
    async fn author(&self, ctx: &Context<'_>) -> Result<User> {
        service(ctx)?
            .store()
            .user_by_id(self.author_id)
            .await
            .map_err(ApiError::from)
            .and_then(|user| user.ok_or_else(|| ApiError::not_found("Author not found")))
            .into_gql()
    }

    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        service(ctx)?
            .store()
            .comments(&CommentWhere::on_post(self.id))
            .await
            .map_err(ApiError::from)
            .into_gql()
    }
}

#[ComplexObject]
impl Comment {
    async fn author(&self, ctx: &Context<'_>) -> Result<User> {
        service(ctx)?
            .store()
            .user_by_id(self.author_id)
            .await
            .map_err(ApiError::from)
            .and_then(|user| user.ok_or_else(|| ApiError::not_found("Author not found")))
            .into_gql()
    }

    async fn post(&self, ctx: &Context<'_>) -> Result<Post> {
        service(ctx)?
            .store()
            .post_by_id(self.post_id)
            .await
            .map_err(ApiError::from)
            .and_then(|post| post.ok_or_else(|| ApiError::not_found(crate::services::mutation_service::POST_NOT_FOUND)))
            .into_gql()
    }
}
