use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::inputs::{
    AuthPayload, CreateCommentInput, CreatePostInput, CreateUserInput, LoginUserInput, UpdateCommentInput,
    UpdatePostInput, UpdateUserInput,
};
use super::{request, service};
use crate::database::models::{Comment, Post, User};
use crate::error::GraphQLResultExt;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Sign up and receive a token
    async fn create_user(&self, ctx: &Context<'_>, data: CreateUserInput) -> Result<AuthPayload> {
        service(ctx)?.create_user(data).await.into_gql()
    }

    async fn login_user(&self, ctx: &Context<'_>, data: LoginUserInput) -> Result<AuthPayload> {
        service(ctx)?.login_user(data).await.into_gql()
    }

    /// Update the authenticated user
    async fn update_user(&self, ctx: &Context<'_>, data: UpdateUserInput) -> Result<User> {
        service(ctx)?.update_user(&request(ctx), data).await.into_gql()
    }

    /// Delete the authenticated user with their posts and comments
    async fn delete_user(&self, ctx: &Context<'_>) -> Result<User> {
        service(ctx)?.delete_user(&request(ctx)).await.into_gql()
    }

    async fn create_post(&self, ctx: &Context<'_>, data: CreatePostInput) -> Result<Post> {
        service(ctx)?.create_post(&request(ctx), data).await.into_gql()
    }

    /// Setting `published: false` on a published post deletes its comments
    async fn update_post(&self, ctx: &Context<'_>, id: Uuid, data: UpdatePostInput) -> Result<Post> {
        service(ctx)?.update_post(&request(ctx), id, data).await.into_gql()
    }

    async fn delete_post(&self, ctx: &Context<'_>, id: Uuid) -> Result<Post> {
        service(ctx)?.delete_post(&request(ctx), id).await.into_gql()
    }

    /// Comment on a published post
    async fn create_comment(&self, ctx: &Context<'_>, data: CreateCommentInput) -> Result<Comment> {
        service(ctx)?.create_comment(&request(ctx), data).await.into_gql()
    }

    async fn update_comment(&self, ctx: &Context<'_>, id: Uuid, data: UpdateCommentInput) -> Result<Comment> {
        service(ctx)?.update_comment(&request(ctx), id, data).await.into_gql()
    }

    async fn delete_comment(&self, ctx: &Context<'_>, id: Uuid) -> Result<Comment> {
        service(ctx)?.delete_comment(&request(ctx), id).await.into_gql()
    }
}
