use async_graphql::{InputObject, SimpleObject};
use uuid::Uuid;

use crate::database::models::User;

#[derive(Debug, Clone, InputObject)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, InputObject)]
pub struct LoginUserInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, InputObject)]
pub struct CreatePostInput {
    pub title: String,
    pub body: String,
    pub published: bool,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, InputObject)]
pub struct CreateCommentInput {
    pub text: String,
    /// Id of the post being commented on
    pub post: Uuid,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateCommentInput {
    pub text: Option<String>,
}

/// Result of signup and login
#[derive(Debug, Clone, SimpleObject)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}
