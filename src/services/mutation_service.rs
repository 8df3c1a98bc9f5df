use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Identity, RequestContext, TokenService};
use crate::database::models::{
    Comment, CommentPatch, CommentWhere, NewComment, NewPost, NewUser, Post, PostPatch, PostWhere, User,
    UserPatch,
};
use crate::database::ResourceStore;
use crate::error::ApiError;
use crate::graphql::inputs::{
    AuthPayload, CreateCommentInput, CreatePostInput, CreateUserInput, LoginUserInput, UpdateCommentInput,
    UpdatePostInput, UpdateUserInput,
};

/// Returned for ownership failures; never says whether the resource exists.
pub const OPERATION_FAILED: &str = "Operation failed";
/// Returned for every failed login, whichever check failed.
pub const LOGIN_FAILED: &str = "Unable to login";
pub const POST_NOT_FOUND: &str = "Post not found";

/// Authenticated-mutation guard.
///
/// Every mutation runs `Unauthenticated -> IdentityVerified -> Authorized -> Mutated`,
/// rejecting at the identity gate (`ApiError::Authentication`) or the ownership
/// gate (`ApiError::Authorization`). Store errors propagate unchanged and are
/// never retried.
#[derive(Clone)]
pub struct MutationService {
    store: Arc<dyn ResourceStore>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl MutationService {
    pub fn new(store: Arc<dyn ResourceStore>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn token_for(&self, user: User) -> Result<AuthPayload, ApiError> {
        let token = self.tokens.issue(user.id).map_err(|e| {
            tracing::error!("Token issuance failed: {}", e);
            ApiError::internal_server_error("Unable to issue token")
        })?;
        Ok(AuthPayload { user, token })
    }

    /// Ownership gate: `owned` is the result of an id+author existence query.
    fn authorize(identity: &Identity, kind: &str, id: Uuid, owned: bool) -> Result<(), ApiError> {
        if owned {
            debug!("User {} authorized for {} {}", identity.user_id, kind, id);
            Ok(())
        } else {
            warn!("User {} denied access to {} {}", identity.user_id, kind, id);
            Err(ApiError::authorization(OPERATION_FAILED))
        }
    }

    async fn authorize_post(&self, identity: &Identity, id: Uuid) -> Result<(), ApiError> {
        let owned = self.store.post_exists(&PostWhere::owned(id, identity.user_id)).await?;
        Self::authorize(identity, "post", id, owned)
    }

    async fn authorize_comment(&self, identity: &Identity, id: Uuid) -> Result<(), ApiError> {
        let owned = self
            .store
            .comment_exists(&CommentWhere::owned(id, identity.user_id))
            .await?;
        Self::authorize(identity, "comment", id, owned)
    }

    // Users

    pub async fn create_user(&self, data: CreateUserInput) -> Result<AuthPayload, ApiError> {
        validate_name(&data.name)?;
        validate_email_format(&data.email)?;
        let password = hash_password(data.password, self.bcrypt_cost).await?;

        let user = self
            .store
            .create_user(NewUser {
                name: data.name,
                email: data.email,
                password,
            })
            .await?;

        info!("Created user {}", user.id);
        self.token_for(user)
    }

    pub async fn login_user(&self, data: LoginUserInput) -> Result<AuthPayload, ApiError> {
        let Some(user) = self.store.user_by_email(&data.email).await? else {
            debug!("Login failed: unknown email");
            return Err(ApiError::authentication(LOGIN_FAILED));
        };

        if !verify_password(data.password, user.password.clone()).await? {
            debug!("Login failed: password mismatch for user {}", user.id);
            return Err(ApiError::authentication(LOGIN_FAILED));
        }

        debug!("User {} logged in", user.id);
        self.token_for(user)
    }

    pub async fn update_user(&self, request: &RequestContext, data: UpdateUserInput) -> Result<User, ApiError> {
        let identity = self.tokens.identify(request)?;

        if let Some(name) = &data.name {
            validate_name(name)?;
        }
        if let Some(email) = &data.email {
            validate_email_format(email)?;
        }
        let password = match data.password {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };

        let user = self
            .store
            .update_user(
                identity.user_id,
                UserPatch {
                    name: data.name,
                    email: data.email,
                    password,
                },
            )
            .await?;
        info!("Updated user {}", user.id);
        Ok(user)
    }

    pub async fn delete_user(&self, request: &RequestContext) -> Result<User, ApiError> {
        let identity = self.tokens.identify(request)?;
        let user = self.store.delete_user(identity.user_id).await?;
        info!("Deleted user {}", user.id);
        Ok(user)
    }

    // Posts

    pub async fn create_post(&self, request: &RequestContext, data: CreatePostInput) -> Result<Post, ApiError> {
        let identity = self.tokens.identify(request)?;

        let post = self
            .store
            .create_post(NewPost {
                title: data.title,
                body: data.body,
                published: data.published,
                author_id: identity.user_id,
            })
            .await?;
        info!("User {} created post {}", identity.user_id, post.id);
        Ok(post)
    }

    pub async fn update_post(
        &self,
        request: &RequestContext,
        id: Uuid,
        data: UpdatePostInput,
    ) -> Result<Post, ApiError> {
        let identity = self.tokens.identify(request)?;
        self.authorize_post(&identity, id).await?;

        let patch = PostPatch {
            title: data.title,
            body: data.body,
            published: data.published,
        };

        // Unpublishing a published post drops its comments in the same transaction
        if patch.published == Some(false) {
            let (post, removed) = self.store.unpublish_post(id, patch).await?;
            info!("User {} unpublished post {} ({} comments removed)", identity.user_id, id, removed);
            return Ok(post);
        }

        let post = self.store.update_post(id, patch).await?;
        info!("User {} updated post {}", identity.user_id, id);
        Ok(post)
    }

    pub async fn delete_post(&self, request: &RequestContext, id: Uuid) -> Result<Post, ApiError> {
        let identity = self.tokens.identify(request)?;
        self.authorize_post(&identity, id).await?;

        let post = self.store.delete_post(id).await?;
        info!("User {} deleted post {}", identity.user_id, id);
        Ok(post)
    }

    // Comments

    pub async fn create_comment(
        &self,
        request: &RequestContext,
        data: CreateCommentInput,
    ) -> Result<Comment, ApiError> {
        let identity = self.tokens.identify(request)?;

        if !self.store.post_exists(&PostWhere::published(data.post)).await? {
            debug!("User {} tried to comment on unavailable post {}", identity.user_id, data.post);
            return Err(ApiError::not_found(POST_NOT_FOUND));
        }

        let comment = self
            .store
            .create_comment(NewComment {
                text: data.text,
                author_id: identity.user_id,
                post_id: data.post,
            })
            .await?;
        info!("User {} commented {} on post {}", identity.user_id, comment.id, data.post);
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        request: &RequestContext,
        id: Uuid,
        data: UpdateCommentInput,
    ) -> Result<Comment, ApiError> {
        let identity = self.tokens.identify(request)?;
        self.authorize_comment(&identity, id).await?;

        let comment = self
            .store
            .update_comment(id, CommentPatch { text: data.text })
            .await?;
        info!("User {} updated comment {}", identity.user_id, id);
        Ok(comment)
    }

    pub async fn delete_comment(&self, request: &RequestContext, id: Uuid) -> Result<Comment, ApiError> {
        let identity = self.tokens.identify(request)?;
        self.authorize_comment(&identity, id).await?;

        let comment = self.store.delete_comment(id).await?;
        info!("User {} deleted comment {}", identity.user_id, id);
        Ok(comment)
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::invalid_field("name", "Name cannot be empty"));
    }
    Ok(())
}

/// Basic email shape check: one `@` with non-empty local part and a dotted domain.
fn validate_email_format(email: &str) -> Result<(), ApiError> {
    let invalid = || ApiError::invalid_field("email", "Invalid email format");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}
