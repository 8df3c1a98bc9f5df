// Store-level behaviour against a live Postgres. Every test returns early
// when DATABASE_URL is unset.
mod common;

use anyhow::Result;
use blog_api_rust::auth::RequestContext;
use blog_api_rust::database::models::{CommentWhere, NewComment, Post, PostPatch, PostWhere};
use blog_api_rust::database::{DatabaseError, ResourceStore};
use blog_api_rust::graphql::inputs::{CreateCommentInput, CreatePostInput, UpdatePostInput, UpdateUserInput};
use blog_api_rust::services::mutation_service::OPERATION_FAILED;
use blog_api_rust::ApiError;
use uuid::Uuid;

use common::TestApp;

/// Rows outlive a run, so names (and the emails derived from them) must not repeat
fn unique(name: &str) -> String {
    format!("{}{}", name, Uuid::new_v4().simple())
}

async fn post_by(app: &TestApp, request: &RequestContext, title: &str, published: bool) -> Result<Post> {
    let post = app
        .service()
        .create_post(
            request,
            CreatePostInput {
                title: title.to_string(),
                body: "Body text".to_string(),
                published,
            },
        )
        .await?;
    Ok(post)
}

async fn comment_on(app: &TestApp, request: &RequestContext, post: Uuid) -> Result<()> {
    app.service()
        .create_comment(request, CreateCommentInput { text: "hello".to_string(), post })
        .await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let jess = unique("Jess");
    let (first, _) = app.signup(&jess).await?;

    let err = app.signup(&jess).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Conflict(_))));

    let (_, sam) = app.signup(&unique("Sam")).await?;
    let err = app
        .service()
        .update_user(
            &sam,
            UpdateUserInput {
                email: Some(first.email.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn foreign_post_is_denied_and_unchanged() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let (_, alice) = app.signup(&unique("Alice")).await?;
    let (_, bob) = app.signup(&unique("Bob")).await?;
    let post = post_by(&app, &alice, "Original", true).await?;

    let update = UpdatePostInput {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let err = app.service().update_post(&bob, post.id, update).await.unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
    assert_eq!(err.message(), OPERATION_FAILED);

    let err = app.service().delete_post(&bob, post.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));

    let stored = app.store.post_by_id(post.id).await?.expect("post still present");
    assert_eq!(stored.title, "Original");
    Ok(())
}

#[tokio::test]
async fn partial_update_keeps_other_columns() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let (_, alice) = app.signup(&unique("Alice")).await?;
    let post = post_by(&app, &alice, "Draft", false).await?;

    let update = UpdatePostInput {
        title: Some("Final".to_string()),
        ..Default::default()
    };
    let updated = app.service().update_post(&alice, post.id, update).await?;
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.body, "Body text");
    assert!(!updated.published);
    Ok(())
}

#[tokio::test]
async fn unpublishing_removes_only_that_posts_comments() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let (_, alice) = app.signup(&unique("Alice")).await?;
    let (_, bob) = app.signup(&unique("Bob")).await?;
    let target = post_by(&app, &alice, "Live", true).await?;
    let other = post_by(&app, &alice, "Also live", true).await?;
    comment_on(&app, &bob, target.id).await?;
    comment_on(&app, &bob, target.id).await?;
    comment_on(&app, &bob, other.id).await?;

    let update = UpdatePostInput {
        published: Some(false),
        ..Default::default()
    };
    let updated = app.service().update_post(&alice, target.id, update).await?;

    assert!(!updated.published);
    assert!(app.store.comments(&CommentWhere::on_post(target.id)).await?.is_empty());
    assert_eq!(app.store.comments(&CommentWhere::on_post(other.id)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unpublishing_a_draft_removes_nothing() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let (alice_user, alice) = app.signup(&unique("Alice")).await?;
    let draft = post_by(&app, &alice, "Draft", false).await?;
    app.store
        .create_comment(NewComment {
            text: "early".to_string(),
            author_id: alice_user.id,
            post_id: draft.id,
        })
        .await?;

    let patch = PostPatch {
        published: Some(false),
        ..Default::default()
    };
    let (post, removed) = app.store.unpublish_post(draft.id, patch).await?;
    assert!(!post.published);
    assert_eq!(removed, 0);
    assert_eq!(app.store.comments(&CommentWhere::on_post(draft.id)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn unpublish_of_missing_post_is_not_found() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let err = app
        .store
        .unpublish_post(Uuid::new_v4(), PostPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn drafts_are_filtered_and_search_ignores_case() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let (alice_user, alice) = app.signup(&unique("Alice")).await?;
    let marker = Uuid::new_v4().simple().to_string();
    let public = post_by(&app, &alice, &format!("Public {}", marker.to_uppercase()), true).await?;
    let draft = post_by(&app, &alice, &format!("Secret {}", marker.to_uppercase()), false).await?;

    let visible = PostWhere {
        published: Some(true),
        search: Some(marker.clone()),
        ..Default::default()
    };
    let posts = app.store.posts(&visible).await?;
    assert_eq!(posts.iter().map(|post| post.id).collect::<Vec<_>>(), vec![public.id]);

    let mine = PostWhere {
        author_id: Some(alice_user.id),
        search: Some(marker),
        ..Default::default()
    };
    assert_eq!(app.store.posts(&mine).await?.len(), 2);

    app.store
        .create_comment(NewComment {
            text: "hidden".to_string(),
            author_id: alice_user.id,
            post_id: draft.id,
        })
        .await?;
    let on_published = CommentWhere {
        post_published: Some(true),
        ..CommentWhere::on_post(draft.id)
    };
    assert!(app.store.comments(&on_published).await?.is_empty());
    assert_eq!(app.store.comments(&CommentWhere::on_post(draft.id)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_comments_honours_the_filter() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let (alice_user, alice) = app.signup(&unique("Alice")).await?;
    let (_, bob) = app.signup(&unique("Bob")).await?;
    let post = post_by(&app, &alice, "Live", true).await?;
    comment_on(&app, &alice, post.id).await?;
    comment_on(&app, &bob, post.id).await?;

    let by_alice = CommentWhere {
        author_id: Some(alice_user.id),
        ..CommentWhere::on_post(post.id)
    };
    assert_eq!(app.store.delete_comments(&by_alice).await?, 1);
    assert_eq!(app.store.comments(&CommentWhere::on_post(post.id)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn token_of_deleted_user_cannot_create_content() -> Result<()> {
    let Some(app) = TestApp::postgres().await? else { return Ok(()) };
    let (_, alice) = app.signup(&unique("Alice")).await?;
    let (_, bob) = app.signup(&unique("Bob")).await?;
    let post = post_by(&app, &alice, "Live", true).await?;
    app.service().delete_user(&bob).await?;

    let err = post_by(&app, &bob, "Ghost", true).await.unwrap_err();
    let err = err.downcast_ref::<ApiError>().expect("api error");
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.message(), "Author not found");

    let err = app
        .service()
        .create_comment(&bob, CreateCommentInput { text: "boo".to_string(), post: post.id })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    Ok(())
}
