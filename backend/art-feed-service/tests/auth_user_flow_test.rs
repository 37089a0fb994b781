// Sign-up, sign-in and profile picture flows against the in-memory backend.

mod common;

use art_feed_service::backend::memory::{AuthOp, BlobOp};
use art_feed_service::services::{AuthService, UserService};

// ============================================================================
// sign_up
// ============================================================================

#[tokio::test]
async fn test_sign_up_with_picture_sets_name_and_photo() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    let image = common::image_file("png", b"avatar");

    let profile = auth
        .sign_up("alice@example.com", "secret1", "alice", Some(&common::local_uri(&image)))
        .await
        .expect("sign up should succeed");

    assert_eq!(profile.display_name.as_deref(), Some("alice"));
    let photo = profile.photo_url.clone().expect("photo should be set");
    let object = backend.blobs.resolve_url(&photo).await.unwrap();
    assert_eq!(object.body, b"avatar");
    assert_eq!(object.content_type, "image/png");

    assert_eq!(auth.current_user().await, Some(profile));
}

#[tokio::test]
async fn test_sign_up_without_picture() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());

    let profile = auth
        .sign_up("bob@example.com", "secret1", "bob", None)
        .await
        .unwrap();

    assert_eq!(profile.display_name.as_deref(), Some("bob"));
    assert!(profile.photo_url.is_none());
    assert_eq!(backend.blobs.count().await, 0);
}

#[tokio::test]
async fn test_sign_up_continues_when_picture_upload_fails() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    let image = common::image_file("jpg", b"avatar");
    backend.blobs.fail_next(BlobOp::Upload).await;

    let profile = auth
        .sign_up("carol@example.com", "secret1", "carol", Some(&common::local_uri(&image)))
        .await
        .expect("account is still created");

    assert_eq!(profile.display_name.as_deref(), Some("carol"));
    assert!(profile.photo_url.is_none());
}

#[tokio::test]
async fn test_sign_up_profile_update_failure_leaves_nameless_account() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    backend.auth.fail_next(AuthOp::UpdateProfile).await;

    let profile = auth
        .sign_up("dave@example.com", "secret1", "dave", None)
        .await
        .expect("account exists even though the name was not set");

    assert!(profile.display_name.is_none());
    let stored = backend.auth.account("dave@example.com").await.unwrap();
    assert!(stored.display_name.is_none());
}

#[tokio::test]
async fn test_sign_up_rejects_duplicate_email() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());

    assert!(auth.sign_up("erin@example.com", "secret1", "erin", None).await.is_some());
    assert!(auth.sign_up("Erin@Example.com", "other12", "erin2", None).await.is_none());

    let stored = backend.auth.account("erin@example.com").await.unwrap();
    assert_eq!(stored.display_name.as_deref(), Some("erin"));
}

#[tokio::test]
async fn test_sign_up_rejects_weak_password_and_bad_email() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());

    assert!(auth.sign_up("frank@example.com", "123", "frank", None).await.is_none());
    assert!(auth.sign_up("not-an-email", "secret1", "frank", None).await.is_none());
    assert!(backend.auth.account("frank@example.com").await.is_none());
}

#[tokio::test]
async fn test_sign_up_accepts_padded_email_and_signs_in_normalized() {
    let auth = AuthService::new(common::backend().client());

    let created = auth
        .sign_up("  Nora@Example.com ", "secret1", "nora", None)
        .await
        .expect("padded email is normalized before validation");
    assert_eq!(created.email, "nora@example.com");

    auth.sign_out().await;
    let signed_in = auth.sign_in("nora@example.com", "secret1").await.unwrap();
    assert_eq!(signed_in.uid, created.uid);
}

// ============================================================================
// sign_in / sign_out
// ============================================================================

#[tokio::test]
async fn test_sign_in_checks_password() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    let created = auth.sign_up("gina@example.com", "secret1", "gina", None).await.unwrap();
    auth.sign_out().await;

    assert!(auth.sign_in("gina@example.com", "wrong-password").await.is_none());
    assert!(auth.current_user().await.is_none());

    let signed_in = auth.sign_in("gina@example.com", "secret1").await.unwrap();
    assert_eq!(signed_in.uid, created.uid);
    assert_eq!(signed_in.display_name.as_deref(), Some("gina"));
}

#[tokio::test]
async fn test_sign_in_unknown_email() {
    let auth = AuthService::new(common::backend().client());
    assert!(auth.sign_in("nobody@example.com", "secret1").await.is_none());
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let auth = AuthService::new(common::backend().client());
    auth.sign_up("hank@example.com", "secret1", "hank", None).await.unwrap();
    assert!(auth.current_user().await.is_some());

    auth.sign_out().await;

    assert!(auth.current_user().await.is_none());
}

// ============================================================================
// update_profile_picture
// ============================================================================

#[tokio::test]
async fn test_update_picture_without_user_does_nothing() {
    let backend = common::backend();
    let users = UserService::new(backend.client());
    let image = common::image_file("jpg", b"pic");

    let result = users.update_profile_picture(None, &common::local_uri(&image)).await;

    assert!(result.is_none());
    assert_eq!(backend.blobs.count().await, 0);
}

#[tokio::test]
async fn test_update_picture_replaces_photo() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    let users = UserService::new(backend.client());
    let user = auth.sign_up("ivy@example.com", "secret1", "ivy", None).await.unwrap();
    let image = common::image_file("jpg", b"new-pic");

    let updated = users
        .update_profile_picture(Some(&user), &common::local_uri(&image))
        .await
        .expect("picture should be updated");

    assert_eq!(updated.uid, user.uid);
    assert_eq!(updated.display_name.as_deref(), Some("ivy"));
    let photo = updated.photo_url.clone().unwrap();
    assert_eq!(backend.blobs.resolve_url(&photo).await.unwrap().body, b"new-pic");
    assert_eq!(auth.current_user().await, Some(updated));
}

#[tokio::test]
async fn test_update_picture_upload_failure_keeps_old_photo() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    let users = UserService::new(backend.client());
    let first = common::image_file("jpg", b"first");
    let user = auth
        .sign_up("jack@example.com", "secret1", "jack", Some(&common::local_uri(&first)))
        .await
        .unwrap();
    let second = common::image_file("jpg", b"second");
    backend.blobs.fail_next(BlobOp::Upload).await;

    let result = users.update_profile_picture(Some(&user), &common::local_uri(&second)).await;

    assert!(result.is_none());
    let stored = backend.auth.account("jack@example.com").await.unwrap();
    assert_eq!(stored.photo_url, user.photo_url);
}

#[tokio::test]
async fn test_update_picture_after_sign_out_does_nothing() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    let users = UserService::new(backend.client());
    let user = auth.sign_up("kate@example.com", "secret1", "kate", None).await.unwrap();
    auth.sign_out().await;
    let image = common::image_file("jpg", b"late-pic");

    let result = users.update_profile_picture(Some(&user), &common::local_uri(&image)).await;

    assert!(result.is_none());
    assert_eq!(backend.blobs.count().await, 0);
    let stored = backend.auth.account("kate@example.com").await.unwrap();
    assert!(stored.photo_url.is_none());
}

#[tokio::test]
async fn test_update_picture_for_other_user_does_nothing() {
    let backend = common::backend();
    let auth = AuthService::new(backend.client());
    let users = UserService::new(backend.client());
    let first = auth.sign_up("liam@example.com", "secret1", "liam", None).await.unwrap();
    auth.sign_up("mona@example.com", "secret1", "mona", None).await.unwrap();
    let image = common::image_file("jpg", b"pic");

    let result = users.update_profile_picture(Some(&first), &common::local_uri(&image)).await;

    assert!(result.is_none());
    assert_eq!(backend.blobs.count().await, 0);
    assert!(backend.auth.account("liam@example.com").await.unwrap().photo_url.is_none());
}
