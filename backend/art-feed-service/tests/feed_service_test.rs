// Feed, profile and search conventions over stored posts.

mod common;

use art_feed_service::backend::memory::{DocOp, MemoryBackend};
use art_feed_service::backend::POSTS;
use art_feed_service::domain::Post;
use art_feed_service::repository::PostRepository;
use art_feed_service::services::FeedService;

async fn seed(backend: &MemoryBackend, id: &str, title: &str, author: &str, date: &str, likes: &[&str]) {
    let post = Post {
        title: title.to_string(),
        author: author.to_string(),
        author_picture: format!("https://img/{}-{}.png", author, id),
        image_url: format!("https://img/{}.jpg", id),
        likes: likes.iter().map(|like| like.to_string()).collect(),
        date: date.to_string(),
        ..Post::default()
    };
    let data = serde_json::to_value(&post).unwrap();
    backend.documents.insert_with_id(POSTS, id, data).await;
}

async fn seeded() -> (MemoryBackend, FeedService) {
    let backend = common::backend();
    seed(&backend, "p1", "Morning", "alice", "2024-03-01T08:00:00.000Z", &["bob"]).await;
    seed(&backend, "p2", "Noon", "bob", "2024-03-02T12:00:00.000Z", &[]).await;
    seed(&backend, "p3", "Night", "alice", "2024-03-03T22:00:00.000Z", &["bob", "carol"]).await;
    let feed = FeedService::new(PostRepository::new(backend.client()));
    (backend, feed)
}

#[tokio::test]
async fn test_home_feed_is_newest_first() {
    let (_backend, feed) = seeded().await;

    let posts = feed.home_feed().await.unwrap();

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p3", "p2", "p1"]);
}

#[tokio::test]
async fn test_home_feed_propagates_store_failure() {
    let (backend, feed) = seeded().await;
    backend.documents.fail_next(DocOp::List).await;

    assert!(feed.home_feed().await.is_err());
}

#[tokio::test]
async fn test_profile_summary_totals() {
    let (_backend, feed) = seeded().await;

    let summary = feed.profile("alice").await;

    assert_eq!(summary.post_count, 2);
    assert_eq!(summary.total_likes, 3);
    assert_eq!(summary.posts[0].id, "p3");
    assert_eq!(summary.picture.as_deref(), Some("https://img/alice-p3.png"));
}

#[tokio::test]
async fn test_profile_of_unknown_user_is_empty() {
    let (_backend, feed) = seeded().await;

    let summary = feed.profile("nobody").await;

    assert_eq!(summary.post_count, 0);
    assert_eq!(summary.total_likes, 0);
    assert!(summary.picture.is_none());
}

#[tokio::test]
async fn test_profile_query_failure_reads_as_empty() {
    let (backend, feed) = seeded().await;
    backend.documents.fail_next(DocOp::Query).await;

    assert_eq!(feed.profile("alice").await.post_count, 0);
}

#[tokio::test]
async fn test_blank_search_skips_store() {
    let (backend, feed) = seeded().await;
    // An armed fault would surface if the store were touched
    backend.documents.fail_next(DocOp::List).await;

    assert!(feed.search("").await.unwrap().is_empty());
    assert!(feed.home_feed().await.is_err());
}

#[tokio::test]
async fn test_search_matches_title_and_author() {
    let (_backend, feed) = seeded().await;

    let by_title: Vec<String> = feed.search("NIGHT").await.unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(by_title, vec!["p3"]);

    let by_author = feed.search("bo").await.unwrap();
    assert_eq!(by_author.len(), 1);
    assert_eq!(by_author[0].author, "bob");
}
