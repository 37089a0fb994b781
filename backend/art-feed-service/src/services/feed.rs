/// Read-side conventions shared by the feed, profile and search screens
use crate::domain::Post;
use crate::error::ServiceResult;
use crate::repository::PostRepository;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// Aggregates shown at the top of a profile page
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub posts: Vec<Post>,
    pub post_count: usize,
    pub total_likes: usize,
    /// Picture cached on the newest post, if any
    pub picture: Option<String>,
}

/// Newest first; posts with an unparsable date go last, keeping their order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|post| Reverse(post.created_at()));
}

/// "5h. ago" within a day of `now`, otherwise the calendar date.
pub fn age_label(post: &Post, now: DateTime<Utc>) -> String {
    match post.created_at() {
        Some(created) => {
            // Floored, so a post dated slightly in the future reads "-1h. ago"
            let hours = (now - created).num_milliseconds().div_euclid(3_600_000);
            if hours < 24 {
                format!("{}h. ago", hours)
            } else {
                created.format("%d/%m/%Y").to_string()
            }
        }
        None => String::new(),
    }
}

#[derive(Clone)]
pub struct FeedService {
    posts: PostRepository,
}

impl FeedService {
    pub fn new(posts: PostRepository) -> Self {
        Self { posts }
    }

    /// Global feed, newest first
    pub async fn home_feed(&self) -> ServiceResult<Vec<Post>> {
        let mut posts = self.posts.list_all_posts().await?;
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    /// A user's posts, newest first, with like totals
    pub async fn profile(&self, username: &str) -> ProfileSummary {
        let mut posts = self.posts.list_posts_by_author(username).await.unwrap_or_default();
        sort_newest_first(&mut posts);

        let total_likes = posts.iter().map(|post| post.likes.len()).sum();
        let picture = posts
            .first()
            .map(|post| post.author_picture.clone())
            .filter(|picture| !picture.is_empty());

        ProfileSummary {
            post_count: posts.len(),
            total_likes,
            picture,
            posts,
        }
    }

    /// Search by author or title; a blank query returns nothing without
    /// touching the store.
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<Post>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.posts.search_posts(query).await
    }
}
