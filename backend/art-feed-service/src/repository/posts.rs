use crate::backend::{BackendClient, FieldUpdate, Snapshot, POSTS};
use crate::domain::Post;
use crate::error::ServiceResult;
use crate::services::media::{MediaService, UploadOutcome};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Repository for the `posts` collection
#[derive(Clone)]
pub struct PostRepository {
    backend: BackendClient,
    media: MediaService,
}

/// Decode a post document; a missing document decodes to an empty post.
pub(crate) fn post_from_snapshot(snapshot: Snapshot) -> ServiceResult<Post> {
    let mut post: Post = match snapshot.data {
        Some(data) => serde_json::from_value(data)?,
        None => Post::default(),
    };
    post.id = snapshot.id;
    Ok(post)
}

/// Case-insensitive substring match on author or title
pub fn matches_query(post: &Post, query: &str) -> bool {
    let query = query.to_lowercase();
    (!post.author.is_empty() && post.author.to_lowercase().contains(&query))
        || (!post.title.is_empty() && post.title.to_lowercase().contains(&query))
}

impl PostRepository {
    pub fn new(backend: BackendClient) -> Self {
        let media = MediaService::new(backend.clone());
        Self { backend, media }
    }

    /// Upload the post's local image, then store the post pointing at the
    /// uploaded copy.
    ///
    /// Returns the new post id. Any failure is logged and yields `None`; a
    /// failure after the upload leaves the image object in storage.
    pub async fn create_post(&self, post: Post) -> Option<String> {
        let key = match self.media.upload_image(&post.image_url).await {
            UploadOutcome::Uploaded { key } => key,
            UploadOutcome::Failed { reason } => {
                warn!(title = %post.title, %reason, "Post not created: image upload failed");
                return None;
            }
        };

        match self.insert_with_image(post, &key).await {
            Ok(id) => {
                info!(post_id = %id, "Art post added");
                Some(id)
            }
            Err(e) => {
                error!(image_key = %key, error = %e, "Unexpected error while adding art post");
                None
            }
        }
    }

    async fn insert_with_image(&self, mut post: Post, key: &str) -> ServiceResult<String> {
        post.image_url = self.media.download_url(key).await?;
        let data = serde_json::to_value(&post)?;
        self.backend.documents().add(POSTS, data).await
    }

    /// Every post, in store order. Callers sort.
    pub async fn list_all_posts(&self) -> ServiceResult<Vec<Post>> {
        self.backend
            .documents()
            .list(POSTS)
            .await?
            .into_iter()
            .map(post_from_snapshot)
            .collect()
    }

    /// Add `user_id` to the post's likes, or remove it if already present.
    ///
    /// Read-then-write without isolation: two concurrent toggles can race and
    /// the later write wins. Returns the likes array that was written.
    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> ServiceResult<Vec<String>> {
        let snapshot = self.backend.documents().get(POSTS, post_id).await?;

        let current = snapshot
            .data
            .as_ref()
            .and_then(|data| data.get("likes"))
            .and_then(Value::as_array)
            .map(|likes| {
                likes
                    .iter()
                    .filter_map(|like| like.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
            });

        let likes = match current {
            Some(mut likes) => {
                if likes.iter().any(|like| like == user_id) {
                    likes.retain(|like| like != user_id);
                } else {
                    likes.push(user_id.to_string());
                }
                likes
            }
            None => vec![user_id.to_string()],
        };

        self.backend
            .documents()
            .update(
                POSTS,
                post_id,
                vec![("likes".to_string(), FieldUpdate::Set(serde_json::to_value(&likes)?))],
            )
            .await?;

        debug!(%post_id, %user_id, like_count = likes.len(), "Like toggled");
        Ok(likes)
    }

    /// Delete the post document, then its image object.
    ///
    /// No rollback: if the second step fails the image is orphaned, if the
    /// first fails the image is left alone. Failures are only logged.
    pub async fn delete_post(&self, post_id: &str, image_url: &str) {
        let result = async {
            self.backend.documents().delete(POSTS, post_id).await?;
            self.backend.blobs().delete_by_url(image_url).await
        }
        .await;

        match result {
            Ok(()) => info!(%post_id, "Art post deleted"),
            Err(e) => error!(%post_id, error = %e, "Unexpected error while deleting art post"),
        }
    }

    /// Posts whose denormalized `author` equals `author`; `None` on failure
    pub async fn list_posts_by_author(&self, author: &str) -> Option<Vec<Post>> {
        let result: ServiceResult<Vec<Post>> = async {
            self.backend
                .documents()
                .query_eq(POSTS, "author", &Value::String(author.to_string()))
                .await?
                .into_iter()
                .map(post_from_snapshot)
                .collect()
        }
        .await;

        match result {
            Ok(posts) => Some(posts),
            Err(e) => {
                error!(%author, error = %e, "Error while retrieving posts");
                None
            }
        }
    }

    /// Point lookup. A missing document still yields a post carrying only
    /// its id; check [`Post::has_content`].
    pub async fn get_post_by_id(&self, id: &str) -> ServiceResult<Post> {
        let snapshot = self.backend.documents().get(POSTS, id).await?;
        post_from_snapshot(snapshot)
    }

    /// Full scan of the collection filtered client-side on author and title.
    pub async fn search_posts(&self, query: &str) -> ServiceResult<Vec<Post>> {
        let posts = self.list_all_posts().await?;
        Ok(posts
            .into_iter()
            .filter(|post| matches_query(post, query))
            .collect())
    }
}
