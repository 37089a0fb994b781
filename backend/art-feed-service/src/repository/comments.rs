use crate::backend::{BackendClient, FieldUpdate, COMMENTS, POSTS};
use crate::domain::{CommentData, CommentRecord};
use crate::error::ServiceResult;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::{error, info, warn};

/// Repository for the `comments` collection and the id lists on posts.
///
/// Linking is two independent writes with no transaction around them, so a
/// comment can exist without a referencing post, or a post can keep an id
/// whose comment is gone. Readers treat both as normal.
#[derive(Clone)]
pub struct CommentRepository {
    backend: BackendClient,
}

impl CommentRepository {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Store the comment, then append its id to the parent post.
    ///
    /// Returns the new comment id when both writes land.
    pub async fn add_comment(&self, post_id: &str, comment: CommentData) -> Option<String> {
        let documents = self.backend.documents();

        let comment_id = match self.insert(&comment).await {
            Ok(id) => id,
            Err(e) => {
                error!(%post_id, error = %e, "Error while adding comment");
                return None;
            }
        };

        let link = vec![(
            "comments".to_string(),
            FieldUpdate::ArrayUnion(vec![Value::String(comment_id.clone())]),
        )];
        match documents.update(POSTS, post_id, link).await {
            Ok(()) => {
                info!(%post_id, %comment_id, "Added comment");
                Some(comment_id)
            }
            Err(e) => {
                warn!(
                    %post_id,
                    %comment_id,
                    error = %e,
                    "Comment stored but not linked to its post"
                );
                None
            }
        }
    }

    async fn insert(&self, comment: &CommentData) -> ServiceResult<String> {
        let data = serde_json::to_value(comment)?;
        self.backend.documents().add(COMMENTS, data).await
    }

    /// Fetch comments concurrently, in the order of `ids`.
    ///
    /// All-or-nothing: one failed lookup discards the whole batch and yields
    /// `None`. Ids without a document come back with `comment: None`.
    pub async fn get_comments_by_ids(&self, ids: &[String]) -> Option<Vec<CommentRecord>> {
        match self.fetch_all(ids).await {
            Ok(records) => Some(records),
            Err(e) => {
                error!(count = ids.len(), error = %e, "Error while retrieving comments");
                None
            }
        }
    }

    async fn fetch_all(&self, ids: &[String]) -> ServiceResult<Vec<CommentRecord>> {
        let documents = self.backend.documents();
        let snapshots = try_join_all(ids.iter().map(|id| documents.get(COMMENTS, id))).await?;

        snapshots
            .into_iter()
            .map(|snapshot| -> ServiceResult<CommentRecord> {
                let comment = snapshot
                    .data
                    .map(serde_json::from_value::<CommentData>)
                    .transpose()?;
                Ok(CommentRecord {
                    id: snapshot.id,
                    comment,
                })
            })
            .collect()
    }

    /// Unlink the comment from its post, then delete the comment document.
    pub async fn delete_comment(&self, comment_id: &str, post_id: &str) {
        let documents = self.backend.documents();
        let result = async {
            documents
                .update(
                    POSTS,
                    post_id,
                    vec![(
                        "comments".to_string(),
                        FieldUpdate::ArrayRemove(vec![Value::String(comment_id.to_string())]),
                    )],
                )
                .await?;
            documents.delete(COMMENTS, comment_id).await
        }
        .await;

        match result {
            Ok(()) => info!(%post_id, %comment_id, "Deleted comment"),
            Err(e) => error!(%post_id, %comment_id, error = %e, "Error while deleting comment"),
        }
    }
}
