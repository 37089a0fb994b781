use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Longest comment the presentation layer lets a user submit.
pub const MAX_COMMENT_LENGTH: usize = 128;

/// Current time in the ISO-8601 form stored on posts and comments.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads an explicit `null` the same as a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Geographic position captured when the post was created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Post document stored in the `posts` collection.
///
/// The document id is the store key and is never written into the document
/// body. Every field defaults, so reading a document that does not exist
/// yields a post with only `id` filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Post {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(deserialize_with = "null_default")]
    pub description: String,
    /// Author's display name at posting time (not a foreign key)
    #[serde(deserialize_with = "null_default")]
    pub author: String,
    /// Author's photo URL at posting time; may go stale
    #[serde(deserialize_with = "null_default")]
    pub author_picture: String,
    /// Local image reference before upload, download URL afterwards
    #[serde(rename = "imageURL", deserialize_with = "null_default")]
    pub image_url: String,
    /// User ids, no duplicates
    #[serde(deserialize_with = "null_default")]
    pub likes: Vec<String>,
    /// Comment document ids, in the order they were added
    #[serde(deserialize_with = "null_default")]
    pub comments: Vec<String>,
    pub post_coordinates: Option<Coordinates>,
    /// ISO-8601 creation timestamp
    #[serde(deserialize_with = "null_default")]
    pub date: String,
}

impl Post {
    /// New, not yet stored post stamped with the current time.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
        author_picture: impl Into<String>,
        local_image: impl Into<String>,
        post_coordinates: Option<Coordinates>,
    ) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            description: description.into(),
            author: author.into(),
            author_picture: author_picture.into(),
            image_url: local_image.into(),
            likes: Vec::new(),
            comments: Vec::new(),
            post_coordinates,
            date: iso_timestamp(Utc::now()),
        }
    }

    /// Parsed creation time; `None` when the stored string is not ISO-8601.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    /// False for the placeholder returned when the document was missing.
    pub fn has_content(&self) -> bool {
        !self.image_url.is_empty() || !self.title.is_empty() || !self.date.is_empty()
    }
}

/// Comment document stored in the `comments` collection.
///
/// The parent post is implicit: only the post's `comments` array links them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommentData {
    #[serde(deserialize_with = "null_default")]
    pub author_id: String,
    #[serde(deserialize_with = "null_default")]
    pub author_name: String,
    #[serde(deserialize_with = "null_default")]
    pub author_image_url: String,
    #[serde(deserialize_with = "null_default")]
    pub comment: String,
    #[serde(deserialize_with = "null_default")]
    pub date: String,
}

impl CommentData {
    pub fn new(
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        author_image_url: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            author_name: author_name.into(),
            author_image_url: author_image_url.into(),
            comment: comment.into(),
            date: iso_timestamp(Utc::now()),
        }
    }

    /// Whether the text fits the UI's length limit. Not enforced on write.
    pub fn fits_length(&self) -> bool {
        self.comment.chars().count() <= MAX_COMMENT_LENGTH
    }
}

/// A comment as read back by id; `comment` is `None` when the id dangles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub comment: Option<CommentData>,
}

/// Auth-service record for a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    /// Public username, used in profile URLs
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    /// `Some(None)` clears the photo
    pub photo_url: Option<Option<String>>,
}

impl UserProfile {
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.display_name {
            self.display_name = Some(name.clone());
        }
        if let Some(photo) = &update.photo_url {
            self.photo_url = photo.clone();
        }
    }
}
