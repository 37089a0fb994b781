pub mod models;

pub use models::{
    CommentData, CommentRecord, Coordinates, Post, ProfileUpdate, UserProfile,
    MAX_COMMENT_LENGTH,
};
