pub mod auth;
pub mod feed;
pub mod media;
pub mod user;

pub use auth::AuthService;
pub use feed::{FeedService, ProfileSummary};
pub use media::{MediaService, UploadOutcome};
pub use user::UserService;
