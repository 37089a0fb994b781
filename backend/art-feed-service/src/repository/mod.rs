pub mod comments;
pub mod posts;

pub use comments::CommentRepository;
pub use posts::PostRepository;
