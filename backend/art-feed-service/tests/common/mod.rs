//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use art_feed_service::backend::memory::MemoryBackend;
use art_feed_service::domain::Post;
use std::io::Write;
use tempfile::NamedTempFile;

/// A local image file; the file is removed when the handle drops
pub fn image_file(extension: &str, bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{}", extension))
        .tempfile()
        .expect("create temp image");
    file.write_all(bytes).expect("write temp image");
    file
}

/// Device-style URI for a temp file
pub fn local_uri(file: &NamedTempFile) -> String {
    format!("file://{}", file.path().display())
}

pub fn sunset_post(local_image: &str) -> Post {
    Post::new("Sunset", "Evening light", "alice", "", local_image, None)
}

pub fn backend() -> MemoryBackend {
    MemoryBackend::new()
}
