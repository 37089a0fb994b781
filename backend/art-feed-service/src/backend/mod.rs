/// Persistence client: the managed-backend ports the repositories talk to.
///
/// Three services sit behind this boundary:
/// - **DocumentStore**: schemaless records addressed by collection and id
/// - **BlobStore**: binary objects addressed by key, exposed through download URLs
/// - **AuthProvider**: email/password accounts plus the current session
///
/// `BackendClient` bundles one of each and is handed explicitly to every
/// repository and service; there is no process-wide instance.
use crate::config::{BackendMode, Config};
use crate::domain::{ProfileUpdate, UserProfile};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub mod accounts;
pub mod memory;
pub mod postgres;
pub mod s3;

/// Collection holding post documents
pub const POSTS: &str = "posts";
/// Collection holding comment documents
pub const COMMENTS: &str = "comments";

/// A document read from the store. `data` is `None` when no document exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Option<Value>,
}

impl Snapshot {
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }
}

/// Single-field mutation applied by [`DocumentStore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Replace the field
    Set(Value),
    /// Append each value not already present in the array
    ArrayUnion(Vec<Value>),
    /// Remove every element equal to one of the values
    ArrayRemove(Vec<Value>),
}

/// Apply updates to a document body in place.
///
/// A field that is missing or not an array is treated as an empty array by
/// the array operations.
pub fn apply_updates(doc: &mut Value, updates: &[(String, FieldUpdate)]) -> ServiceResult<()> {
    let fields = doc
        .as_object_mut()
        .ok_or_else(|| ServiceError::InvalidInput("document body is not an object".to_string()))?;

    for (field, update) in updates {
        match update {
            FieldUpdate::Set(value) => {
                fields.insert(field.clone(), value.clone());
            }
            FieldUpdate::ArrayUnion(values) => {
                let mut array = take_array(fields.get(field));
                for value in values {
                    if !array.contains(value) {
                        array.push(value.clone());
                    }
                }
                fields.insert(field.clone(), Value::Array(array));
            }
            FieldUpdate::ArrayRemove(values) => {
                let mut array = take_array(fields.get(field));
                array.retain(|element| !values.contains(element));
                fields.insert(field.clone(), Value::Array(array));
            }
        }
    }

    Ok(())
}

fn take_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Schemaless document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return the id the store assigned
    async fn add(&self, collection: &str, data: Value) -> ServiceResult<String>;

    /// Point lookup; a missing document is not an error
    async fn get(&self, collection: &str, id: &str) -> ServiceResult<Snapshot>;

    /// Every document in the collection, in insertion order
    async fn list(&self, collection: &str) -> ServiceResult<Vec<Snapshot>>;

    /// Documents whose top-level `field` equals `value`
    async fn query_eq(&self, collection: &str, field: &str, value: &Value)
        -> ServiceResult<Vec<Snapshot>>;

    /// Atomically apply field updates to one existing document.
    ///
    /// Fails with [`ServiceError::NotFound`] when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> ServiceResult<()>;

    /// Remove a document; deleting a missing document succeeds
    async fn delete(&self, collection: &str, id: &str) -> ServiceResult<()>;

    /// Cheap connectivity probe
    async fn ping(&self) -> ServiceResult<()>;
}

/// Binary object store
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> ServiceResult<()>;

    /// Durable URL for an uploaded object
    async fn download_url(&self, key: &str) -> ServiceResult<String>;

    /// Delete by download URL (or bare key)
    async fn delete_by_url(&self, url: &str) -> ServiceResult<()>;

    async fn ping(&self) -> ServiceResult<()>;
}

/// Email/password identity service holding the current session
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register credentials and sign the new account in
    async fn create_account(&self, email: &str, password: &str) -> ServiceResult<UserProfile>;

    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<UserProfile>;

    async fn sign_out(&self) -> ServiceResult<()>;

    async fn current_user(&self) -> Option<UserProfile>;

    /// Update display name and/or photo of an account
    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> ServiceResult<UserProfile>;
}

/// Handle to the three backend services
#[derive(Clone)]
pub struct BackendClient {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    auth: Arc<dyn AuthProvider>,
    image_prefix: String,
}

impl BackendClient {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            documents,
            blobs,
            auth,
            image_prefix: "images".to_string(),
        }
    }

    /// Key prefix used for uploaded images
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_prefix = prefix.into();
        self
    }

    /// Fresh in-memory backend
    pub fn in_memory() -> Self {
        memory::MemoryBackend::new().client()
    }

    /// Build the backend selected by configuration
    pub async fn connect(config: &Config) -> ServiceResult<Self> {
        let client = match config.backend {
            BackendMode::Memory => {
                info!("Using in-memory backend");
                memory::MemoryBackend::with_auth_config(config.auth.clone()).client()
            }
            BackendMode::Managed => {
                let database = config.database.as_ref().ok_or_else(|| {
                    ServiceError::InvalidInput("managed backend requires database settings".to_string())
                })?;

                let pool = postgres::create_pool(database).await?;
                postgres::migrate(&pool).await?;

                let documents = Arc::new(postgres::PgDocumentStore::new(pool.clone()));
                let blobs = Arc::new(s3::S3BlobStore::connect(config.storage.clone()).await);
                let auth = Arc::new(accounts::PgAuthProvider::new(pool, config.auth.clone()));

                info!(bucket = %config.storage.bucket, "Using managed backend");
                Self::new(documents, blobs, auth)
            }
        };

        Ok(client.with_image_prefix(config.storage.image_prefix.clone()))
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn image_prefix(&self) -> &str {
        &self.image_prefix
    }

    /// Probe the document store and blob store
    pub async fn health_check(&self) -> ServiceResult<()> {
        self.documents.ping().await?;
        self.blobs.ping().await?;
        Ok(())
    }
}
