//! In-process backend.
//!
//! Behaves like the managed services as far as the repositories can observe:
//! store-assigned ids, per-document atomic updates, update-on-missing fails,
//! download URLs that must resolve to an uploaded object. Each store can be
//! told to reject its next call of a given kind, which is how tests reach the
//! partially-applied states of multi-step operations.

use super::{apply_updates, AuthProvider, BackendClient, BlobStore, DocumentStore, FieldUpdate, Snapshot};
use crate::config::{AuthConfig, StorageConfig};
use crate::domain::{ProfileUpdate, UserProfile};
use crate::error::{AuthFailure, ServiceError, ServiceResult};
use crate::security::password;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Document-store call kinds that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocOp {
    Add,
    Get,
    List,
    Query,
    Update,
    Delete,
}

/// One-shot failures keyed by operation
struct Faults<K> {
    pending: Mutex<HashSet<K>>,
}

impl<K> Default for Faults<K> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashSet::new()),
        }
    }
}

impl<K: std::hash::Hash + Eq + std::fmt::Debug> Faults<K> {
    async fn arm(&self, key: K) {
        self.pending.lock().await.insert(key);
    }

    async fn check(&self, key: K) -> ServiceResult<()> {
        if self.pending.lock().await.remove(&key) {
            return Err(ServiceError::Unavailable(format!("injected failure on {:?}", key)));
        }
        Ok(())
    }
}

/// The three in-memory stores, kept together so tests can reach them
#[derive(Clone)]
pub struct MemoryBackend {
    pub documents: Arc<MemoryDocumentStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub auth: Arc<MemoryAuthProvider>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_auth_config(AuthConfig::default())
    }

    pub fn with_auth_config(rules: AuthConfig) -> Self {
        Self {
            documents: Arc::new(MemoryDocumentStore::default()),
            blobs: Arc::new(MemoryBlobStore::default()),
            auth: Arc::new(MemoryAuthProvider::new(rules)),
        }
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(self.documents.clone(), self.blobs.clone(), self.auth.clone())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Default)]
pub struct MemoryDocumentStore {
    /// collection -> documents in insertion order
    collections: RwLock<HashMap<String, Vec<(String, Value)>>>,
    faults: Faults<DocOp>,
}

impl MemoryDocumentStore {
    /// Make the next call of `op` fail with [`ServiceError::Unavailable`]
    pub async fn fail_next(&self, op: DocOp) {
        self.faults.arm(op).await;
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Insert a document under a caller-chosen id
    pub async fn insert_with_id(&self, collection: &str, id: &str, data: Value) {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        docs.retain(|(existing, _)| existing != id);
        docs.push((id.to_string(), data));
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add(&self, collection: &str, data: Value) -> ServiceResult<String> {
        self.faults.check(DocOp::Add).await?;
        if !data.is_object() {
            return Err(ServiceError::InvalidInput("document body is not an object".to_string()));
        }

        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), data));

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> ServiceResult<Snapshot> {
        self.faults.check(DocOp::Get).await?;
        let collections = self.collections.read().await;
        let data = collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, data)| data.clone());

        Ok(Snapshot {
            id: id.to_string(),
            data,
        })
    }

    async fn list(&self, collection: &str) -> ServiceResult<Vec<Snapshot>> {
        self.faults.check(DocOp::List).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Snapshot {
                        id: id.clone(),
                        data: Some(data.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> ServiceResult<Vec<Snapshot>> {
        self.faults.check(DocOp::Query).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| data.get(field) == Some(value))
                    .map(|(id, data)| Snapshot {
                        id: id.clone(),
                        data: Some(data.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: Vec<(String, FieldUpdate)>,
    ) -> ServiceResult<()> {
        self.faults.check(DocOp::Update).await?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
            .map(|(_, data)| data)
            .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", collection, id)))?;

        // Apply to a copy so a rejected update leaves the document untouched
        let mut updated = doc.clone();
        apply_updates(&mut updated, &updates)?;
        *doc = updated;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> ServiceResult<()> {
        self.faults.check(DocOp::Delete).await?;
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }

    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }
}

// ============================================================================
// Blobs
// ============================================================================

/// Blob-store call kinds that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Upload,
    DownloadUrl,
    Delete,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

pub struct MemoryBlobStore {
    urls: StorageConfig,
    objects: RwLock<HashMap<String, StoredObject>>,
    faults: Faults<BlobOp>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            urls: StorageConfig {
                bucket: "art-feed-media".to_string(),
                base_url: "https://storage.memory.local".to_string(),
                path_style: true,
                ..StorageConfig::default()
            },
            objects: RwLock::new(HashMap::new()),
            faults: Faults::default(),
        }
    }
}

impl MemoryBlobStore {
    pub async fn fail_next(&self, op: BlobOp) {
        self.faults.arm(op).await;
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Look up the object a download URL points at
    pub async fn resolve_url(&self, url: &str) -> Option<StoredObject> {
        self.object(&self.urls.key_from_url(url)).await
    }

    pub async fn count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> ServiceResult<()> {
        self.faults.check(BlobOp::Upload).await?;
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn download_url(&self, key: &str) -> ServiceResult<String> {
        self.faults.check(BlobOp::DownloadUrl).await?;
        if !self.objects.read().await.contains_key(key) {
            return Err(ServiceError::NotFound(format!("object {}", key)));
        }
        Ok(self.urls.object_url(key))
    }

    async fn delete_by_url(&self, url: &str) -> ServiceResult<()> {
        self.faults.check(BlobOp::Delete).await?;
        let key = self.urls.key_from_url(url);
        match self.objects.write().await.remove(&key) {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!("object {}", key))),
        }
    }

    async fn ping(&self) -> ServiceResult<()> {
        Ok(())
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Auth call kinds that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOp {
    CreateAccount,
    SignIn,
    UpdateProfile,
}

struct Account {
    password_hash: String,
    profile: UserProfile,
}

pub struct MemoryAuthProvider {
    rules: AuthConfig,
    /// normalized email -> account
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<UserProfile>>,
    faults: Faults<AuthOp>,
}

impl MemoryAuthProvider {
    pub fn new(rules: AuthConfig) -> Self {
        Self {
            rules,
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            faults: Faults::default(),
        }
    }

    pub async fn fail_next(&self, op: AuthOp) {
        self.faults.arm(op).await;
    }

    /// Stored profile for an email, regardless of session
    pub async fn account(&self, email: &str) -> Option<UserProfile> {
        self.accounts
            .read()
            .await
            .get(&password::normalize_email(email))
            .map(|account| account.profile.clone())
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn create_account(&self, email: &str, pw: &str) -> ServiceResult<UserProfile> {
        self.faults.check(AuthOp::CreateAccount).await?;
        password::validate_credentials(email, pw, &self.rules)?;

        let key = password::normalize_email(email);
        let password_hash = password::hash_password(pw)?;
        let profile = {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&key) {
                return Err(AuthFailure::EmailAlreadyInUse.into());
            }
            let profile = UserProfile {
                uid: Uuid::new_v4().simple().to_string(),
                email: key.clone(),
                display_name: None,
                photo_url: None,
            };
            accounts.insert(
                key,
                Account {
                    password_hash,
                    profile: profile.clone(),
                },
            );
            profile
        };

        *self.session.write().await = Some(profile.clone());
        Ok(profile)
    }

    async fn sign_in(&self, email: &str, pw: &str) -> ServiceResult<UserProfile> {
        self.faults.check(AuthOp::SignIn).await?;
        let profile = {
            let accounts = self.accounts.read().await;
            let account = accounts
                .get(&password::normalize_email(email))
                .ok_or(AuthFailure::InvalidCredentials)?;
            if !password::verify_password(pw, &account.password_hash)? {
                return Err(AuthFailure::InvalidCredentials.into());
            }
            account.profile.clone()
        };

        *self.session.write().await = Some(profile.clone());
        Ok(profile)
    }

    async fn sign_out(&self) -> ServiceResult<()> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn current_user(&self) -> Option<UserProfile> {
        self.session.read().await.clone()
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> ServiceResult<UserProfile> {
        self.faults.check(AuthOp::UpdateProfile).await?;
        let profile = {
            let mut accounts = self.accounts.write().await;
            let account = accounts
                .values_mut()
                .find(|account| account.profile.uid == uid)
                .ok_or(AuthFailure::UserNotFound)?;
            account.profile.apply(&update);
            account.profile.clone()
        };

        let mut session = self.session.write().await;
        if session.as_ref().map(|current| current.uid == uid).unwrap_or(false) {
            *session = Some(profile.clone());
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn update_on_missing_document_fails() {
        let store = MemoryDocumentStore::default();
        let result = store
            .update("posts", "nope", vec![("likes".to_string(), FieldUpdate::Set(json!([])))])
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn get_missing_document_is_empty_snapshot() {
        let store = MemoryDocumentStore::default();
        let snapshot = store.get("posts", "nope").await.unwrap();
        assert_eq!(snapshot.id, "nope");
        assert!(!snapshot.exists());
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = MemoryDocumentStore::default();
        let a = store.add("posts", json!({ "title": "a" })).await.unwrap();
        let b = store.add("posts", json!({ "title": "b" })).await.unwrap();

        let ids: Vec<String> = store
            .list("posts")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let store = MemoryDocumentStore::default();
        store.fail_next(DocOp::Add).await;

        assert!(matches!(
            store.add("posts", json!({})).await,
            Err(ServiceError::Unavailable(_))
        ));
        assert!(store.add("posts", json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn download_url_requires_uploaded_object() {
        let blobs = MemoryBlobStore::default();
        assert!(blobs.download_url("images/x.jpg").await.is_err());

        blobs.upload("images/x.jpg", vec![1, 2, 3], "image/jpeg").await.unwrap();
        let url = blobs.download_url("images/x.jpg").await.unwrap();
        assert_eq!(url, "https://storage.memory.local/art-feed-media/images/x.jpg");
        assert_eq!(blobs.resolve_url(&url).await.unwrap().body, vec![1, 2, 3]);

        blobs.delete_by_url(&url).await.unwrap();
        assert!(blobs.delete_by_url(&url).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let auth = MemoryAuthProvider::new(AuthConfig::default());
        auth.create_account("Alice@example.com", "secret-pw").await.unwrap();

        let result = auth.create_account("alice@example.com", "secret-pw").await;
        assert!(matches!(
            result,
            Err(ServiceError::Auth(AuthFailure::EmailAlreadyInUse))
        ));
    }
}
