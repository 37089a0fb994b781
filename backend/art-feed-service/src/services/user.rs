use crate::backend::BackendClient;
use crate::domain::{ProfileUpdate, UserProfile};
use crate::services::media::{MediaService, UploadOutcome};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct UserService {
    backend: BackendClient,
    media: MediaService,
}

impl UserService {
    pub fn new(backend: BackendClient) -> Self {
        let media = MediaService::new(backend.clone());
        Self { backend, media }
    }

    /// Upload a new profile picture and point the account's photo at it.
    ///
    /// Does nothing unless `current_user` is the account signed in right now;
    /// a profile kept from before sign-out is ignored. Posts keep the old
    /// picture URL they were created with.
    pub async fn update_profile_picture(
        &self,
        current_user: Option<&UserProfile>,
        local_image: &str,
    ) -> Option<UserProfile> {
        let user = current_user?;
        match self.backend.auth().current_user().await {
            Some(session) if session.uid == user.uid => {}
            Some(session) => {
                warn!(uid = %user.uid, session_uid = %session.uid, "Profile picture update for a user that is not signed in");
                return None;
            }
            None => {
                debug!(uid = %user.uid, "Profile picture update without a session");
                return None;
            }
        }

        let key = match self.media.upload_image(local_image).await {
            UploadOutcome::Uploaded { key } => key,
            UploadOutcome::Failed { reason } => {
                warn!(uid = %user.uid, %reason, "Profile picture upload failed");
                return None;
            }
        };

        let result = async {
            let url = self.media.download_url(&key).await?;
            let update = ProfileUpdate {
                display_name: None,
                photo_url: Some(Some(url)),
            };
            self.backend.auth().update_profile(&user.uid, update).await
        }
        .await;

        match result {
            Ok(profile) => {
                info!(uid = %profile.uid, "User profile picture updated");
                Some(profile)
            }
            Err(e) => {
                error!(uid = %user.uid, error = %e, "Unexpected error while updating user profile picture");
                None
            }
        }
    }
}
