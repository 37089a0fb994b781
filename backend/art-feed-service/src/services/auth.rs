/// Sign-up, sign-in and sign-out against the auth provider.
///
/// Failures are logged with their error code and reported as `None`; nothing
/// here returns a typed error.
use crate::backend::BackendClient;
use crate::domain::{ProfileUpdate, UserProfile};
use crate::services::media::MediaService;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AuthService {
    backend: BackendClient,
    media: MediaService,
}

impl AuthService {
    pub fn new(backend: BackendClient) -> Self {
        let media = MediaService::new(backend.clone());
        Self { backend, media }
    }

    /// Create an account and give it a display name and optional picture.
    ///
    /// Three remote steps, none undone on a later failure:
    /// 1. upload the picture (failure: continue without one)
    /// 2. create the credentialed account (failure: stop)
    /// 3. set display name and photo (failure: the account stays nameless)
    ///
    /// Returns the account as it stands after the last step that succeeded.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
        image: Option<&str>,
    ) -> Option<UserProfile> {
        let mut photo_url = None;
        if let Some(image) = image.filter(|image| !image.is_empty()) {
            match self.media.upload_and_resolve(image).await {
                Ok(url) => photo_url = Some(url),
                Err(e) => warn!(error = %e, "Error uploading profile image, continuing without it"),
            }
        }

        let account = match self.backend.auth().create_account(email, password).await {
            Ok(account) => account,
            Err(e) => {
                warn!(code = e.code(), error = %e, "Sign up failed");
                return None;
            }
        };
        info!(uid = %account.uid, "User signed up");

        let update = ProfileUpdate {
            display_name: Some(username.to_string()),
            photo_url: Some(photo_url),
        };
        match self.backend.auth().update_profile(&account.uid, update).await {
            Ok(profile) => {
                info!(uid = %profile.uid, username, "User profile updated");
                Some(profile)
            }
            Err(e) => {
                warn!(uid = %account.uid, code = e.code(), error = %e, "Profile update after sign up failed");
                Some(account)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Option<UserProfile> {
        match self.backend.auth().sign_in(email, password).await {
            Ok(profile) => {
                info!(uid = %profile.uid, "User signed in");
                Some(profile)
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "Sign in failed");
                None
            }
        }
    }

    pub async fn sign_out(&self) {
        match self.backend.auth().sign_out().await {
            Ok(()) => info!("Signed out"),
            Err(e) => warn!(code = e.code(), error = %e, "Sign out failed"),
        }
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        self.backend.auth().current_user().await
    }
}
