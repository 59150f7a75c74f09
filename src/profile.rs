//! Profile and account management

use std::path::Path;
use tracing::info;

use taskman_protocol::{ChangePasswordRequest, DetailResponse, Profile, ProfileUpdate};

use crate::client::{ApiRequest, MultipartBody};
use crate::error::{Result, TaskmanError};
use crate::events::AuthChange;
use crate::session::Session;

const PROFILE_PATH: &str = "/api/auth/profile/";
const PICTURE_FIELD: &str = "profile_picture";

pub struct ProfileService<'a> {
    session: &'a Session,
}

impl<'a> ProfileService<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn get(&self) -> Result<Profile> {
        self.session
            .authenticated_fetch(ApiRequest::get(PROFILE_PATH))
            .await?
            .into_result()
    }

    pub async fn update(&self, update: &ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return Err(TaskmanError::invalid_input("Nothing to update"));
        }
        let request = ApiRequest::patch(PROFILE_PATH).json(update)?;
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }

    /// Replace the profile picture with the image at `path`
    pub async fn upload_picture(&self, path: &Path) -> Result<Profile> {
        let form = MultipartBody::new()
            .file_from_path(PICTURE_FIELD, path)
            .await?;
        let request = ApiRequest::patch(PROFILE_PATH).multipart(form);
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }

    /// Set a new password
    ///
    /// `old_password` may be empty right after a temporary-password login.
    /// Success clears the pending password-change flag.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<String> {
        if new_password.is_empty() {
            return Err(TaskmanError::invalid_input("New password cannot be empty"));
        }
        let request = ApiRequest::post("/api/auth/change-password/").json(&ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        })?;

        let response: DetailResponse = self
            .session
            .authenticated_fetch(request)
            .await?
            .into_result()?;

        self.session.store().set_must_change_password(false)?;
        Ok(response.detail)
    }

    /// Delete the account and end the session
    pub async fn delete_account(&self) -> Result<()> {
        self.session
            .authenticated_fetch(ApiRequest::delete("/api/auth/delete-account/"))
            .await?
            .into_unit()?;

        self.session.store().clear()?;
        self.session.notifier().notify(AuthChange::LoggedOut);
        info!("account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::logged_in_session;
    use crate::tests::utils::test_helpers::create_temp_dir;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile_json() -> serde_json::Value {
        json!({
            "username": "ada",
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "profile_picture": null,
            "date_joined": "2025-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_update_sends_only_set_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(PROFILE_PATH))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"first_name": "Ada"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .expect(1)
            .mount(&server)
            .await;

        let session = logged_in_session(&server);
        let profile = ProfileService::new(&session)
            .update(&ProfileUpdate {
                first_name: Some("Ada".to_string()),
                ..ProfileUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_upload_picture_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(PROFILE_PATH))
            .and(body_string_contains("name=\"profile_picture\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = create_temp_dir();
        let picture = dir.path().join("me.png");
        std::fs::write(&picture, b"not really a png").unwrap();

        let session = logged_in_session(&server);
        ProfileService::new(&session)
            .upload_picture(&picture)
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        let content_type = received[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn test_change_password_clears_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/change-password/"))
            .and(body_json(json!({"old_password": "", "new_password": "n3w"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"detail": "Password changed successfully"})),
            )
            .mount(&server)
            .await;

        let session = logged_in_session(&server);
        session.store().set_must_change_password(true).unwrap();

        ProfileService::new(&session)
            .change_password("", "n3w")
            .await
            .unwrap();
        assert!(!session.store().must_change_password());
    }

    #[tokio::test]
    async fn test_wrong_old_password_keeps_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/change-password/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"old_password": ["Incorrect password"]})),
            )
            .mount(&server)
            .await;

        let session = logged_in_session(&server);
        session.store().set_must_change_password(true).unwrap();

        let err = ProfileService::new(&session)
            .change_password("bad", "n3w")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("old_password: Incorrect password"));
        assert!(session.store().must_change_password());
    }

    #[tokio::test]
    async fn test_delete_account_ends_session() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/auth/delete-account/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session = logged_in_session(&server);
        let mut rx = session.subscribe();

        ProfileService::new(&session).delete_account().await.unwrap();
        assert!(!session.store().has_tokens());
        assert_eq!(rx.try_recv().unwrap(), AuthChange::LoggedOut);
    }
}
