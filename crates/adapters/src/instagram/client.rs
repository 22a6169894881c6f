//! Instagram private-API publisher: login, photo upload, media configure

use async_trait::async_trait;
use phrasecast_domain::{MediaPost, PublishError, PublishResult, Publisher};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;

const DEFAULT_BASE_URL: &str = "https://i.instagram.com";
const DEFAULT_USER_AGENT: &str = "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)";
const SESSION_HEADER: &str = "ig-set-authorization";

/// Account credentials
pub struct InstagramCredentials {
    pub username: String,
    pub password: SecretString,
}

/// HTTP settings for the publisher
#[derive(Debug, Clone)]
pub struct InstagramConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

struct Session {
    authorization: SecretString,
    user_id: String,
}

/// Publishes photos to one Instagram account.
///
/// The session from the first login is cached and reused. When an
/// authenticated call is rejected the session is dropped and the publisher
/// logs in once more before giving up.
pub struct InstagramPublisher {
    client: Client,
    base_url: String,
    timeout: Duration,
    credentials: Option<InstagramCredentials>,
    session: Mutex<Option<Arc<Session>>>,
}

impl InstagramPublisher {
    /// `None` credentials give a publisher that reports itself disabled
    pub fn new(
        credentials: Option<InstagramCredentials>,
        config: InstagramConfig,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| PublishError::Api(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            credentials,
            session: Mutex::new(None),
        })
    }

    async fn session(&self, credentials: &InstagramCredentials) -> Result<Arc<Session>, PublishError> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            return Ok(Arc::clone(session));
        }

        let session = Arc::new(self.login(credentials).await?);
        *cached = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn drop_session(&self) {
        *self.session.lock().await = None;
    }

    async fn login(&self, credentials: &InstagramCredentials) -> Result<Session, PublishError> {
        tracing::info!(username = %credentials.username, "Logging in to Instagram");

        let response = self
            .client
            .post(format!("{}/api/v1/accounts/login/", self.base_url))
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.expose_secret()),
                ("login_attempt_count", "0"),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e, PublishError::Auth))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => PublishError::RateLimited,
                _ => PublishError::Auth(api_message(&body).unwrap_or_else(|| status.to_string())),
            });
        }

        let authorization = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::new(v.into()))
            .ok_or_else(|| PublishError::Auth("login response carried no session".to_string()))?;

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Auth(e.to_string()))?;

        let user_id = id_string(&body.logged_in_user.pk);
        tracing::debug!(user_id = %user_id, "Instagram session established");

        Ok(Session {
            authorization,
            user_id,
        })
    }

    async fn upload(&self, session: &Session, image: &[u8]) -> Result<String, PublishError> {
        let upload_id = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string();
        let entity_name = format!("{}_0_{}", upload_id, uuid::Uuid::new_v4().simple());
        let params = serde_json::json!({
            "upload_id": upload_id,
            "media_type": "1",
            "retry_context": r#"{"num_step_auto_retry":0,"num_reupload":0,"num_step_manual_retry":0}"#,
            "image_compression": r#"{"lib_name":"moz","lib_version":"3.1.m","quality":"95"}"#,
        });

        let response = self
            .client
            .post(format!("{}/rupload_igphoto/{}", self.base_url, entity_name))
            .header("Authorization", session.authorization.expose_secret())
            .header("X-Instagram-Rupload-Params", params.to_string())
            .header("X-Entity-Type", "image/jpeg")
            .header("X-Entity-Name", &entity_name)
            .header("X-Entity-Length", image.len().to_string())
            .header("Offset", "0")
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| self.transport_error(e, PublishError::Upload))?;

        let response = check(response, PublishError::Upload).await?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Upload(e.to_string()))?;

        Ok(body.upload_id.map(|id| id_string(&id)).unwrap_or(upload_id))
    }

    async fn configure(
        &self,
        session: &Session,
        upload_id: &str,
        caption: &str,
    ) -> Result<PublishResult, PublishError> {
        let response = self
            .client
            .post(format!("{}/api/v1/media/configure/", self.base_url))
            .header("Authorization", session.authorization.expose_secret())
            .form(&[
                ("upload_id", upload_id),
                ("caption", caption),
                ("source_type", "4"),
                ("_uid", session.user_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e, PublishError::Api))?;

        let response = check(response, PublishError::Api).await?;
        let body: ConfigureResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        if body.status != "ok" {
            return Err(PublishError::Api(
                body.message.unwrap_or_else(|| format!("status {}", body.status)),
            ));
        }
        let media = body
            .media
            .ok_or_else(|| PublishError::Api("configure response carried no media".to_string()))?;

        Ok(PublishResult {
            id: id_string(&media.pk),
            url: media
                .code
                .map(|code| format!("https://www.instagram.com/p/{}/", code)),
        })
    }

    async fn post_photo(&self, session: &Session, post: &MediaPost) -> Result<PublishResult, PublishError> {
        let upload_id = self.upload(session, &post.image).await?;
        tracing::debug!(artifact = %post.artifact_name, upload_id = %upload_id, "Uploaded photo");
        self.configure(session, &upload_id, &post.caption).await
    }

    fn transport_error(&self, error: reqwest::Error, wrap: fn(String) -> PublishError) -> PublishError {
        if error.is_timeout() {
            PublishError::Timeout(self.timeout)
        } else {
            wrap(error.to_string())
        }
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    async fn publish(&self, post: &MediaPost) -> Result<PublishResult, PublishError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(PublishError::CredentialsMissing)?;

        let session = self.session(credentials).await?;
        match self.post_photo(&session, post).await {
            Err(PublishError::Auth(reason)) => {
                tracing::warn!(reason = %reason, "Instagram session rejected, logging in again");
                self.drop_session().await;
                let session = self.session(credentials).await?;
                self.post_photo(&session, post).await
            }
            other => other,
        }
    }

    fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    fn platform(&self) -> &'static str {
        "instagram"
    }
}

/// Map a non-success response to an error; 401/403 become `Auth`
async fn check(response: Response, wrap: fn(String) -> PublishError) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_message(&body).unwrap_or_else(|| status.to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PublishError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => PublishError::RateLimited,
        _ if message == "login_required" => PublishError::Auth(message),
        _ => wrap(message),
    })
}

fn api_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiFailure>(body)
        .ok()
        .and_then(|f| f.message)
        .filter(|m| !m.is_empty())
}

/// Instagram returns ids as numbers or strings depending on the endpoint
fn id_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Deserialize)]
struct ApiFailure {
    message: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    logged_in_user: LoggedInUser,
}

#[derive(Deserialize)]
struct LoggedInUser {
    pk: serde_json::Value,
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_id: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ConfigureResponse {
    status: String,
    message: Option<String>,
    media: Option<ConfiguredMedia>,
}

#[derive(Deserialize)]
struct ConfiguredMedia {
    pk: serde_json::Value,
    code: Option<String>,
}
