use crate::config::relay_config::ApiConfig;
use crate::domain::model::{Credentials, LoginOutcome, MediaKind, PostHandle};
use crate::domain::ports::{Authenticator, MediaFetcher, Publisher};
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use url::Url;

const CHALLENGE_REQUIRED: &str = "challenge_required";

/// One account session against the account-API bridge.
pub struct HttpSession {
    client: Client,
    base_url: Url,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    username: Option<String>,
    token: Option<String>,
    challenge_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    challenge_id: Option<String>,
    #[serde(default)]
    media_id: Option<String>,
}

impl ApiEnvelope {
    fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    fn message_or(&self, status: StatusCode) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string())
    }
}

impl HttpSession {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Self::with_client(client, &config.base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        // join() 需要結尾斜線才不會吃掉最後一段路徑
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| RelayError::InvalidConfigValueError {
            field: "api.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().token.is_some()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RelayError::InvalidLink {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .state()
            .token
            .clone()
            .ok_or_else(|| RelayError::SessionExpired {
                message: "not logged in".to_string(),
            })?;
        Ok(request.bearer_auth(token))
    }

    fn store_session(&self, envelope: &ApiEnvelope, status: StatusCode) -> Result<()> {
        let token = envelope
            .session_id
            .clone()
            .ok_or_else(|| RelayError::RemoteError {
                status: status.as_u16(),
                message: "response did not include a session id".to_string(),
            })?;
        let mut state = self.state();
        state.token = Some(token);
        state.challenge_id = None;
        Ok(())
    }

    async fn checked(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let envelope = read_envelope(response).await?;
        Err(classify_failure(status, &envelope.message_or(status)))
    }

    async fn fetch_resource(&self, url: &Url) -> Result<Vec<u8>> {
        let mut request = self.client.get(url.clone());
        if url.host_str() == self.base_url.host_str() && url.port() == self.base_url.port() {
            request = self.authorized(request)?;
        }
        let response = self.checked(request.send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Authenticator for HttpSession {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        self.state().username = Some(credentials.username.clone());
        tracing::debug!("Making login request for {}", credentials.username);

        let response = self
            .client
            .post(self.endpoint("accounts/login")?)
            .json(&serde_json::json!({
                "username": credentials.username,
                "password": credentials.password,
            }))
            .send()
            .await?;
        let status = response.status();
        tracing::debug!("Login response status: {}", status);
        let envelope = read_envelope(response).await?;

        if envelope.message.as_deref() == Some(CHALLENGE_REQUIRED) {
            self.state().challenge_id = envelope.challenge_id.clone();
            return Ok(LoginOutcome::ChallengeRequired);
        }
        if status.is_success() && envelope.is_ok() {
            self.store_session(&envelope, status)?;
            return Ok(LoginOutcome::LoggedIn);
        }

        match classify_failure(status, &envelope.message_or(status)) {
            RelayError::RemoteError { message, .. } => Err(RelayError::AuthenticationFailed {
                username: credentials.username.clone(),
                message,
            }),
            other => Err(other),
        }
    }

    async fn submit_challenge_code(&self, code: &str) -> Result<()> {
        let (challenge_id, username) = {
            let state = self.state();
            (state.challenge_id.clone(), state.username.clone().unwrap_or_default())
        };
        let challenge_id = challenge_id.ok_or_else(|| RelayError::AuthenticationFailed {
            username,
            message: "no verification challenge is pending".to_string(),
        })?;

        let response = self
            .client
            .post(self.endpoint(&format!("challenge/{}", challenge_id))?)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?;
        let status = response.status();
        let envelope = read_envelope(response).await?;

        if status.is_success() && envelope.is_ok() {
            self.store_session(&envelope, status)
        } else {
            Err(classify_failure(status, &envelope.message_or(status)))
        }
    }
}

#[async_trait]
impl MediaFetcher for HttpSession {
    async fn resolve(&self, shortcode: &str) -> Result<PostHandle> {
        let request = self
            .authorized(self.client.get(self.endpoint(&format!("media/{}", shortcode))?))?;
        let response = self.checked(request.send().await?).await?;
        Ok(response.json::<PostHandle>().await?)
    }

    async fn download(&self, post: &PostHandle, target_dir: &Path) -> Result<()> {
        for (index, resource) in post.resources.iter().enumerate() {
            let url = self
                .base_url
                .join(&resource.url)
                .map_err(|e| RelayError::InvalidLink {
                    url: resource.url.clone(),
                    reason: e.to_string(),
                })?;
            let bytes = self.fetch_resource(&url).await?;
            let file_name = format!(
                "{}_{}.{}",
                post.shortcode,
                index + 1,
                resource_extension(&url, resource.kind)
            );
            tracing::debug!("Writing {} bytes to {}", bytes.len(), file_name);
            tokio::fs::write(target_dir.join(file_name), bytes).await?;
        }

        if let Some(caption) = &post.caption {
            tokio::fs::write(target_dir.join(format!("{}.txt", post.shortcode)), caption).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for HttpSession {
    async fn upload_clip(&self, video: &Path, caption: &str) -> Result<String> {
        let data = tokio::fs::read(video).await?;
        let file_name = video
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip.mp4".to_string());
        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(video_mime(video))?;
        let form = Form::new()
            .text("caption", caption.to_string())
            .part("video", part);

        let request = self.authorized(self.client.post(self.endpoint("clips/upload")?))?;
        let response = self.checked(request.multipart(form).send().await?).await?;
        let status = response.status();
        let envelope = read_envelope(response).await?;

        envelope.media_id.ok_or_else(|| RelayError::RemoteError {
            status: status.as_u16(),
            message: "upload response did not include a media id".to_string(),
        })
    }
}

async fn read_envelope(response: Response) -> Result<ApiEnvelope> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| ApiEnvelope {
        message: (!text.trim().is_empty()).then(|| text.trim().to_string()),
        ..Default::default()
    }))
}

/// Maps a failed response onto the error classes the agents act on.
pub fn classify_failure(status: StatusCode, message: &str) -> RelayError {
    let lower = message.to_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lower.contains("rate limit")
        || lower.contains("wait a few minutes")
    {
        RelayError::RateLimited {
            message: message.to_string(),
        }
    } else if status == StatusCode::UNAUTHORIZED || lower.contains("login_required") {
        RelayError::SessionExpired {
            message: message.to_string(),
        }
    } else {
        RelayError::RemoteError {
            status: status.as_u16(),
            message: message.to_string(),
        }
    }
}

fn resource_extension(url: &Url, kind: MediaKind) -> String {
    let from_path = Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());
    from_path.unwrap_or_else(|| match kind {
        MediaKind::Video => "mp4".to_string(),
        MediaKind::Image => "jpg".to_string(),
    })
}

fn video_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => "video/mp4",
    }
}
