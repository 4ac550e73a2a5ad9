#![allow(dead_code)]

use async_trait::async_trait;
use reel_relay::config::RelayConfig;
use reel_relay::domain::model::{
    Credentials, Dimensions, LoginOutcome, MediaKind, MediaResource, PostHandle,
};
use reel_relay::domain::ports::{
    Authenticator, CodePrompt, MediaFetcher, Pacer, Publisher, VideoProbe,
};
use reel_relay::{
    AspectGate, ChallengeHandler, DownloadAgent, RelayEngine, RelayError, Result, UploadAgent,
};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fetch {
    Video,
    NoVideo,
    TwoVideos,
    RateLimited,
    SessionExpired,
    FailAfterPartialWrite,
}

/// In-memory stand-in for an account session.
#[derive(Clone)]
pub struct FakeSession {
    pub login_outcome: LoginOutcome,
    pub login_error: bool,
    pub behaviors: Arc<HashMap<String, Fetch>>,
    pub failing_uploads: Arc<Vec<String>>,
    pub logins: Arc<Mutex<usize>>,
    pub resolved: Arc<Mutex<Vec<String>>>,
    pub uploads: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub codes: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            login_outcome: LoginOutcome::LoggedIn,
            login_error: false,
            behaviors: Arc::new(HashMap::new()),
            failing_uploads: Arc::new(Vec::new()),
            logins: Arc::new(Mutex::new(0)),
            resolved: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            codes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_behavior(mut self, shortcode: &str, fetch: Fetch) -> Self {
        let mut behaviors = (*self.behaviors).clone();
        behaviors.insert(shortcode.to_string(), fetch);
        self.behaviors = Arc::new(behaviors);
        self
    }

    pub fn failing_login(mut self) -> Self {
        self.login_error = true;
        self
    }

    pub fn requiring_challenge(mut self) -> Self {
        self.login_outcome = LoginOutcome::ChallengeRequired;
        self
    }

    pub fn failing_upload(mut self, file_name: &str) -> Self {
        let mut failing = (*self.failing_uploads).clone();
        failing.push(file_name.to_string());
        self.failing_uploads = Arc::new(failing);
        self
    }

    pub fn login_count(&self) -> usize {
        *self.logins.lock().unwrap()
    }

    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authenticator for FakeSession {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        *self.logins.lock().unwrap() += 1;
        if self.login_error {
            return Err(RelayError::AuthenticationFailed {
                username: credentials.username.clone(),
                message: "bad password".to_string(),
            });
        }
        Ok(self.login_outcome.clone())
    }

    async fn submit_challenge_code(&self, code: &str) -> Result<()> {
        self.codes.lock().unwrap().push(code.to_string());
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for FakeSession {
    async fn resolve(&self, shortcode: &str) -> Result<PostHandle> {
        self.resolved.lock().unwrap().push(shortcode.to_string());
        match self.behaviors.get(shortcode).copied().unwrap_or(Fetch::Video) {
            Fetch::RateLimited => Err(RelayError::RateLimited {
                message: "Please wait a few minutes before you try again.".to_string(),
            }),
            Fetch::SessionExpired => Err(RelayError::SessionExpired {
                message: "login_required".to_string(),
            }),
            _ => Ok(PostHandle {
                shortcode: shortcode.to_string(),
                caption: Some("original caption".to_string()),
                resources: vec![MediaResource {
                    url: format!("https://cdn.example.com/{}.mp4", shortcode),
                    kind: MediaKind::Video,
                }],
            }),
        }
    }

    async fn download(&self, post: &PostHandle, target_dir: &Path) -> Result<()> {
        let code = &post.shortcode;
        std::fs::write(target_dir.join(format!("{}.jpg", code)), b"cover")?;
        std::fs::write(target_dir.join(format!("{}.txt", code)), b"caption")?;
        match self.behaviors.get(code).copied().unwrap_or(Fetch::Video) {
            Fetch::Video => {
                std::fs::write(target_dir.join(format!("{}.mp4", code)), code.as_bytes())?;
            }
            Fetch::TwoVideos => {
                std::fs::write(target_dir.join(format!("{}_1.mp4", code)), b"one")?;
                std::fs::write(target_dir.join(format!("{}_2.mp4", code)), b"two")?;
            }
            Fetch::FailAfterPartialWrite => {
                std::fs::write(target_dir.join(format!("{}.mp4", code)), b"partial")?;
                return Err(RelayError::RemoteError {
                    status: 502,
                    message: "connection reset".to_string(),
                });
            }
            Fetch::NoVideo | Fetch::RateLimited | Fetch::SessionExpired => {}
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for FakeSession {
    async fn upload_clip(&self, video: &Path, caption: &str) -> Result<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((video.to_path_buf(), caption.to_string()));
        let name = video.file_name().unwrap().to_string_lossy().to_string();
        if self.failing_uploads.contains(&name) {
            return Err(RelayError::RemoteError {
                status: 500,
                message: "transcode failed".to_string(),
            });
        }
        Ok(format!("media-{}", name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pause {
    Wait(Duration),
    Countdown(Duration),
}

/// Records requested delays instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingPacer {
    pub pauses: Arc<Mutex<Vec<Pause>>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<Pause> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn wait(&self, delay: Duration) {
        self.pauses.lock().unwrap().push(Pause::Wait(delay));
    }

    async fn countdown(&self, delay: Duration, _label: &str) {
        self.pauses.lock().unwrap().push(Pause::Countdown(delay));
    }
}

/// Dimensions by file name; everything else is 1080x1920.
#[derive(Clone, Default)]
pub struct FixedProbe {
    pub sizes: HashMap<String, Dimensions>,
    pub unreadable: Vec<String>,
}

impl VideoProbe for FixedProbe {
    fn dimensions(&self, video: &Path) -> Result<Dimensions> {
        let name = video.file_name().unwrap().to_string_lossy().to_string();
        if self.unreadable.contains(&name) {
            return Err(RelayError::ProbeFailed {
                path: video.to_path_buf(),
                message: "moov atom not found".to_string(),
            });
        }
        Ok(self
            .sizes
            .get(&name)
            .copied()
            .unwrap_or(Dimensions::new(1080, 1920)))
    }
}

pub struct ScriptedPrompt {
    inputs: Mutex<VecDeque<String>>,
}

impl ScriptedPrompt {
    pub fn new(inputs: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inputs: Mutex::new(inputs.iter().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait]
impl CodePrompt for ScriptedPrompt {
    async fn read_code(&self, _username: &str) -> Result<Option<String>> {
        Ok(self.inputs.lock().unwrap().pop_front())
    }
}

/// Behaves like Ctrl-C pressed at the code prompt.
pub struct InterruptingPrompt;

#[async_trait]
impl CodePrompt for InterruptingPrompt {
    async fn read_code(&self, _username: &str) -> Result<Option<String>> {
        Err(RelayError::Interrupted)
    }
}

/// Valid config rooted in `root`, with the default delays.
pub fn test_config(root: &Path) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.download.username = Some("source_account".to_string());
    config.download.password = Some("source_pass".to_string());
    config.download.links_file = root.join("reels.txt");
    config.download.output_dir = root.join("downloads");
    config.download.temp_dir = root.join("temp_download");
    config.upload.username = Some("target_account".to_string());
    config.upload.password = Some("target_pass".to_string());
    config.upload.caption = Some("Shared caption #reels".to_string());
    config
}

pub fn write_links(config: &RelayConfig, shortcodes: &[&str]) {
    let content: String = shortcodes
        .iter()
        .map(|code| format!("https://www.instagram.com/reel/{}/\n\n", code))
        .collect();
    std::fs::write(&config.download.links_file, content).unwrap();
}

pub struct Harness {
    pub engine: RelayEngine<FakeSession, FakeSession>,
    pub download_session: FakeSession,
    pub upload_session: FakeSession,
    pub pacer: RecordingPacer,
}

pub fn harness(
    config: &RelayConfig,
    download_session: FakeSession,
    upload_session: FakeSession,
    probe: FixedProbe,
) -> Harness {
    harness_with_prompt(
        config,
        download_session,
        upload_session,
        probe,
        ScriptedPrompt::new(&["123456"]),
    )
}

pub fn harness_with_prompt(
    config: &RelayConfig,
    download_session: FakeSession,
    upload_session: FakeSession,
    probe: FixedProbe,
    prompt: Arc<dyn CodePrompt>,
) -> Harness {
    let pacer = RecordingPacer::default();
    let challenge = ChallengeHandler::new(prompt, 3, None);
    let downloader = DownloadAgent::new(
        download_session.clone(),
        config.download.clone(),
        Arc::new(pacer.clone()),
        challenge.clone(),
    );
    let uploader = UploadAgent::new(
        upload_session.clone(),
        config.upload.clone(),
        AspectGate::from(&config.aspect),
        Arc::new(probe),
        Arc::new(pacer.clone()),
        challenge,
    );
    Harness {
        engine: RelayEngine::new(downloader, uploader),
        download_session,
        upload_session,
        pacer,
    }
}
