use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One account identity. The password is kept out of `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Ordered source URLs, loaded once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkList {
    links: Vec<String>,
}

impl LinkList {
    pub fn new(links: Vec<String>) -> Self {
        Self { links }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Yields `(ordinal, url)` with 1-based ordinals.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.links
            .iter()
            .enumerate()
            .map(|(index, link)| (index + 1, link.as_str()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.links
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    ChallengeRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaResource {
    pub url: String,
    pub kind: MediaKind,
}

/// A resolved post, ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostHandle {
    pub shortcode: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub resources: Vec<MediaResource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// width / height, `None` for a zero height.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub ordinal: usize,
    pub url: String,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadFailure {
    InvalidLink(String),
    RateLimited(String),
    SessionExpired(String),
    NoVideo,
    Ambiguous(usize),
    Other(String),
}

impl fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadFailure::InvalidLink(reason) => write!(f, "invalid link: {}", reason),
            DownloadFailure::RateLimited(message) => write!(f, "rate limited: {}", message),
            DownloadFailure::SessionExpired(message) => write!(f, "session expired: {}", message),
            DownloadFailure::NoVideo => write!(f, "no MP4 file found in the downloaded content"),
            DownloadFailure::Ambiguous(count) => {
                write!(f, "{} MP4 files found where one was expected", count)
            }
            DownloadFailure::Other(message) => write!(f, "{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    Failed(DownloadFailure),
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    AspectMismatch { dimensions: Dimensions },
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AspectMismatch { dimensions } => write!(
                f,
                "{}x{} does not have a 9:16 aspect ratio",
                dimensions.width, dimensions.height
            ),
            SkipReason::Unreadable(message) => write!(f, "unreadable video: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Published(String),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadItem {
    pub path: PathBuf,
    pub dimensions: Option<Dimensions>,
    pub accepted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub items: Vec<(DownloadItem, DownloadOutcome)>,
}

impl DownloadReport {
    pub fn attempted(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| outcome.is_saved())
            .count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub items: Vec<(UploadItem, UploadOutcome)>,
}

impl UploadReport {
    pub fn candidates(&self) -> usize {
        self.items.len()
    }

    /// Candidates that passed the aspect check and reached the publisher.
    pub fn attempted(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, UploadOutcome::Skipped(_)))
            .count()
    }

    pub fn published(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| matches!(outcome, UploadOutcome::Published(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| matches!(outcome, UploadOutcome::Skipped(_)))
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub links_attempted: usize,
    pub downloads_succeeded: usize,
    pub uploads_attempted: usize,
    pub uploads_succeeded: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
