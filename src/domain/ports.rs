use crate::domain::model::{Credentials, Dimensions, LoginOutcome, PostHandle};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome>;
    async fn submit_challenge_code(&self, code: &str) -> Result<()>;
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn resolve(&self, shortcode: &str) -> Result<PostHandle>;
    /// Writes the post's media files into `target_dir`.
    async fn download(&self, post: &PostHandle, target_dir: &Path) -> Result<()>;
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the platform's media id of the new clip.
    async fn upload_clip(&self, video: &Path, caption: &str) -> Result<String>;
}

pub trait VideoProbe: Send + Sync {
    fn dimensions(&self, video: &Path) -> Result<Dimensions>;
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn wait(&self, delay: Duration);
    async fn countdown(&self, delay: Duration, label: &str);
}

#[async_trait]
pub trait CodePrompt: Send + Sync {
    /// `Ok(None)` means input ended and the user gave up.
    async fn read_code(&self, username: &str) -> Result<Option<String>>;
}
