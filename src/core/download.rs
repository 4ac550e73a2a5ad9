use crate::config::relay_config::DownloadConfig;
use crate::core::challenge::{sign_in, ChallengeHandler};
use crate::core::links::shortcode_from_url;
use crate::core::workspace::ScratchDir;
use crate::domain::model::{
    DownloadFailure, DownloadItem, DownloadOutcome, DownloadReport, LinkList,
};
use crate::domain::ports::{Authenticator, MediaFetcher, Pacer};
use crate::utils::error::{RelayError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Download side of the relay: one session, one fetch per link.
pub struct DownloadAgent<S: Authenticator + MediaFetcher> {
    session: S,
    config: DownloadConfig,
    pacer: Arc<dyn Pacer>,
    challenge: ChallengeHandler,
}

impl<S: Authenticator + MediaFetcher> DownloadAgent<S> {
    pub fn new(
        session: S,
        config: DownloadConfig,
        pacer: Arc<dyn Pacer>,
        challenge: ChallengeHandler,
    ) -> Self {
        Self {
            session,
            config,
            pacer,
            challenge,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Logs in once, then processes every link. A login failure is returned
    /// as an error; item failures are recorded in the report.
    pub async fn run(&self, links: &LinkList) -> Result<DownloadReport> {
        let credentials = self.config.credentials()?;
        sign_in(&self.session, &credentials, &self.challenge).await?;

        let total = links.len();
        tracing::info!("📋 Found {} links to process.", total);

        let mut report = DownloadReport::default();
        for (ordinal, url) in links.iter() {
            tracing::info!("⬇️ Processing link {}/{}", ordinal, total);
            let outcome = self.download_item(ordinal, url).await;
            log_outcome(ordinal, total, &outcome);

            let item = DownloadItem {
                ordinal,
                url: url.to_string(),
                output: match &outcome {
                    DownloadOutcome::Saved(path) => Some(path.clone()),
                    DownloadOutcome::Failed(_) => None,
                },
            };
            report.items.push((item, outcome));

            if ordinal < total {
                self.pacer.wait(self.config.delay()).await;
            }
        }

        tracing::info!(
            "📊 Download complete! Successfully downloaded {} out of {} reels.",
            report.succeeded(),
            total
        );
        Ok(report)
    }

    pub async fn download_item(&self, ordinal: usize, url: &str) -> DownloadOutcome {
        let shortcode = match shortcode_from_url(url) {
            Ok(code) => code,
            Err(e) => return DownloadOutcome::Failed(DownloadFailure::InvalidLink(e.to_string())),
        };
        tracing::debug!("Link {} resolves to shortcode {}", ordinal, shortcode);

        self.pacer.wait(self.config.grace()).await;

        let scratch = match ScratchDir::create(&self.config.temp_dir) {
            Ok(scratch) => scratch,
            Err(e) => return DownloadOutcome::Failed(classify(e)),
        };

        let outcome = match self.fetch_into(&shortcode, scratch.path()).await {
            Ok(()) => match self.promote(scratch.path(), ordinal) {
                Ok(outcome) => outcome,
                Err(e) => DownloadOutcome::Failed(classify(e)),
            },
            Err(e) => DownloadOutcome::Failed(classify(e)),
        };

        if let Err(e) = scratch.close() {
            tracing::warn!("⚠️ Could not clean up temporary directory: {}", e);
        }
        outcome
    }

    async fn fetch_into(&self, shortcode: &str, target: &Path) -> Result<()> {
        let post = self.session.resolve(shortcode).await?;
        tracing::debug!(
            "Post {} has {} media resources",
            post.shortcode,
            post.resources.len()
        );
        self.session.download(&post, target).await
    }

    /// Moves the single MP4 in `scratch` to `{output_dir}/{ordinal}.mp4`.
    fn promote(&self, scratch: &Path, ordinal: usize) -> Result<DownloadOutcome> {
        let mut videos = find_mp4_files(scratch)?;
        match videos.len() {
            0 => Ok(DownloadOutcome::Failed(DownloadFailure::NoVideo)),
            1 => {
                fs::create_dir_all(&self.config.output_dir)?;
                let destination = self.config.output_dir.join(format!("{}.mp4", ordinal));
                move_file(&videos.remove(0), &destination)?;
                Ok(DownloadOutcome::Saved(destination))
            }
            count => Ok(DownloadOutcome::Failed(DownloadFailure::Ambiguous(count))),
        }
    }
}

fn classify(error: RelayError) -> DownloadFailure {
    match error {
        RelayError::RateLimited { message } => DownloadFailure::RateLimited(message),
        RelayError::SessionExpired { message } => DownloadFailure::SessionExpired(message),
        RelayError::InvalidLink { reason, .. } => DownloadFailure::InvalidLink(reason),
        other => DownloadFailure::Other(other.to_string()),
    }
}

fn log_outcome(ordinal: usize, total: usize, outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Saved(path) => {
            tracing::info!(
                "✅ Downloaded reel {}/{} to {}",
                ordinal,
                total,
                path.display()
            );
        }
        DownloadOutcome::Failed(DownloadFailure::RateLimited(_)) => {
            tracing::warn!(
                "⚠️ Rate limit reached. Please wait a few minutes before trying again."
            );
        }
        DownloadOutcome::Failed(DownloadFailure::SessionExpired(_)) => {
            tracing::error!("❌ Session expired. Please log in again.");
        }
        DownloadOutcome::Failed(failure) => {
            tracing::error!("❌ Error downloading reel {}/{}: {}", ordinal, total, failure);
        }
    }
}

/// MP4 files directly under `dir`, sorted by name.
pub fn find_mp4_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_mp4 = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("mp4"))
            .unwrap_or(false);
        if is_mp4 && entry.file_type()?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `rename`, falling back to copy + remove across filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}
