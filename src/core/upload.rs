use crate::config::relay_config::{AspectConfig, UploadConfig};
use crate::core::challenge::{sign_in, ChallengeHandler};
use crate::domain::model::{Dimensions, SkipReason, UploadItem, UploadOutcome, UploadReport};
use crate::domain::ports::{Authenticator, Pacer, Publisher, VideoProbe};
use crate::utils::error::{RelayError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const COUNTDOWN_LABEL: &str = "Next upload in:";

/// Accepts videos whose width/height is close enough to the target ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectGate {
    pub target_ratio: f64,
    pub tolerance: f64,
}

impl AspectGate {
    pub fn new(target_ratio: f64, tolerance: f64) -> Self {
        Self {
            target_ratio,
            tolerance,
        }
    }

    pub fn accepts(&self, dimensions: Dimensions) -> bool {
        dimensions
            .aspect_ratio()
            .map(|ratio| (ratio - self.target_ratio).abs() < self.tolerance)
            .unwrap_or(false)
    }
}

impl From<&AspectConfig> for AspectGate {
    fn from(config: &AspectConfig) -> Self {
        Self::new(config.target_ratio, config.tolerance)
    }
}

impl Default for AspectGate {
    fn default() -> Self {
        Self::from(&AspectConfig::default())
    }
}

/// Upload side of the relay.
pub struct UploadAgent<S: Authenticator + Publisher> {
    session: S,
    config: UploadConfig,
    gate: AspectGate,
    probe: Arc<dyn VideoProbe>,
    pacer: Arc<dyn Pacer>,
    challenge: ChallengeHandler,
}

impl<S: Authenticator + Publisher> UploadAgent<S> {
    pub fn new(
        session: S,
        config: UploadConfig,
        gate: AspectGate,
        probe: Arc<dyn VideoProbe>,
        pacer: Arc<dyn Pacer>,
        challenge: ChallengeHandler,
    ) -> Self {
        Self {
            session,
            config,
            gate,
            probe,
            pacer,
            challenge,
        }
    }

    /// Publishes every recognised video in `video_dir`.
    pub async fn run(&self, video_dir: &Path) -> Result<UploadReport> {
        let credentials = self.config.credentials()?;
        let caption = self.config.caption()?;
        sign_in(&self.session, &credentials, &self.challenge).await?;

        let candidates = collect_candidates(video_dir, &self.config.extensions)?;
        if candidates.is_empty() {
            return Err(RelayError::InputAbsent {
                message: format!("No video files found in {}", video_dir.display()),
            });
        }

        let total = candidates.len();
        tracing::info!("📋 Found {} video files to upload.", total);

        let mut report = UploadReport::default();
        for (index, path) in candidates.into_iter().enumerate() {
            let position = index + 1;
            let name = display_name(&path);
            tracing::info!("⬆️ Processing {} ({}/{})...", name, position, total);

            let (item, outcome) = self.upload_item(path, caption).await;
            let published = matches!(outcome, UploadOutcome::Published(_));
            report.items.push((item, outcome));

            if published && position < total {
                tracing::info!(
                    "⏳ Waiting {} seconds before next upload...",
                    self.config.delay_seconds
                );
                self.pacer
                    .countdown(self.config.delay(), COUNTDOWN_LABEL)
                    .await;
            }
        }

        tracing::info!(
            "✅ All videos have been processed! {} published, {} skipped, {} failed.",
            report.published(),
            report.skipped(),
            report.attempted() - report.published()
        );
        Ok(report)
    }

    /// ffprobe 是同步子程序，丟到 blocking thread
    async fn probe_dimensions(&self, path: &Path) -> Result<Dimensions> {
        let probe = self.probe.clone();
        let video = path.to_path_buf();
        tokio::task::spawn_blocking(move || probe.dimensions(&video))
            .await
            .map_err(|e| RelayError::ProbeFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
    }

    async fn upload_item(&self, path: PathBuf, caption: &str) -> (UploadItem, UploadOutcome) {
        let name = display_name(&path);

        let dimensions = match self.probe_dimensions(&path).await {
            Ok(dimensions) => dimensions,
            Err(e) => {
                tracing::warn!("⚠️ Could not read {}: {}. Skipping...", name, e);
                let item = UploadItem {
                    path,
                    dimensions: None,
                    accepted: false,
                };
                return (item, UploadOutcome::Skipped(SkipReason::Unreadable(e.to_string())));
            }
        };

        let accepted = self.gate.accepts(dimensions);
        let item = UploadItem {
            path,
            dimensions: Some(dimensions),
            accepted,
        };
        if !accepted {
            tracing::warn!(
                "⚠️ Warning: {} does not have 9:16 aspect ratio ({}x{}). Skipping...",
                name,
                dimensions.width,
                dimensions.height
            );
            return (
                item,
                UploadOutcome::Skipped(SkipReason::AspectMismatch { dimensions }),
            );
        }

        match self.session.upload_clip(&item.path, caption).await {
            Ok(media_id) => {
                tracing::info!("✅ Successfully uploaded {} as a reel! ({})", name, media_id);
                (item, UploadOutcome::Published(media_id))
            }
            Err(e) => {
                tracing::error!("❌ Error uploading {}: {}", name, e);
                (item, UploadOutcome::Failed(e.to_string()))
            }
        }
    }
}

/// Files in `dir` with a recognised extension, in directory-listing order.
pub fn collect_candidates(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let recognised = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);
        if recognised {
            candidates.push(path);
        }
    }
    Ok(candidates)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
