use crate::core::download::DownloadAgent;
use crate::core::links::LinkSource;
use crate::core::upload::UploadAgent;
use crate::core::workspace::Workspace;
use crate::domain::model::RunResult;
use crate::domain::ports::{Authenticator, MediaFetcher, Publisher};
use crate::utils::error::{RelayError, Result};
use chrono::Utc;

/// Sequences workspace cleanup, the download phase and the upload phase.
pub struct RelayEngine<D, U>
where
    D: Authenticator + MediaFetcher,
    U: Authenticator + Publisher,
{
    downloader: DownloadAgent<D>,
    uploader: UploadAgent<U>,
}

impl<D, U> RelayEngine<D, U>
where
    D: Authenticator + MediaFetcher,
    U: Authenticator + Publisher,
{
    pub fn new(downloader: DownloadAgent<D>, uploader: UploadAgent<U>) -> Self {
        Self {
            downloader,
            uploader,
        }
    }

    /// Errors mean the download phase produced nothing or the user stopped the
    /// run; other upload-phase problems are logged and reflected in the counts only.
    pub async fn run(&self) -> Result<RunResult> {
        let started_at = Utc::now();
        let config = self.downloader.config();
        tracing::info!("🚀 Starting reel relay");

        // 每次執行前清空下載資料夾
        let workspace = Workspace::new(&config.output_dir);
        workspace.prepare()?;

        let source = LinkSource::new(&config.links_file);
        let links = match source.load() {
            Ok(links) => links,
            Err(e) => {
                tracing::error!("❌ Error reading file: {}", e);
                Default::default()
            }
        };
        if links.is_empty() {
            return Err(RelayError::InputAbsent {
                message: format!("No valid links found in {}", source.path().display()),
            });
        }

        let download_report = self.downloader.run(&links).await?;
        if download_report.succeeded() == 0 {
            return Err(RelayError::NoDownloads {
                attempted: download_report.attempted(),
            });
        }
        tracing::info!("✅ Reels downloaded successfully!");

        tracing::info!("🚀 Starting upload process...");
        let (uploads_attempted, uploads_succeeded) =
            match self.uploader.run(workspace.root()).await {
                Ok(report) => (report.attempted(), report.published()),
                Err(e) if e.is_interrupt() => return Err(e),
                Err(e) => {
                    tracing::error!("❌ Upload phase stopped: {}", e);
                    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                    (0, 0)
                }
            };

        let result = RunResult {
            links_attempted: download_report.attempted(),
            downloads_succeeded: download_report.succeeded(),
            uploads_attempted,
            uploads_succeeded,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            "📊 Run finished: {}/{} downloaded, {}/{} uploaded",
            result.downloads_succeeded,
            result.links_attempted,
            result.uploads_succeeded,
            result.uploads_attempted
        );
        Ok(result)
    }
}
