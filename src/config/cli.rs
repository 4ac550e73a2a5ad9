use crate::config::relay_config::RelayConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "reel-relay")]
#[command(about = "Download reels with one account and re-upload them with another")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "reel-relay.toml")]
    pub config: PathBuf,

    /// Override the links file (one reel URL per line)
    #[arg(long)]
    pub links_file: Option<PathBuf>,

    /// Override the downloads directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Override the caption used for every upload
    #[arg(long)]
    pub caption: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Show what would be processed without logging in or touching files
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// 命令列參數優先於檔案與環境變數
    pub fn apply_to(&self, config: &mut RelayConfig) {
        if let Some(links_file) = &self.links_file {
            config.download.links_file = links_file.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.download.output_dir = output_dir.clone();
        }
        if let Some(caption) = &self.caption {
            config.upload.caption = Some(caption.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::parse_from([
            "reel-relay",
            "--links-file",
            "batch.txt",
            "--caption",
            "New caption",
            "--dry-run",
        ]);
        let mut config = RelayConfig::default();
        args.apply_to(&mut config);

        assert!(args.dry_run);
        assert_eq!(config.download.links_file, PathBuf::from("batch.txt"));
        assert_eq!(config.download.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.upload.caption.as_deref(), Some("New caption"));
    }
}
