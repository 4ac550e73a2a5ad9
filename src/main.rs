use anyhow::Context;
use clap::Parser;
use console::style;
use reel_relay::adapters::{ConsolePrompt, FfprobeProbe, HttpSession};
use reel_relay::core::links::{shortcode_from_url, LinkSource};
use reel_relay::domain::model::RunResult;
use reel_relay::domain::ports::{CodePrompt, Pacer, VideoProbe};
use reel_relay::utils::{logger, validation::Validate};
use reel_relay::{
    AspectGate, ChallengeHandler, CliArgs, DownloadAgent, RelayConfig, RelayEngine, RelayError,
    SleepPacer, UploadAgent,
};
use std::sync::Arc;

fn print_header() {
    let rule = "=".repeat(50);
    println!("\n{}", style(&rule).cyan());
    println!("{}", style("Instagram Reel Downloader and Uploader").cyan());
    println!("{}\n", style(&rule).cyan());
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    print_header();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return;
    }

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("❌ Could not set up sessions: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let code = tokio::select! {
        result = engine.run() => exit_code(result),
        _ = tokio::signal::ctrl_c() => exit_code(Err(RelayError::Interrupted)),
    };
    // 不等待卡在輸入提示上的 blocking thread
    std::process::exit(code);
}

fn exit_code(result: reel_relay::Result<RunResult>) -> i32 {
    match result {
        Ok(summary) => {
            tracing::info!(
                "✅ Done: {} of {} reels downloaded, {} uploaded",
                summary.downloads_succeeded,
                summary.links_attempted,
                summary.uploads_succeeded
            );
            0
        }
        Err(e) if e.is_interrupt() => {
            println!("\n\nProgram interrupted. Exiting...");
            0
        }
        Err(e) => {
            tracing::error!(
                "❌ Failed to download reels: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            1
        }
    }
}

fn load_config(args: &CliArgs) -> anyhow::Result<RelayConfig> {
    let mut config = RelayConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    args.apply_to(&mut config);
    config.validate().context("configuration validation failed")?;
    Ok(config)
}

fn build_engine(config: &RelayConfig) -> reel_relay::Result<RelayEngine<HttpSession, HttpSession>> {
    let pacer: Arc<dyn Pacer> = Arc::new(SleepPacer::new());
    let prompt: Arc<dyn CodePrompt> = Arc::new(ConsolePrompt::new());
    let probe: Arc<dyn VideoProbe> = Arc::new(FfprobeProbe::new(&config.probe.ffprobe_path));
    let challenge = ChallengeHandler::new(
        prompt,
        config.challenge.max_attempts,
        config.challenge.timeout(),
    );

    // 下載與上傳各用獨立的 session
    let downloader = DownloadAgent::new(
        HttpSession::new(&config.api)?,
        config.download.clone(),
        pacer.clone(),
        challenge.clone(),
    );
    let uploader = UploadAgent::new(
        HttpSession::new(&config.api)?,
        config.upload.clone(),
        AspectGate::from(&config.aspect),
        probe,
        pacer,
        challenge,
    );
    Ok(RelayEngine::new(downloader, uploader))
}

fn perform_dry_run(config: &RelayConfig) {
    let source = LinkSource::new(&config.download.links_file);
    let links = match source.load() {
        Ok(links) => links,
        Err(e) => {
            tracing::error!("❌ Error reading file: {}", e);
            return;
        }
    };
    tracing::info!("📋 {} links in {}", links.len(), source.path().display());
    for (ordinal, url) in links.iter() {
        match shortcode_from_url(url) {
            Ok(code) => tracing::info!(
                "  {} -> {} ({})",
                ordinal,
                config.download.output_dir.join(format!("{}.mp4", ordinal)).display(),
                code
            ),
            Err(e) => tracing::warn!("  {} -> skipped: {}", ordinal, e),
        }
    }
    tracing::info!(
        "⬆️ Uploads would use caption {:?} with {}s between uploads",
        config.upload.caption.as_deref().unwrap_or_default(),
        config.upload.delay_seconds
    );
}
