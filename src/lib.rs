pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::RelayConfig;

pub use core::{
    challenge::ChallengeHandler, download::DownloadAgent, engine::RelayEngine,
    pacing::SleepPacer, upload::AspectGate, upload::UploadAgent,
};
pub use utils::error::{RelayError, Result};
