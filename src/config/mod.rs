#[cfg(feature = "cli")]
pub mod cli;
pub mod relay_config;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use relay_config::RelayConfig;
