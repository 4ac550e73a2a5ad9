use crate::domain::ports::Pacer;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Fixed delays backed by `tokio::time::sleep`, with a terminal countdown.
#[derive(Debug, Clone, Default)]
pub struct SleepPacer;

impl SleepPacer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Pacer for SleepPacer {
    async fn wait(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        tracing::debug!("Sleeping for {:?}", delay);
        tokio::time::sleep(delay).await;
    }

    async fn countdown(&self, delay: Duration, label: &str) {
        let total = delay.as_secs();
        let style = ProgressStyle::with_template("{prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_prefix(label.to_string());

        for remaining in (1..=total).rev() {
            bar.set_message(format_clock(remaining));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        // 不足一秒的部分
        let remainder = delay - Duration::from_secs(total);
        if !remainder.is_zero() {
            tokio::time::sleep(remainder).await;
        }
        bar.finish_with_message(format_clock(0));
    }
}

/// Formats seconds as `HH:MM:SS`; hours are not capped at 24.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
