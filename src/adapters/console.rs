use crate::domain::ports::CodePrompt;
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use console::style;
use dialoguer::Input;
use std::io::ErrorKind;

/// Reads verification codes from the terminal.
#[derive(Debug, Clone, Default)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CodePrompt for ConsolePrompt {
    async fn read_code(&self, username: &str) -> Result<Option<String>> {
        let prompt = format!(
            "{} Enter the 6-digit code from your email",
            style(format!("[{}]", username)).cyan()
        );

        // dialoguer 會阻塞，丟到 blocking thread
        let answer = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|e| RelayError::IoError(std::io::Error::other(e)))?;

        prompt_answer(answer)
    }
}

/// Ctrl-C in raw mode arrives as an `Interrupted` read, not a signal.
fn prompt_answer(answer: std::result::Result<String, dialoguer::Error>) -> Result<Option<String>> {
    match answer {
        Ok(code) => Ok(Some(code)),
        Err(dialoguer::Error::IO(e)) if e.kind() == ErrorKind::Interrupted => {
            Err(RelayError::Interrupted)
        }
        Err(e) => {
            tracing::debug!("Prompt closed: {}", e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_answer_mapping() {
        assert_eq!(
            prompt_answer(Ok("123456".to_string())).unwrap(),
            Some("123456".to_string())
        );

        let interrupted = dialoguer::Error::IO(std::io::Error::from(ErrorKind::Interrupted));
        assert!(matches!(
            prompt_answer(Err(interrupted)),
            Err(RelayError::Interrupted)
        ));

        let closed = dialoguer::Error::IO(std::io::Error::from(ErrorKind::UnexpectedEof));
        assert_eq!(prompt_answer(Err(closed)).unwrap(), None);
    }
}
