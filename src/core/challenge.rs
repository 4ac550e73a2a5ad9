use crate::domain::model::{Credentials, LoginOutcome};
use crate::domain::ports::{Authenticator, CodePrompt};
use crate::utils::error::{RelayError, Result};
use std::sync::Arc;
use std::time::Duration;

pub const CODE_LENGTH: usize = 6;

/// Drives the verification-code loop after a login reports a challenge.
#[derive(Clone)]
pub struct ChallengeHandler {
    prompt: Arc<dyn CodePrompt>,
    max_attempts: u32,
    timeout: Option<Duration>,
}

impl ChallengeHandler {
    pub fn new(prompt: Arc<dyn CodePrompt>, max_attempts: u32, timeout: Option<Duration>) -> Self {
        Self {
            prompt,
            max_attempts,
            timeout,
        }
    }

    pub async fn resolve<A>(&self, session: &A, username: &str) -> Result<()>
    where
        A: Authenticator + ?Sized,
    {
        tracing::info!("🔐 Instagram requires verification for {}", username);
        tracing::info!("📧 Please check your email for the verification code.");

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.code_loop(session, username))
                .await
                .map_err(|_| RelayError::ChallengeAborted {
                    username: username.to_string(),
                    reason: format!("no code accepted within {:?}", limit),
                })?,
            None => self.code_loop(session, username).await,
        }
    }

    async fn code_loop<A>(&self, session: &A, username: &str) -> Result<()>
    where
        A: Authenticator + ?Sized,
    {
        let mut attempts = 0;
        while attempts < self.max_attempts {
            let Some(input) = self.prompt.read_code(username).await? else {
                return Err(RelayError::ChallengeAborted {
                    username: username.to_string(),
                    reason: "input closed".to_string(),
                });
            };
            let code = input.trim();

            // 格式不對不算一次嘗試
            if !is_valid_code(code) {
                tracing::warn!("⚠️ Please enter a valid {}-digit code.", CODE_LENGTH);
                continue;
            }

            attempts += 1;
            match session.submit_challenge_code(code).await {
                Ok(()) => {
                    tracing::info!("✅ Verification successful!");
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Invalid code ({}/{}). Please try again. Error: {}",
                        attempts,
                        self.max_attempts,
                        e
                    );
                }
            }
        }

        Err(RelayError::ChallengeAborted {
            username: username.to_string(),
            reason: format!("{} codes rejected", self.max_attempts),
        })
    }
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

/// Logs in, falling back to the challenge flow when the platform asks for it.
pub async fn sign_in<A>(
    session: &A,
    credentials: &Credentials,
    challenge: &ChallengeHandler,
) -> Result<()>
where
    A: Authenticator + ?Sized,
{
    tracing::info!("🔑 Logging in as {}...", credentials.username);
    match session.login(credentials).await {
        Ok(LoginOutcome::LoggedIn) => {}
        Ok(LoginOutcome::ChallengeRequired) => {
            challenge.resolve(session, &credentials.username).await?;
        }
        Err(e @ RelayError::AuthenticationFailed { .. }) => return Err(e),
        Err(e) => {
            return Err(RelayError::AuthenticationFailed {
                username: credentials.username.clone(),
                message: e.to_string(),
            })
        }
    }
    tracing::info!("✅ Successfully logged in as {}", credentials.username);
    Ok(())
}
