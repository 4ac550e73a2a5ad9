use crate::domain::model::Credentials;
use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_open_range, validate_path, validate_positive_number,
    validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DOWNLOAD_USERNAME_VAR: &str = "DOWNLOAD_USERNAME";
pub const DOWNLOAD_PASSWORD_VAR: &str = "DOWNLOAD_PASSWORD";
pub const UPLOAD_USERNAME_VAR: &str = "UPLOAD_USERNAME";
pub const UPLOAD_PASSWORD_VAR: &str = "UPLOAD_PASSWORD";
pub const REEL_CAPTION_VAR: &str = "REEL_CAPTION";
pub const API_BASE_URL_VAR: &str = "RELAY_API_BASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub download: DownloadConfig,
    pub upload: UploadConfig,
    pub aspect: AspectConfig,
    pub challenge: ChallengeConfig,
    pub api: ApiConfig,
    pub probe: ProbeConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub links_file: PathBuf,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub delay_seconds: u64,
    pub grace_seconds: u64,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub caption: Option<String>,
    pub delay_seconds: u64,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectConfig {
    pub target_ratio: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub max_attempts: u32,
    /// 0 disables the timeout.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub ffprobe_path: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            links_file: PathBuf::from("reels.txt"),
            output_dir: PathBuf::from("downloads"),
            temp_dir: PathBuf::from("temp_download"),
            delay_seconds: 5,
            grace_seconds: 2,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            caption: None,
            delay_seconds: 1000,
            extensions: vec!["mp4".to_string(), "mov".to_string(), "avi".to_string()],
        }
    }
}

impl Default for AspectConfig {
    fn default() -> Self {
        Self {
            target_ratio: 9.0 / 16.0,
            tolerance: 0.1,
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            timeout_seconds: 300,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_seconds: 60,
            user_agent: concat!("reel-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

// 密碼不進日誌
impl std::fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("links_file", &self.links_file)
            .field("output_dir", &self.output_dir)
            .field("temp_dir", &self.temp_dir)
            .field("delay_seconds", &self.delay_seconds)
            .field("grace_seconds", &self.grace_seconds)
            .finish()
    }
}

impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("caption", &self.caption)
            .field("delay_seconds", &self.delay_seconds)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl DownloadConfig {
    pub fn credentials(&self) -> Result<Credentials> {
        let username = validate_required_field("download.username", &self.username)?;
        let password = validate_required_field("download.password", &self.password)?;
        Ok(Credentials::new(username.as_str(), password.as_str()))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }
}

impl UploadConfig {
    pub fn credentials(&self) -> Result<Credentials> {
        let username = validate_required_field("upload.username", &self.username)?;
        let password = validate_required_field("upload.password", &self.password)?;
        Ok(Credentials::new(username.as_str(), password.as_str()))
    }

    pub fn caption(&self) -> Result<&str> {
        validate_required_field("upload.caption", &self.caption).map(String::as_str)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

impl ChallengeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_seconds))
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl RelayConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RelayError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RelayError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads the file when it exists, otherwise starts from defaults, then
    /// applies environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)?
        } else {
            tracing::debug!(
                "No configuration file at {}, using defaults",
                path.display()
            );
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${UPLOAD_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RelayError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |slot: &mut Option<String>, name: &str| {
            if let Some(value) = lookup(name) {
                *slot = Some(value);
            }
        };
        set(&mut self.download.username, DOWNLOAD_USERNAME_VAR);
        set(&mut self.download.password, DOWNLOAD_PASSWORD_VAR);
        set(&mut self.upload.username, UPLOAD_USERNAME_VAR);
        set(&mut self.upload.password, UPLOAD_PASSWORD_VAR);
        set(&mut self.upload.caption, REEL_CAPTION_VAR);

        if let Some(base_url) = lookup(API_BASE_URL_VAR) {
            self.api.base_url = base_url;
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let download = self.download.credentials()?;
        validate_non_empty_string("download.username", &download.username)?;
        validate_non_empty_string("download.password", &download.password)?;

        let upload = self.upload.credentials()?;
        validate_non_empty_string("upload.username", &upload.username)?;
        validate_non_empty_string("upload.password", &upload.password)?;
        validate_non_empty_string("upload.caption", self.upload.caption()?)?;

        validate_path("download.links_file", &self.download.links_file.to_string_lossy())?;
        validate_path("download.output_dir", &self.download.output_dir.to_string_lossy())?;
        validate_path("download.temp_dir", &self.download.temp_dir.to_string_lossy())?;
        // 暫存資料夾每個項目都會被整個刪掉
        if self.download.output_dir.starts_with(&self.download.temp_dir) {
            return Err(RelayError::InvalidConfigValueError {
                field: "download.temp_dir".to_string(),
                value: self.download.temp_dir.display().to_string(),
                reason: "Scratch directory must not contain the output directory".to_string(),
            });
        }

        validate_positive_number("upload.extensions", self.upload.extensions.len(), 1)?;
        for extension in &self.upload.extensions {
            validate_non_empty_string("upload.extensions", extension)?;
        }

        validate_open_range("aspect.target_ratio", self.aspect.target_ratio, 0.0, f64::MAX)?;
        validate_open_range("aspect.tolerance", self.aspect.tolerance, 0.0, 1.0)?;

        validate_positive_number(
            "challenge.max_attempts",
            self.challenge.max_attempts as usize,
            1,
        )?;

        validate_url("api.base_url", &self.api.base_url)?;
        validate_positive_number("api.timeout_seconds", self.api.timeout_seconds as usize, 1)?;
        validate_path("probe.ffprobe_path", &self.probe.ffprobe_path.to_string_lossy())?;

        Ok(())
    }
}

impl Validate for RelayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
