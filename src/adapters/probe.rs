//! Video dimensions via `ffprobe`

use crate::domain::model::Dimensions;
use crate::domain::ports::VideoProbe;
use crate::utils::error::{RelayError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl VideoProbe for FfprobeProbe {
    fn dimensions(&self, video: &Path) -> Result<Dimensions> {
        let failed = |message: String| RelayError::ProbeFailed {
            path: video.to_path_buf(),
            message,
        };

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height",
                "-of",
                "json",
            ])
            .arg(video)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| failed(format!("could not run {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            return Err(failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
            .map_err(|e| failed(e.to_string()))
    }
}

/// Reads the first video stream's size from ffprobe's JSON output.
pub fn parse_probe_output(stdout: &str) -> Result<Dimensions> {
    let parsed: ProbeOutput = serde_json::from_str(stdout)?;
    parsed
        .streams
        .into_iter()
        .find_map(|stream| match (stream.width, stream.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Some(Dimensions::new(width, height))
            }
            _ => None,
        })
        .ok_or_else(|| RelayError::ProbeFailed {
            path: PathBuf::new(),
            message: "no video stream with dimensions".to_string(),
        })
}
