pub mod challenge;
pub mod download;
pub mod engine;
pub mod links;
pub mod pacing;
pub mod upload;
pub mod workspace;

pub use crate::domain::model::{DownloadOutcome, LinkList, RunResult, UploadOutcome};
pub use crate::domain::ports::{
    Authenticator, CodePrompt, MediaFetcher, Pacer, Publisher, VideoProbe,
};
pub use crate::utils::error::Result;
