use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Lists directory not found: {}", .0.display())]
    ListsDirMissing(PathBuf),

    #[error("yt-dlp {0}")]
    ToolExit(ExitStatus),

    #[error("Could not launch yt-dlp: {0}")]
    Spawn(std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Only a missing lists directory ends the process with a failure code.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ListsDirMissing(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
