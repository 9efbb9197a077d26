use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use console::style;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::Result;

/// Durable per-channel record of finished and failed video IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub failed: Vec<String>,
}

impl ChannelState {
    /// Load state from disk. A missing or corrupt file yields a fresh state.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                eprintln!(
                    "{} Cannot read state {}: {}",
                    style("[ytqueue]").red().bold(),
                    path.display(),
                    e
                );
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                eprintln!(
                    "{} Invalid state JSON {}: {}",
                    style("[ytqueue]").red().bold(),
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Write the state next to its final path, then rename over it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), self)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }

    pub fn is_completed(&self, video_id: &str) -> bool {
        self.completed.iter().any(|id| id == video_id)
    }

    pub fn mark_completed(&mut self, video_id: &str) {
        if !self.is_completed(video_id) {
            self.completed.push(video_id.to_string());
        }
        self.failed.retain(|id| id != video_id);
    }

    pub fn mark_failed(&mut self, video_id: &str) {
        if !self.failed.iter().any(|id| id == video_id) {
            self.failed.push(video_id.to_string());
        }
    }
}
