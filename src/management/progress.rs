use std::{collections::HashSet, io::ErrorKind, path::PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::{info, warning};

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Failed to write to log file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Track URIs that were already added to the playlist, backed by an
/// append-only text file with one URI per line.
pub struct ProgressLog {
    path: PathBuf,
    processed: HashSet<String>,
}

impl ProgressLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            processed: HashSet::new(),
        }
    }

    /// Reads the log file into memory and returns the number of known URIs.
    ///
    /// A missing file means a fresh start. Any other read failure is reported
    /// and the log is treated as empty.
    pub async fn load(&mut self) -> usize {
        match async_fs::read_to_string(&self.path).await {
            Ok(content) => {
                self.processed = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                info!(
                    "Loaded {} previously processed song URIs from {}.",
                    self.processed.len(),
                    self.path.display()
                );
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.processed.clear();
                info!(
                    "Log file '{}' not found. Starting fresh.",
                    self.path.display()
                );
            }
            Err(e) => {
                self.processed.clear();
                warning!("Error loading log file '{}': {}", self.path.display(), e);
            }
        }

        self.processed.len()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.processed.contains(uri)
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Marks `uri` as processed in memory and appends it to the log file.
    ///
    /// The in-memory set is updated even if the write fails.
    pub async fn record(&mut self, uri: &str) -> Result<(), ProgressError> {
        self.processed.insert(uri.to_string());
        self.append(uri).await.map_err(|source| ProgressError::Write {
            path: self.path.clone(),
            source,
        })
    }

    async fn append(&self, uri: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{uri}\n").as_bytes()).await?;
        file.flush().await
    }
}
