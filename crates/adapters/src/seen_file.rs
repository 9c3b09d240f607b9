//! Flat-file seen-set store
//!
//! One post id per line, UTF-8, no ordering guarantee. Saves rewrite the
//! whole file; the set only ever grows.

use async_trait::async_trait;
use image_relay_domain::{SeenStore, SeenStoreError};
use std::collections::HashSet;
use std::path::PathBuf;

/// Seen-set store persisting to a plain text file
pub struct FileSeenStore {
    path: PathBuf,
}

impl FileSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SeenStore for FileSeenStore {
    async fn load(&self) -> Result<HashSet<String>, SeenStoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            // Absent file means a fresh start, not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(SeenStoreError::Io(e)),
        };

        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn save(&self, ids: &HashSet<String>) -> Result<(), SeenStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut contents = String::with_capacity(ids.len() * 8);
        for id in ids {
            contents.push_str(id);
            contents.push('\n');
        }

        tokio::fs::write(&self.path, contents).await?;

        Ok(())
    }
}
