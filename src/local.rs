use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use crate::{
    error::Result,
    source::DirectorySource,
    types::{DirectoryEntry, DirectoryListing, PARENT_ENTRY},
};

/// Directory source backed by the local filesystem
#[derive(Debug, Clone)]
pub struct LocalSource {
    cwd: PathBuf,
}

impl LocalSource {
    /// Start browsing at `cwd`, resolved against the process working
    /// directory when relative
    pub fn new(cwd: PathBuf) -> Self {
        // ".." must be able to climb past the first relative component
        let cwd = match std::env::current_dir() {
            Ok(base) if cwd.is_relative() => base.join(cwd),
            _ => cwd,
        };
        Self { cwd }
    }

    /// Start browsing at the process working directory
    pub fn from_current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.cwd.join(name)
    }

    fn at_root(&self) -> bool {
        self.cwd.parent().is_none()
    }

    /// `None` if the entry vanished between the scan and the stat
    async fn entry_for(path: &Path, name: String) -> Result<Option<DirectoryEntry>> {
        // Follow symlinks for classification; dangling links fall back to the
        // link itself.
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(_) => match fs::symlink_metadata(path).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            },
        };

        Ok(Some(if metadata.is_dir() {
            DirectoryEntry::directory(name)
        } else {
            DirectoryEntry::file(name, metadata.len())
        }))
    }
}

#[async_trait]
impl DirectorySource for LocalSource {
    async fn list_entries(&self) -> Result<DirectoryListing> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&self.cwd).await?;

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(entry) = Self::entry_for(&entry.path(), name).await? {
                entries.push(entry);
            }
        }

        debug!("listed {} entries in {}", entries.len(), self.cwd.display());

        Ok(DirectoryListing::sorted(
            self.current_directory(),
            self.at_root(),
            entries,
        ))
    }

    fn current_directory(&self) -> String {
        self.cwd.to_string_lossy().to_string()
    }

    fn navigate(&mut self, target: &str) {
        if target == PARENT_ENTRY {
            if let Some(parent) = self.cwd.parent() {
                self.cwd = parent.to_path_buf();
            }
        } else {
            self.cwd.push(target);
        }
    }

    async fn read_file(&self, name: &str) -> Result<Bytes> {
        let data = fs::read(self.resolve(name)).await?;
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, name: &str, contents: Bytes) -> Result<()> {
        fs::write(self.resolve(name), &contents).await?;
        Ok(())
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        fs::remove_file(self.resolve(name)).await?;
        Ok(())
    }

    fn identifier(&self) -> String {
        format!("file://{}", self.cwd.display())
    }
}
