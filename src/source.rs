use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::Result, types::DirectoryListing};

/// Core abstraction for one side of the dual-pane view
///
/// Implementors own a single current directory and interpret every listing,
/// read, write and delete relative to it. Navigation never touches the
/// backend, so a bad target only shows up on the next `list_entries`.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// List the current directory
    ///
    /// Directories come before files, each group sorted by name, preceded
    /// by a ".." entry unless the current directory is a root.
    async fn list_entries(&self) -> Result<DirectoryListing>;

    /// The directory every other operation is relative to
    fn current_directory(&self) -> String;

    /// Move to the parent for "..", otherwise into the named child
    fn navigate(&mut self, target: &str);

    /// Read the full contents of a file in the current directory
    async fn read_file(&self, name: &str) -> Result<Bytes>;

    /// Create or overwrite a file in the current directory
    async fn write_file(&self, name: &str, contents: Bytes) -> Result<()>;

    /// Remove a file from the current directory
    async fn delete_file(&self, name: &str) -> Result<()>;

    /// Get a human-readable identifier for this source (for logging/debugging)
    fn identifier(&self) -> String;

    /// Ad-hoc code execution, for sources that can run code
    ///
    /// Default implementation returns `None`
    fn as_executor(&self) -> Option<&dyn CodeExecutor> {
        None
    }
}

/// Runs arbitrary code on the host behind a source
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Execute `code` and return its textual output
    async fn execute(&self, code: &str) -> Result<String>;
}
