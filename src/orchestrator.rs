use std::fmt;

use tracing::info;

use crate::{
    error::{BrowserError, Result},
    source::DirectorySource,
    types::{DirectoryEntry, DirectoryListing},
};

pub const STATUS_IDLE: &str = "Idle";

/// One half of the dual-pane view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Local => Side::Remote,
            Side::Remote => Side::Local,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => write!(f, "Local"),
            Side::Remote => write!(f, "Remote"),
        }
    }
}

/// A directory source together with its last listing and selection
pub struct Pane {
    source: Box<dyn DirectorySource>,
    listing: DirectoryListing,
    selected: usize,
}

impl Pane {
    fn new(source: Box<dyn DirectorySource>) -> Self {
        Self {
            source,
            listing: DirectoryListing::default(),
            selected: 0,
        }
    }

    pub fn source(&self) -> &dyn DirectorySource {
        self.source.as_ref()
    }

    pub fn listing(&self) -> &DirectoryListing {
        &self.listing
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&DirectoryEntry> {
        self.listing.entries.get(self.selected)
    }

    async fn refresh(&mut self) -> Result<()> {
        // The previous listing stays in place if this fails
        self.listing = self.source.list_entries().await?;
        self.selected = 0;
        Ok(())
    }

    /// Show the current directory as empty, e.g. after it failed to list
    fn clear(&mut self) {
        self.listing = DirectoryListing {
            path: self.source.current_directory(),
            entries: Vec::new(),
        };
        self.selected = 0;
    }
}

/// Coordinates the local and remote panes
///
/// Activating a directory navigates the side it belongs to. Activating a
/// file copies it to the other side under the same name, overwriting
/// without confirmation, then refreshes the receiving side.
pub struct Commander {
    local: Pane,
    remote: Pane,
    focus: Side,
    status: String,
}

impl Commander {
    /// Build the orchestrator and load both listings
    pub async fn new(
        local: Box<dyn DirectorySource>,
        remote: Box<dyn DirectorySource>,
    ) -> Result<Self> {
        let mut commander = Self {
            local: Pane::new(local),
            remote: Pane::new(remote),
            focus: Side::Local,
            status: STATUS_IDLE.to_string(),
        };

        commander.refresh(Side::Local).await?;
        commander.refresh(Side::Remote).await?;

        Ok(commander)
    }

    pub fn pane(&self, side: Side) -> &Pane {
        match side {
            Side::Local => &self.local,
            Side::Remote => &self.remote,
        }
    }

    fn pane_mut(&mut self, side: Side) -> &mut Pane {
        match side {
            Side::Local => &mut self.local,
            Side::Remote => &mut self.remote,
        }
    }

    pub fn focus(&self) -> Side {
        self.focus
    }

    pub fn set_focus(&mut self, side: Side) {
        self.focus = side;
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Move the selection of `side`, clamped to its listing
    pub fn select(&mut self, side: Side, index: usize) {
        let pane = self.pane_mut(side);
        pane.selected = index.min(pane.listing.entries.len().saturating_sub(1));
    }

    pub fn selected_entry(&self, side: Side) -> Option<&DirectoryEntry> {
        self.pane(side).selected_entry()
    }

    /// Reload the listing of one side
    pub async fn refresh(&mut self, side: Side) -> Result<()> {
        self.pane_mut(side).refresh().await
    }

    /// Activate the selected entry of the focused side
    pub async fn activate_selected(&mut self) -> Result<()> {
        let side = self.focus;
        match self.selected_entry(side).cloned() {
            Some(entry) => self.handle_activate(side, entry).await,
            None => Ok(()),
        }
    }

    /// Navigate into a directory entry, or transfer a file entry to the
    /// other side
    pub async fn handle_activate(&mut self, side: Side, entry: DirectoryEntry) -> Result<()> {
        if entry.is_dir() {
            self.status = "Navigating...".to_string();
            let pane = self.pane_mut(side);
            pane.source.navigate(&entry.name);

            // A stale listing would resolve names against the new directory
            let result = pane.refresh().await;
            if result.is_err() {
                pane.clear();
            }
            return self.finish("Navigate", result);
        }

        let (busy, action) = match side {
            Side::Local => ("Uploading...", "Upload"),
            Side::Remote => ("Downloading...", "Download"),
        };

        self.status = busy.to_string();
        let result = self.transfer(side, &entry.name).await;
        self.finish(action, result)
    }

    /// Delete the selected entry of the focused side
    ///
    /// Directories (including "..") are left alone.
    pub async fn handle_delete(&mut self) -> Result<()> {
        let side = self.focus;
        let Some(entry) = self.selected_entry(side).cloned() else {
            return Ok(());
        };
        if entry.is_dir() {
            return Ok(());
        }

        self.status = "Deleting...".to_string();
        let result = self.delete(side, &entry.name).await;
        self.finish("Delete", result)
    }

    /// Run arbitrary code through the remote side and return its output
    pub async fn execute_code(&mut self, code: &str) -> Result<String> {
        let Some(executor) = self.remote.source.as_executor() else {
            return Err(BrowserError::Unsupported {
                message: format!("{} cannot execute code", self.remote.source.identifier()),
            });
        };

        self.status = "Executing...".to_string();
        let result = executor.execute(code).await;
        match &result {
            Ok(_) => self.status = STATUS_IDLE.to_string(),
            Err(e) => self.status = format!("Execute failed: {}", e),
        }
        result
    }

    async fn transfer(&mut self, from: Side, name: &str) -> Result<()> {
        let to = from.other();
        let contents = self.pane(from).source.read_file(name).await?;
        info!(
            "copying {} ({} bytes) from {} to {}",
            name,
            contents.len(),
            self.pane(from).source.identifier(),
            self.pane(to).source.identifier()
        );

        self.pane(to).source.write_file(name, contents).await?;
        self.refresh(to).await
    }

    async fn delete(&mut self, side: Side, name: &str) -> Result<()> {
        info!("deleting {} from {}", name, self.pane(side).source.identifier());
        self.pane(side).source.delete_file(name).await?;
        self.refresh(side).await
    }

    fn finish(&mut self, action: &str, result: Result<()>) -> Result<()> {
        match &result {
            Ok(()) => self.status = STATUS_IDLE.to_string(),
            Err(e) => self.status = format!("{} failed: {}", action, e),
        }
        result
    }
}
