use serde::{Deserialize, Serialize};

use crate::size::format_size;

/// Name of the synthetic entry that points at the parent directory
pub const PARENT_ENTRY: &str = "..";

/// Display size shown for directories
pub const DIR_SIZE_LABEL: &str = "DIR";

/// Represents an entry in a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Base name of the file or folder
    pub name: String,
    /// Type of entry
    pub entry_type: EntryType,
    /// Size in bytes, `None` for directories
    pub size: Option<u64>,
    /// `"DIR"` for directories, a formatted byte count for files
    pub display_size: String,
}

impl DirectoryEntry {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Dir,
            size: None,
            display_size: DIR_SIZE_LABEL.to_string(),
        }
    }

    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::File,
            size: Some(size),
            display_size: format_size(size),
        }
    }

    /// The ".." entry prepended to listings of non-root directories
    pub fn parent() -> Self {
        Self::directory(PARENT_ENTRY)
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }

    pub fn is_parent(&self) -> bool {
        self.is_dir() && self.name == PARENT_ENTRY
    }
}

/// Type of directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

/// Result of listing a directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    /// The directory that was listed
    pub path: String,
    /// Entries in display order
    pub entries: Vec<DirectoryEntry>,
}

impl DirectoryListing {
    /// Build a listing in display order: ".." (unless at a root), then
    /// directories, then files, each group sorted by name ignoring case.
    pub fn sorted(path: String, at_root: bool, mut entries: Vec<DirectoryEntry>) -> Self {
        entries.retain(|e| !e.is_parent());
        entries.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.name.cmp(&b.name))
        });

        if !at_root {
            entries.insert(0, DirectoryEntry::parent());
        }

        Self { path, entries }
    }

    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(listing: &DirectoryListing) -> Vec<&str> {
        listing.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_directories_first_then_case_insensitive() {
        let listing = DirectoryListing::sorted(
            "/srv".to_string(),
            false,
            vec![
                DirectoryEntry::file("b.txt", 1),
                DirectoryEntry::file("a.txt", 1),
                DirectoryEntry::directory("Zdir"),
                DirectoryEntry::directory("adir"),
            ],
        );

        assert_eq!(names(&listing), vec!["..", "adir", "Zdir", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_no_parent_entry_at_root() {
        let listing = DirectoryListing::sorted(
            "/".to_string(),
            true,
            vec![DirectoryEntry::file("x", 3)],
        );

        assert_eq!(names(&listing), vec!["x"]);
    }

    #[test]
    fn test_entry_constructors() {
        let dir = DirectoryEntry::directory("etc");
        assert!(dir.is_dir());
        assert_eq!(dir.display_size, "DIR");
        assert_eq!(dir.size, None);

        let file = DirectoryEntry::file("report.txt", 2048);
        assert!(!file.is_dir());
        assert_eq!(file.display_size, "2.0Kb");

        assert!(DirectoryEntry::parent().is_parent());
        assert!(!DirectoryEntry::file("..", 0).is_parent());
    }
}
