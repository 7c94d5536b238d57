pub mod config;
pub mod error;
pub mod local;
pub mod orchestrator;
pub mod protocol;
pub mod remote;
pub mod size;
pub mod source;
pub mod types;

pub use config::BrowserConfig;
pub use error::{BrowserError, Result};
pub use local::LocalSource;
pub use orchestrator::{Commander, Pane, Side};
pub use remote::RemoteSource;
pub use size::format_size;
pub use source::{CodeExecutor, DirectorySource};
pub use types::{DirectoryEntry, DirectoryListing, EntryType};
