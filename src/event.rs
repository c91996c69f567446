use std::path::PathBuf;
use std::time::Instant;

use crate::{
    error::ApiError,
    model::{DirectoryListing, MetricsSnapshot},
    terminal::TerminalEvent,
};

/// Results delivered to the UI loop by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Listing {
        generation: u64,
        result: Result<DirectoryListing, ApiError>,
    },
    Drives {
        open_picker: bool,
        result: Result<Vec<String>, ApiError>,
    },
    FileOp {
        action: FileAction,
        result: Result<(), ApiError>,
    },
    EditorLoaded {
        path: String,
        name: String,
        result: Result<String, ApiError>,
    },
    EditorSaved {
        path: String,
        result: Result<(), ApiError>,
    },
    Downloaded(Result<PathBuf, ApiError>),
    Metrics {
        result: Result<MetricsSnapshot, ApiError>,
        at: Instant,
    },
    PathChanged(String),
    Notifier(ChannelStatus),
    Terminal(TerminalEvent),
}

/// Mutations that re-list the current directory once they succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Rename,
    Delete,
    CreateFile,
    CreateDir,
    Upload,
}

impl FileAction {
    pub fn failure_title(self) -> &'static str {
        match self {
            FileAction::Rename => "Error renaming item",
            FileAction::Delete => "Error deleting item",
            FileAction::CreateFile => "Error creating file",
            FileAction::CreateDir => "Error creating directory",
            FileAction::Upload => "Error uploading file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Connecting,
    Connected,
    Disconnected,
}
