// Directory view: the listing on screen, its rows and the navigation history behind it
use ratatui::widgets::TableState;
use tracing::{debug, warn};

use crate::{
    history::{Affordances, Checkpoint, HistoryController, NavAction},
    model::{DirectoryEntry, DirectoryListing},
    paths,
    preview::{self, Preview},
    utils::display_safe,
};

/// One rendered listing row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub icon: &'static str,
    pub type_label: String,
    pub size_label: String,
}

impl EntryRow {
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        Self {
            name: entry.name.clone(),
            path: entry.path.clone(),
            is_dir: entry.is_dir,
            icon: preview::icon(&entry.name, entry.is_dir),
            type_label: preview::type_label(&entry.name, entry.is_dir),
            size_label: if entry.is_dir {
                "-".to_string()
            } else {
                format!("{} bytes", entry.size.unwrap_or(0))
            },
        }
    }

    /// Name with control characters masked, for drawing.
    pub fn display_name(&self) -> String {
        display_safe(&self.name)
    }

    pub fn can_download(&self) -> bool {
        !self.is_dir
    }
}

/// A listing fetch tagged with the navigation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub path: String,
    pub generation: u64,
}

/// What "new item" creates: names with an extension become empty files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewItem {
    File(String),
    Dir(String),
}

/// Result of activating a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Open(ListingRequest),
    Preview(Preview),
}

/// What the view should do after a navigation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Fetch(ListingRequest),
    ShowDrives,
}

pub struct Explorer {
    history: HistoryController,
    confirmed: Option<Checkpoint>,
    displayed_path: Option<String>,
    rows: Vec<EntryRow>,
    drives: Vec<String>,
    generation: u64,
    pub loading: bool,
    pub selected: usize,
    pub table_state: TableState,
}

impl Explorer {
    pub fn new(start_path: &str) -> Self {
        Self {
            history: HistoryController::new(start_path),
            confirmed: None,
            displayed_path: None,
            rows: Vec::new(),
            drives: Vec::new(),
            generation: 0,
            loading: false,
            selected: 0,
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    pub fn history(&self) -> &HistoryController {
        &self.history
    }

    pub fn current_path(&self) -> &str {
        self.history.current_path()
    }

    /// Backend-confirmed path of the listing on screen.
    pub fn displayed_path(&self) -> Option<&str> {
        self.displayed_path.as_deref()
    }

    pub fn rows(&self) -> &[EntryRow] {
        &self.rows
    }

    pub fn drives(&self) -> &[String] {
        &self.drives
    }

    pub fn affordances(&self) -> Affordances {
        self.history.affordances()
    }

    pub fn selected_row(&self) -> Option<&EntryRow> {
        self.rows.get(self.selected)
    }

    /// Drive whose root starts the current path, highlighted in the strip.
    pub fn is_current_drive(&self, drive: &str) -> bool {
        let prefix: String = self.current_path().chars().take(2).collect();
        drive == prefix
    }

    fn request(&mut self, path: String) -> ListingRequest {
        self.generation += 1;
        self.loading = true;
        ListingRequest {
            path,
            generation: self.generation,
        }
    }

    /// Initial listing of the seeded start path.
    pub fn start(&mut self) -> ListingRequest {
        let path = self.current_path().to_string();
        self.request(path)
    }

    pub fn navigate(&mut self, path: &str) -> ListingRequest {
        let path = self.history.navigate(path);
        self.request(path)
    }

    pub fn back(&mut self) -> Option<ListingRequest> {
        let path = self.history.back()?;
        Some(self.request(path))
    }

    pub fn forward(&mut self) -> Option<ListingRequest> {
        let path = self.history.forward()?;
        Some(self.request(path))
    }

    pub fn up(&mut self) -> Step {
        match self.history.up() {
            NavAction::Render(path) => Step::Fetch(self.request(path)),
            NavAction::ShowDrives => Step::ShowDrives,
        }
    }

    /// Re-list the current directory without touching history.
    pub fn refresh(&mut self) -> ListingRequest {
        let path = self.current_path().to_string();
        self.request(path)
    }

    /// Whether a pushed change at `changed` affects what is on screen.
    pub fn is_affected_by(&self, changed: &str) -> bool {
        paths::overlaps(&paths::normalize(changed), self.current_path())
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation
    }

    /// Install a listing. Returns false when a newer navigation superseded it.
    pub fn apply_listing(&mut self, generation: u64, listing: DirectoryListing) -> bool {
        if self.is_stale(generation) {
            debug!(generation, path = %listing.path, "discarding stale listing");
            return false;
        }
        self.loading = false;
        let listing = listing.normalized();
        let same_directory = self.displayed_path.as_deref() == Some(listing.path.as_str());

        self.history.confirm(&listing.path);
        self.confirmed = Some(self.history.checkpoint());
        if let Some(drives) = listing.drives {
            self.drives = drives;
        }
        self.rows = listing.entries.iter().map(EntryRow::from_entry).collect();
        self.displayed_path = Some(listing.path);

        let keep = if same_directory { self.selected } else { 0 };
        self.select(keep.min(self.rows.len().saturating_sub(1)));
        true
    }

    /// Record a failed fetch. Returns the message to surface, or None when the
    /// failure belongs to a superseded navigation. The old rows stay on screen
    /// and history returns to where it was when they were listed.
    pub fn apply_failure(&mut self, generation: u64, message: String) -> Option<String> {
        if self.is_stale(generation) {
            debug!(generation, "discarding stale listing failure");
            return None;
        }
        self.loading = false;
        warn!(path = %self.current_path(), error = %message, "directory listing failed");
        if let Some(confirmed) = self.confirmed.clone() {
            self.history.restore(confirmed);
        }
        Some(message)
    }

    pub fn set_drives(&mut self, drives: Vec<String>) {
        self.drives = drives;
    }

    pub fn activate_selected(&mut self) -> Option<Activation> {
        let row = self.selected_row()?.clone();
        if row.is_dir {
            Some(Activation::Open(self.navigate(&row.path)))
        } else {
            Some(Activation::Preview(preview::dispatch(&row.path, &row.name)))
        }
    }

    /// Path of a new child of the current directory.
    pub fn child_path(&self, name: &str) -> String {
        paths::join(self.current_path(), name)
    }

    pub fn new_item(&self, name: &str) -> NewItem {
        let path = self.child_path(name);
        if name.contains('.') {
            NewItem::File(path)
        } else {
            NewItem::Dir(path)
        }
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index;
        self.table_state.select(Some(index));
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.select(self.selected - 1);
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.select(self.selected + 1);
        }
    }

    pub fn page_up(&mut self, page: usize) {
        self.select(self.selected.saturating_sub(page));
    }

    pub fn page_down(&mut self, page: usize) {
        let last = self.rows.len().saturating_sub(1);
        self.select((self.selected + page).min(last));
    }

    pub fn select_last(&mut self) {
        self.select(self.rows.len().saturating_sub(1));
    }
}
