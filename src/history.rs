// Directory navigation history: visited paths plus a cursor into them
use tracing::debug;

use crate::paths;

/// Ordered visited paths and the index of the one on screen.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl NavigationState {
    pub fn seeded(path: impl Into<String>) -> Self {
        Self {
            entries: vec![path.into()],
            cursor: Some(0),
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor.map(|idx| self.entries[idx].as_str())
    }

    pub fn is_current(&self, path: &str) -> bool {
        self.current() == Some(path)
    }

    /// Drop forward history and append `path` as the new cursor position.
    pub fn record(&mut self, path: String) {
        let keep = self.cursor.map_or(0, |idx| idx + 1);
        self.entries.truncate(keep);
        self.entries.push(path);
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn step_back(&mut self) -> Option<&str> {
        match self.cursor {
            Some(idx) if idx > 0 => {
                self.cursor = Some(idx - 1);
                self.current()
            }
            _ => None,
        }
    }

    pub fn step_forward(&mut self) -> Option<&str> {
        match self.cursor {
            Some(idx) if idx + 1 < self.entries.len() => {
                self.cursor = Some(idx + 1);
                self.current()
            }
            _ => None,
        }
    }

    pub fn replace_current(&mut self, path: String) {
        if let Some(idx) = self.cursor {
            self.entries[idx] = path;
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some_and(|idx| idx > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor.is_some_and(|idx| idx + 1 < self.entries.len())
    }
}

/// Outcome of "up".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    /// List this directory; history is already up to date.
    Render(String),
    /// Show the drive picker, history untouched.
    ShowDrives,
}

/// Back/forward button state derived from the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub back: bool,
    pub forward: bool,
}

/// Owns the navigation state and the path currently displayed.
#[derive(Debug, Clone)]
pub struct HistoryController {
    state: NavigationState,
    current_path: String,
}

impl HistoryController {
    pub fn new(start_path: &str) -> Self {
        let start = paths::normalize(start_path);
        Self {
            state: NavigationState::seeded(start.clone()),
            current_path: start,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Go to `path` as a new history entry. Navigating to the entry already
    /// under the cursor leaves history alone.
    pub fn navigate(&mut self, path: &str) -> String {
        let path = paths::normalize(path);
        if !self.state.is_current(&path) {
            debug!(path = %path, "recording history entry");
            self.state.record(path.clone());
        }
        self.current_path = path.clone();
        path
    }

    /// Step the cursor back without recording; None at the oldest entry.
    pub fn back(&mut self) -> Option<String> {
        let path = self.state.step_back()?.to_string();
        self.current_path = path.clone();
        Some(path)
    }

    pub fn forward(&mut self) -> Option<String> {
        let path = self.state.step_forward()?.to_string();
        self.current_path = path.clone();
        Some(path)
    }

    pub fn up(&mut self) -> NavAction {
        if paths::is_root_like(&self.current_path) {
            return NavAction::ShowDrives;
        }
        let parent = paths::parent(&self.current_path).to_string();
        let target = if parent.is_empty() { paths::ROOT } else { parent.as_str() };
        NavAction::Render(self.navigate(target))
    }

    /// Adopt the backend-confirmed spelling of the displayed path.
    pub fn confirm(&mut self, confirmed: &str) {
        let confirmed = paths::normalize(confirmed);
        self.state.replace_current(confirmed.clone());
        self.current_path = confirmed;
    }

    pub fn affordances(&self) -> Affordances {
        Affordances {
            back: self.state.can_go_back(),
            forward: self.state.can_go_forward(),
        }
    }

    /// Copy of the whole controller, to return to after a failed fetch.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.clone())
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        debug!(path = %checkpoint.0.current_path, "restoring history");
        *self = checkpoint.0;
    }
}

/// Saved history, taken when a listing is confirmed.
#[derive(Debug, Clone)]
pub struct Checkpoint(HistoryController);

#[cfg(test)]
mod tests {
    use super::*;

    fn walked(paths: &[&str]) -> HistoryController {
        let mut ctl = HistoryController::new(paths[0]);
        for p in &paths[1..] {
            ctl.navigate(p);
        }
        ctl
    }

    #[test]
    fn navigations_accumulate_in_order() {
        let ctl = walked(&["/", "/a", "/a/b", "/a/b/c"]);
        assert_eq!(ctl.state().entries(), ["/", "/a", "/a/b", "/a/b/c"]);
        assert_eq!(ctl.state().cursor(), Some(3));
        assert_eq!(ctl.current_path(), "/a/b/c");
    }

    #[test]
    fn back_and_forward_move_the_cursor() {
        let mut ctl = walked(&["/", "/a", "/a/b", "/a/b/c"]);
        assert_eq!(ctl.back().as_deref(), Some("/a/b"));
        assert_eq!(ctl.back().as_deref(), Some("/a"));
        assert_eq!(ctl.state().cursor(), Some(1));
        assert_eq!(ctl.forward().as_deref(), Some("/a/b"));
        assert_eq!(ctl.state().cursor(), Some(2));
        assert_eq!(ctl.state().len(), 4);
    }

    #[test]
    fn back_at_start_and_forward_at_end_are_noops() {
        let mut ctl = walked(&["/", "/a"]);
        assert_eq!(ctl.forward(), None);
        assert_eq!(ctl.state().cursor(), Some(1));
        ctl.back();
        assert_eq!(ctl.back(), None);
        assert_eq!(ctl.state().cursor(), Some(0));
        assert_eq!(ctl.current_path(), "/");
    }

    #[test]
    fn navigate_after_back_truncates_forward_history() {
        let mut ctl = walked(&["/", "/a", "/a/b"]);
        ctl.back();
        ctl.back();
        ctl.navigate("/x");
        assert_eq!(ctl.state().entries(), ["/", "/x"]);
        assert!(!ctl.affordances().forward);
    }

    #[test]
    fn repeated_navigation_is_suppressed() {
        let mut ctl = walked(&["/", "/a"]);
        assert_eq!(ctl.navigate("/a"), "/a");
        assert_eq!(ctl.state().len(), 2);
    }

    #[test]
    fn restore_undoes_later_navigation() {
        let mut ctl = walked(&["/", "/a"]);
        let saved = ctl.checkpoint();
        ctl.navigate("/missing");
        ctl.navigate("/missing/deeper");
        ctl.restore(saved);
        assert_eq!(ctl.state().entries(), ["/", "/a"]);
        assert_eq!(ctl.state().cursor(), Some(1));
        assert_eq!(ctl.current_path(), "/a");
    }

    #[test]
    fn up_appends_parent() {
        let mut ctl = walked(&["/", "/a", "/a/b", "/a/b/c"]);
        assert_eq!(ctl.up(), NavAction::Render("/a/b".into()));
        assert_eq!(ctl.state().len(), 5);
        assert_eq!(ctl.state().cursor(), Some(4));
    }

    #[test]
    fn up_from_top_level_goes_to_root() {
        let mut ctl = walked(&["/", "/a"]);
        assert_eq!(ctl.up(), NavAction::Render("/".into()));
        assert_eq!(ctl.state().len(), 3);
    }

    #[test]
    fn up_from_root_shows_drives() {
        for root in ["/", ".", ""] {
            let mut ctl = HistoryController::new(root);
            assert_eq!(ctl.up(), NavAction::ShowDrives);
            assert_eq!(ctl.state().len(), 1);
        }
    }

    #[test]
    fn drive_roots_are_ordinary_entries() {
        let mut ctl = walked(&["/", "C:/"]);
        assert_eq!(ctl.state().entries(), ["/", "C:/"]);
        assert_eq!(ctl.up(), NavAction::Render("C:".into()));
    }

    #[test]
    fn affordances_follow_cursor() {
        let mut ctl = walked(&["/"]);
        assert_eq!(ctl.affordances(), Affordances { back: false, forward: false });
        ctl.navigate("/a");
        assert_eq!(ctl.affordances(), Affordances { back: true, forward: false });
        ctl.back();
        assert_eq!(ctl.affordances(), Affordances { back: false, forward: true });
    }

    #[test]
    fn confirm_rewrites_cursor_entry() {
        let mut ctl = HistoryController::new(".");
        ctl.confirm(r"C:\Work");
        assert_eq!(ctl.current_path(), "C:/Work");
        assert_eq!(ctl.state().entries(), ["C:/Work"]);
    }

    #[test]
    fn empty_state_has_no_cursor() {
        let mut state = NavigationState::default();
        assert_eq!(state.cursor(), None);
        assert_eq!(state.step_back(), None);
        state.record("/a".into());
        assert_eq!(state.cursor(), Some(0));
    }
}
