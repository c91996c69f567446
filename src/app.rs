use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};
use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use crate::{
    api::ApiClient,
    editor::{EditorCommand, TextEditor},
    error::ApiError,
    event::{AppEvent, ChannelStatus, FileAction},
    explorer::{Activation, Explorer, ListingRequest, NewItem, Step},
    metrics::MetricsPanel,
    paths,
    preview::Preview,
    terminal::{TerminalEvent, TerminalSession},
    utils::{display_safe, MANUAL_REFRESH_COOLDOWN, PAGE_SIZE},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Files = 0,
    System = 1,
    Terminal = 2,
}

impl Panel {
    pub const COUNT: usize = 3;
    pub const TITLES: [&'static str; Panel::COUNT] = ["1 Files", "2 System", "3 Terminal"];

    pub fn from_index(index: usize) -> Option<Panel> {
        match index {
            0 => Some(Panel::Files),
            1 => Some(Panel::System),
            2 => Some(Panel::Terminal),
            _ => None,
        }
    }

    pub fn as_index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Rename { path: String, name: String },
    NewItem,
    Upload,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::Rename { .. } => "Rename",
            PromptKind::NewItem => "New file or folder",
            PromptKind::Upload => "Upload",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            PromptKind::Rename { .. } => "Enter new name:",
            PromptKind::NewItem => "Enter name (with extension for a file):",
            PromptKind::Upload => "Local file paths, separated by ';':",
        }
    }
}

/// Dialogs layered over the panels. At most one is open.
#[derive(Debug)]
pub enum Modal {
    Prompt { kind: PromptKind, input: String },
    ConfirmDelete { path: String, name: String },
    Drives { selected: usize },
    Viewer {
        name: String,
        path: String,
        url: String,
        kind: String,
        content_type: String,
    },
    Editor(TextEditor),
}

/// Blocking message; dismissed with Enter or Esc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

pub struct App {
    pub should_quit: bool,
    pub show_help: bool,
    pub selected_panel: Panel,
    pub explorer: Explorer,
    pub metrics: MetricsPanel,
    pub terminal: TerminalSession,
    pub notifier_status: ChannelStatus,
    pub modal: Option<Modal>,
    pub notices: VecDeque<Notice>,
    pub status: Option<String>,
    last_manual_refresh: Option<Instant>,
    api: ApiClient,
    events: UnboundedSender<AppEvent>,
    commands: UnboundedSender<String>,
    download_dir: PathBuf,
}

impl App {
    pub fn new(
        api: ApiClient,
        start_path: &str,
        download_dir: PathBuf,
        events: UnboundedSender<AppEvent>,
        commands: UnboundedSender<String>,
    ) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            selected_panel: Panel::Files,
            explorer: Explorer::new(start_path),
            metrics: MetricsPanel::new(),
            terminal: TerminalSession::new(),
            notifier_status: ChannelStatus::Connecting,
            modal: None,
            notices: VecDeque::new(),
            status: None,
            last_manual_refresh: None,
            api,
            events,
            commands,
            download_dir,
        }
    }

    pub fn server(&self) -> &str {
        self.api.base().as_str()
    }

    /// First listing, the drive strip and the first metrics sample.
    pub fn start(&mut self) {
        let request = self.explorer.start();
        self.fetch_listing(request);
        self.fetch_drives(false);
        self.on_tick();
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            // The UI loop is gone when this fails; nothing left to tell.
            let _ = events.send(task.await);
        });
    }

    fn fetch_listing(&self, request: ListingRequest) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::Listing {
                generation: request.generation,
                result: api.list_directory(&request.path).await,
            }
        });
    }

    fn fetch_drives(&self, open_picker: bool) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::Drives {
                open_picker,
                result: api.drives().await,
            }
        });
    }

    fn notify(&mut self, title: &str, message: impl Into<String>) {
        let message = message.into();
        info!(title, %message, "notice");
        self.notices.push_back(Notice {
            title: title.to_string(),
            message,
        });
    }

    fn report(&mut self, title: &str, err: &ApiError) {
        error!(title, %err, "request failed");
        self.notify(title, err.user_message());
    }

    /// Metrics poll; skipped while the previous one is still out.
    pub fn on_tick(&mut self) {
        if !self.metrics.begin_poll() {
            return;
        }
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.metrics().await;
            AppEvent::Metrics {
                result,
                at: Instant::now(),
            }
        });
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Listing { generation, result } => match result {
                Ok(listing) => {
                    self.explorer.apply_listing(generation, listing);
                }
                Err(err) => {
                    if let Some(message) = self.explorer.apply_failure(generation, err.user_message()) {
                        self.notify("Error loading directory", message);
                    }
                }
            },
            AppEvent::Drives { open_picker, result } => match result {
                Ok(drives) => {
                    let empty = drives.is_empty();
                    self.explorer.set_drives(drives);
                    if open_picker {
                        if empty {
                            self.notify("Drives", "The server reported no drives");
                        } else {
                            self.modal = Some(Modal::Drives { selected: 0 });
                        }
                    }
                }
                Err(err) => {
                    if open_picker {
                        self.report("Error loading drives", &err);
                    } else {
                        warn!(%err, "drive list unavailable");
                    }
                }
            },
            AppEvent::FileOp { action, result } => match result {
                Ok(()) => {
                    info!(?action, "file operation completed");
                    let request = self.explorer.refresh();
                    self.fetch_listing(request);
                }
                Err(err) => self.report(action.failure_title(), &err),
            },
            AppEvent::EditorLoaded { path, name, result } => {
                self.status = None;
                match result {
                    Ok(content) => self.modal = Some(Modal::Editor(TextEditor::new(path, name, &content))),
                    Err(err) => self.report("Error loading file", &err),
                }
            }
            AppEvent::EditorSaved { path, result } => {
                if let Some(Modal::Editor(editor)) = self.modal.as_mut() {
                    if editor.path == path {
                        editor.saving = false;
                        if result.is_ok() {
                            editor.dirty = false;
                        }
                    }
                }
                match result {
                    Ok(()) => self.notify("Saved", "File saved successfully!"),
                    Err(err) => self.report("Error saving file", &err),
                }
            }
            AppEvent::Downloaded(result) => match result {
                Ok(saved) => self.notify("Download complete", format!("Saved to {}", saved.display())),
                Err(err) => self.report("Error downloading file", &err),
            },
            AppEvent::Metrics { result, at } => match result {
                Ok(snapshot) => self.metrics.record(snapshot, at),
                Err(err) => {
                    warn!(%err, "metrics poll failed");
                    self.metrics.record_failure(err.user_message());
                }
            },
            AppEvent::PathChanged(path) => {
                if self.explorer.is_affected_by(&path) {
                    info!(changed = %path, current = %self.explorer.current_path(), "re-listing after change");
                    let request = self.explorer.refresh();
                    self.fetch_listing(request);
                }
            }
            AppEvent::Notifier(status) => self.notifier_status = status,
            AppEvent::Terminal(event) => self.terminal.apply(event),
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if !self.notices.is_empty() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notices.pop_front();
            }
            return;
        }

        if let Some(modal) = self.modal.take() {
            self.modal = self.handle_modal_key(modal, key);
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        if self.selected_panel == Panel::Terminal && self.handle_terminal_key(key) {
            return;
        }

        match key.code {
            KeyCode::Tab => self.select_next_panel(),
            KeyCode::BackTab => self.select_previous_panel(),
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                if let Some(panel) = Panel::from_index(index) {
                    self.selected_panel = panel;
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            _ => match self.selected_panel {
                Panel::Files => self.handle_files_key(key),
                Panel::System => self.handle_system_key(key),
                Panel::Terminal => {}
            },
        }
    }

    fn handle_files_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.explorer.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.explorer.select_next(),
            KeyCode::PageUp => self.explorer.page_up(PAGE_SIZE),
            KeyCode::PageDown => self.explorer.page_down(PAGE_SIZE),
            KeyCode::Home | KeyCode::Char('g') => self.explorer.select(0),
            KeyCode::End | KeyCode::Char('G') => self.explorer.select_last(),
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Backspace | KeyCode::Char('u') => match self.explorer.up() {
                Step::Fetch(request) => self.fetch_listing(request),
                Step::ShowDrives => self.fetch_drives(true),
            },
            KeyCode::Char('b') | KeyCode::Left => {
                if let Some(request) = self.explorer.back() {
                    self.fetch_listing(request);
                }
            }
            KeyCode::Char('f') | KeyCode::Right => {
                if let Some(request) = self.explorer.forward() {
                    self.fetch_listing(request);
                }
            }
            KeyCode::Char('r') => {
                let cooled = self
                    .last_manual_refresh
                    .is_none_or(|at| at.elapsed() >= MANUAL_REFRESH_COOLDOWN);
                if cooled {
                    let request = self.explorer.refresh();
                    self.fetch_listing(request);
                    self.last_manual_refresh = Some(Instant::now());
                }
            }
            KeyCode::Char('R') => {
                if let Some(row) = self.explorer.selected_row() {
                    self.modal = Some(Modal::Prompt {
                        input: row.name.clone(),
                        kind: PromptKind::Rename {
                            path: row.path.clone(),
                            name: row.name.clone(),
                        },
                    });
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(row) = self.explorer.selected_row() {
                    self.modal = Some(Modal::ConfirmDelete {
                        path: row.path.clone(),
                        name: row.name.clone(),
                    });
                }
            }
            KeyCode::Char('d') => {
                if let Some(row) = self.explorer.selected_row().filter(|row| row.can_download()) {
                    let path = row.path.clone();
                    self.download(path);
                }
            }
            KeyCode::Char('N') => {
                self.modal = Some(Modal::Prompt {
                    kind: PromptKind::NewItem,
                    input: String::new(),
                })
            }
            KeyCode::Char('U') => {
                self.modal = Some(Modal::Prompt {
                    kind: PromptKind::Upload,
                    input: String::new(),
                })
            }
            KeyCode::Char('D') => {
                if self.explorer.drives().is_empty() {
                    self.fetch_drives(true);
                } else {
                    self.modal = Some(Modal::Drives { selected: 0 });
                }
            }
            _ => {}
        }
    }

    fn handle_system_key(&mut self, key: KeyEvent) {
        let process_count = self
            .metrics
            .latest
            .as_ref()
            .map_or(0, |snapshot| snapshot.processes.len());
        let last = process_count.saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.metrics.process_scroll = self.metrics.process_scroll.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.metrics.process_scroll = (self.metrics.process_scroll + 1).min(last)
            }
            KeyCode::PageUp => {
                self.metrics.process_scroll = self.metrics.process_scroll.saturating_sub(PAGE_SIZE)
            }
            KeyCode::PageDown => {
                self.metrics.process_scroll = (self.metrics.process_scroll + PAGE_SIZE).min(last)
            }
            KeyCode::Char('r') => self.on_tick(),
            _ => {}
        }
    }

    /// Input line of the terminal panel. Returns false for keys it leaves to the app.
    fn handle_terminal_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => self.terminal.input.push(c),
            KeyCode::Backspace => {
                self.terminal.input.pop();
            }
            KeyCode::Enter => {
                if let Some(command) = self.terminal.submit() {
                    if self.commands.send(command).is_err() {
                        self.terminal
                            .apply(TerminalEvent::Error("terminal channel closed".to_string()));
                    }
                }
            }
            KeyCode::Up => self.terminal.scroll_up(1),
            KeyCode::Down => self.terminal.scroll_down(1),
            KeyCode::PageUp => self.terminal.scroll_up(PAGE_SIZE),
            KeyCode::PageDown => self.terminal.scroll_down(PAGE_SIZE),
            _ => return false,
        }
        true
    }

    /// Handle a key for an open dialog; returns the dialog to keep open, if any.
    fn handle_modal_key(&mut self, modal: Modal, key: KeyEvent) -> Option<Modal> {
        match modal {
            Modal::Prompt { kind, mut input } => match key.code {
                KeyCode::Esc => None,
                KeyCode::Enter => {
                    self.submit_prompt(kind, input);
                    None
                }
                KeyCode::Backspace => {
                    input.pop();
                    Some(Modal::Prompt { kind, input })
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    Some(Modal::Prompt { kind, input })
                }
                _ => Some(Modal::Prompt { kind, input }),
            },
            Modal::ConfirmDelete { path, name } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let api = self.api.clone();
                    self.spawn(async move {
                        AppEvent::FileOp {
                            action: FileAction::Delete,
                            result: api.delete(&path).await,
                        }
                    });
                    None
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => None,
                _ => Some(Modal::ConfirmDelete { path, name }),
            },
            Modal::Drives { selected } => {
                let count = self.explorer.drives().len();
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => None,
                    KeyCode::Up | KeyCode::Char('k') | KeyCode::Left => Some(Modal::Drives {
                        selected: selected.saturating_sub(1),
                    }),
                    KeyCode::Down | KeyCode::Char('j') | KeyCode::Right => Some(Modal::Drives {
                        selected: (selected + 1).min(count.saturating_sub(1)),
                    }),
                    KeyCode::Enter => {
                        if let Some(drive) = self.explorer.drives().get(selected).cloned() {
                            let request = self.explorer.navigate(&drive);
                            self.fetch_listing(request);
                        }
                        None
                    }
                    _ => Some(Modal::Drives { selected }),
                }
            }
            Modal::Viewer {
                name,
                path,
                url,
                kind,
                content_type,
            } => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => None,
                KeyCode::Char('o') | KeyCode::Enter => {
                    if let Err(err) = open::that_detached(&url) {
                        self.notify("Cannot open viewer", err.to_string());
                    }
                    None
                }
                KeyCode::Char('d') => {
                    self.download(path);
                    None
                }
                _ => Some(Modal::Viewer {
                    name,
                    path,
                    url,
                    kind,
                    content_type,
                }),
            },
            Modal::Editor(mut editor) => match editor.handle_key(key) {
                EditorCommand::Close => None,
                EditorCommand::Save => {
                    if !editor.saving {
                        editor.saving = true;
                        let api = self.api.clone();
                        let path = editor.path.clone();
                        let content = editor.content();
                        self.spawn(async move {
                            let result = api.write_file(&path, &content).await;
                            AppEvent::EditorSaved { path, result }
                        });
                    }
                    Some(Modal::Editor(editor))
                }
                EditorCommand::None => Some(Modal::Editor(editor)),
            },
        }
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: String) {
        let value = input.trim();
        if value.is_empty() {
            return;
        }
        let api = self.api.clone();
        match kind {
            PromptKind::Rename { path, name } => {
                if value == name {
                    return;
                }
                let new_path = paths::with_leaf(&path, value);
                info!(from = %path, to = %new_path, "renaming");
                self.spawn(async move {
                    AppEvent::FileOp {
                        action: FileAction::Rename,
                        result: api.rename(&path, &new_path).await,
                    }
                });
            }
            PromptKind::NewItem => match self.explorer.new_item(value) {
                NewItem::File(path) => self.spawn(async move {
                    AppEvent::FileOp {
                        action: FileAction::CreateFile,
                        result: api.write_file(&path, "").await,
                    }
                }),
                NewItem::Dir(path) => self.spawn(async move {
                    AppEvent::FileOp {
                        action: FileAction::CreateDir,
                        result: api.make_dir(&path).await,
                    }
                }),
            },
            PromptKind::Upload => {
                let files: Vec<PathBuf> = value
                    .split(';')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(PathBuf::from)
                    .collect();
                let dir = self.explorer.current_path().to_string();
                self.spawn(async move {
                    AppEvent::FileOp {
                        action: FileAction::Upload,
                        result: api.upload(&dir, &files).await,
                    }
                });
            }
        }
    }

    fn activate_selected(&mut self) {
        match self.explorer.activate_selected() {
            Some(Activation::Open(request)) => self.fetch_listing(request),
            Some(Activation::Preview(preview)) => self.open_preview(preview),
            None => {}
        }
    }

    fn open_preview(&mut self, preview: Preview) {
        match preview {
            Preview::Editor { path, name } => {
                self.status = Some(format!("Opening {}", display_safe(&name)));
                let api = self.api.clone();
                self.spawn(async move {
                    let result = api.read_file(&path).await;
                    AppEvent::EditorLoaded { path, name, result }
                });
            }
            Preview::Pdf { path, name } => {
                self.open_viewer(path, name, "PDF document", "application/pdf".to_string())
            }
            Preview::Media {
                path,
                name,
                kind,
                content_type,
            } => self.open_viewer(path, name, kind.label(), content_type),
            Preview::Unsupported { ext, .. } => self.notify(
                "Preview not available",
                format!(
                    "Document preview is not supported for this file type ({}). You can download the file to view it.",
                    ext
                ),
            ),
        }
    }

    fn open_viewer(&mut self, path: String, name: String, kind: &str, content_type: String) {
        match self.api.view_url(&path) {
            Ok(url) => {
                self.modal = Some(Modal::Viewer {
                    name,
                    path,
                    url: url.to_string(),
                    kind: kind.to_string(),
                    content_type,
                })
            }
            Err(err) => self.report("Cannot open viewer", &err),
        }
    }

    fn download(&self, path: String) {
        let api = self.api.clone();
        let dir = self.download_dir.clone();
        self.spawn(async move { AppEvent::Downloaded(api.download(&path, &dir).await) });
    }

    fn select_next_panel(&mut self) {
        let next_index = (self.selected_panel.as_index() + 1) % Panel::COUNT;
        self.selected_panel = Panel::from_index(next_index).unwrap_or(Panel::Files);
    }

    fn select_previous_panel(&mut self) {
        let current_index = self.selected_panel.as_index();
        let prev_index = if current_index == 0 {
            Panel::COUNT - 1
        } else {
            current_index - 1
        };
        self.selected_panel = Panel::from_index(prev_index).unwrap_or(Panel::Files);
    }

    pub fn render_header(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);

        let tabs = Tabs::new(Panel::TITLES)
            .select(self.selected_panel.as_index())
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Green)));
        frame.render_widget(tabs, layout[0]);

        let (push_label, push_color) = match self.notifier_status {
            ChannelStatus::Connecting => ("connecting", Color::Yellow),
            ChannelStatus::Connected => ("live", Color::Green),
            ChannelStatus::Disconnected => ("offline", Color::Red),
        };
        let host = self
            .metrics
            .latest
            .as_ref()
            .and_then(|snapshot| snapshot.hostname.as_deref())
            .map(display_safe)
            .unwrap_or_else(|| "-".to_string());
        let clock = chrono::Local::now().format("%H:%M:%S").to_string();
        let line = Line::from(vec![
            Span::styled(self.server().to_string(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw("  push: "),
            Span::styled(push_label, Style::default().fg(push_color)),
            Span::raw(format!("  host: {}  ", host)),
            Span::styled(clock, Style::default().fg(Color::Cyan)),
        ]);
        let title = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Green)));
        frame.render_widget(title, layout[1]);
    }

    pub fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let help_text = if let Some(status) = &self.status {
            status.as_str()
        } else if self.show_help {
            "ESC or ? to close help"
        } else {
            match self.selected_panel {
                Panel::Files => "↑↓jk/PgUp/PgDn (select) | Enter (open) | Bksp (up) | b/f (back/forward) | r (refresh) | R (rename) | x (delete) | N (new) | U (upload) | d (download) | D (drives) | ? | q",
                Panel::System => "↑↓jk/PgUp/PgDn (scroll processes) | r (poll now) | Tab (next panel) | ? (help) | q (quit)",
                Panel::Terminal => "type a command, Enter (run) | ↑↓/PgUp/PgDn (scroll) | Tab (next panel) | Ctrl-C (quit)",
            }
        };
        let footer = Paragraph::new(help_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
        frame.render_widget(footer, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DirectoryEntry, DirectoryListing};
    use std::time::Duration;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
    use url::Url;

    struct Harness {
        app: App,
        events: UnboundedReceiver<AppEvent>,
        commands: UnboundedReceiver<String>,
    }

    // Port 9 (discard) refuses connections, so spawned requests fail fast.
    fn harness(start: &str) -> Harness {
        let (events_tx, events) = unbounded_channel();
        let (commands_tx, commands) = unbounded_channel();
        let api = ApiClient::new(Url::parse("http://127.0.0.1:9/").unwrap(), Duration::from_secs(2)).unwrap();
        let app = App::new(api, start, PathBuf::from("."), events_tx, commands_tx);
        Harness { app, events, commands }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn listing(path: &str, names: &[(&str, bool)]) -> DirectoryListing {
        DirectoryListing {
            path: path.to_string(),
            entries: names
                .iter()
                .map(|(name, is_dir)| DirectoryEntry {
                    name: name.to_string(),
                    path: paths::join(path, name),
                    is_dir: *is_dir,
                    size: if *is_dir { None } else { Some(3) },
                })
                .collect(),
            drives: None,
        }
    }

    #[tokio::test]
    async fn panels_cycle_with_tab_and_digits() {
        let mut h = harness("/");
        h.app.handle_key_event(key(KeyCode::Tab));
        assert_eq!(h.app.selected_panel, Panel::System);
        h.app.handle_key_event(key(KeyCode::BackTab));
        h.app.handle_key_event(key(KeyCode::BackTab));
        assert_eq!(h.app.selected_panel, Panel::Terminal);
        // In the terminal panel, digits are typed into the input line.
        h.app.handle_key_event(key(KeyCode::Char('2')));
        assert_eq!(h.app.selected_panel, Panel::Terminal);
        assert_eq!(h.app.terminal.input, "2");

        h.app.handle_key_event(key(KeyCode::Tab));
        assert_eq!(h.app.selected_panel, Panel::Files);
        h.app.handle_key_event(key(KeyCode::Char('3')));
        assert_eq!(h.app.selected_panel, Panel::Terminal);
        assert_eq!(h.app.terminal.input, "2");
    }

    #[tokio::test]
    async fn listing_failure_is_reported_once() {
        let mut h = harness("/srv");
        h.app.start();
        let mut listing_errors = 0;
        for _ in 0..3 {
            let event = tokio::time::timeout(Duration::from_secs(5), h.events.recv())
                .await
                .unwrap()
                .unwrap();
            if matches!(event, AppEvent::Listing { .. }) {
                listing_errors += 1;
            }
            h.app.handle_event(event);
        }
        assert_eq!(listing_errors, 1);
        assert_eq!(h.app.notices.len(), 1);
        assert_eq!(h.app.notices[0].title, "Error loading directory");
        assert!(h.app.metrics.last_error.is_some());

        h.app.handle_key_event(key(KeyCode::Char('j')));
        assert_eq!(h.app.notices.len(), 1);
        h.app.handle_key_event(key(KeyCode::Enter));
        assert!(h.app.notices.is_empty());
    }

    #[tokio::test]
    async fn stale_listing_is_ignored() {
        let mut h = harness("/");
        let first = h.app.explorer.navigate("/a");
        let second = h.app.explorer.navigate("/b");
        h.app.handle_event(AppEvent::Listing {
            generation: second.generation,
            result: Ok(listing("/b", &[("y", false)])),
        });
        h.app.handle_event(AppEvent::Listing {
            generation: first.generation,
            result: Ok(listing("/a", &[("x", false)])),
        });
        assert_eq!(h.app.explorer.displayed_path(), Some("/b"));
        assert_eq!(h.app.explorer.rows()[0].name, "y");
    }

    #[tokio::test]
    async fn failed_listing_keeps_the_last_good_directory() {
        let mut h = harness("/");
        let request = h.app.explorer.start();
        h.app.handle_event(AppEvent::Listing {
            generation: request.generation,
            result: Ok(listing("/", &[("a", true)])),
        });
        let request = h.app.explorer.navigate("/missing");
        h.app.handle_event(AppEvent::Listing {
            generation: request.generation,
            result: Err(crate::error::ApiError::Backend {
                status: 400,
                message: "invalid path".into(),
            }),
        });

        assert_eq!(h.app.notices[0].message, "invalid path");
        assert_eq!(h.app.explorer.current_path(), "/");
        assert_eq!(h.app.explorer.displayed_path(), Some("/"));
        assert_eq!(h.app.explorer.history().state().entries(), ["/"]);
        assert_eq!(h.app.explorer.new_item("new.txt"), NewItem::File("/new.txt".into()));
    }

    #[tokio::test]
    async fn rename_prompt_is_prefilled_and_cancellable() {
        let mut h = harness("/");
        let request = h.app.explorer.start();
        h.app.handle_event(AppEvent::Listing {
            generation: request.generation,
            result: Ok(listing("/", &[("old.txt", false)])),
        });
        h.app.handle_key_event(key(KeyCode::Char('R')));
        match &h.app.modal {
            Some(Modal::Prompt { kind, input }) => {
                assert_eq!(input, "old.txt");
                assert!(matches!(kind, PromptKind::Rename { .. }));
            }
            other => panic!("expected rename prompt, got {:?}", other),
        }
        h.app.handle_key_event(key(KeyCode::Esc));
        assert!(h.app.modal.is_none());
    }

    #[tokio::test]
    async fn change_events_relist_only_when_relevant() {
        let mut h = harness("/home/user");
        h.app.handle_event(AppEvent::PathChanged("/var/log".into()));
        assert!(h.events.try_recv().is_err());
        assert!(!h.app.explorer.loading);

        h.app.handle_event(AppEvent::PathChanged("/home/user/docs".into()));
        assert!(h.app.explorer.loading);
        let event = tokio::time::timeout(Duration::from_secs(5), h.events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, AppEvent::Listing { .. }));
    }

    #[tokio::test]
    async fn unsupported_document_shows_notice() {
        let mut h = harness("/");
        let request = h.app.explorer.start();
        h.app.handle_event(AppEvent::Listing {
            generation: request.generation,
            result: Ok(listing("/", &[("report.docx", false)])),
        });
        h.app.handle_key_event(key(KeyCode::Enter));
        assert!(h.app.modal.is_none());
        assert_eq!(h.app.notices[0].title, "Preview not available");
        assert!(h.app.notices[0].message.contains("docx"));
    }

    #[tokio::test]
    async fn image_opens_viewer_with_view_url() {
        let mut h = harness("/");
        let request = h.app.explorer.start();
        h.app.handle_event(AppEvent::Listing {
            generation: request.generation,
            result: Ok(listing("/", &[("cat.png", false)])),
        });
        h.app.handle_key_event(key(KeyCode::Enter));
        match &h.app.modal {
            Some(Modal::Viewer { url, content_type, .. }) => {
                assert_eq!(url, "http://127.0.0.1:9/files/view/%2Fcat.png");
                assert_eq!(content_type, "image/png");
            }
            other => panic!("expected viewer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn terminal_commands_reach_the_channel_when_connected() {
        let mut h = harness("/");
        h.app.selected_panel = Panel::Terminal;
        h.app.handle_event(AppEvent::Terminal(TerminalEvent::Connected));
        for c in "ls".chars() {
            h.app.handle_key_event(key(KeyCode::Char(c)));
        }
        h.app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(h.commands.try_recv().unwrap(), "ls");

        h.app.handle_event(AppEvent::Terminal(TerminalEvent::Disconnected));
        h.app.handle_key_event(key(KeyCode::Char('q')));
        h.app.handle_key_event(key(KeyCode::Enter));
        assert!(h.commands.try_recv().is_err());
        assert!(!h.app.should_quit);
    }

    #[tokio::test]
    async fn drive_picker_navigates_into_history() {
        let mut h = harness("/");
        h.app.handle_event(AppEvent::Drives {
            open_picker: true,
            result: Ok(vec!["C:".into(), "D:".into()]),
        });
        assert!(matches!(h.app.modal, Some(Modal::Drives { selected: 0 })));
        h.app.handle_key_event(key(KeyCode::Down));
        h.app.handle_key_event(key(KeyCode::Enter));
        assert!(h.app.modal.is_none());
        assert_eq!(h.app.explorer.current_path(), "D:");
        assert_eq!(h.app.explorer.history().state().entries(), ["/", "D:"]);
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_anywhere() {
        let mut h = harness("/");
        h.app.selected_panel = Panel::Terminal;
        h.app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(h.app.should_quit);
    }
}
