use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures_util::StreamExt;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

mod api;
mod app;
mod config;
mod editor;
mod error;
mod event;
mod explorer;
mod history;
mod metrics;
mod model;
mod paths;
mod preview;
mod terminal;
mod ui;
mod utils;
mod watcher;

use api::ApiClient;
use app::{App, Panel};
use config::Config;
use event::AppEvent;
use ui::{render_files, render_help, render_modal, render_notice, render_system, render_terminal};

/// Terminal dashboard for a remote server: files, live metrics and a shell.
#[derive(Parser, Debug)]
#[command(name = "vpscope", version, about)]
struct Cli {
    /// Backend base URL, e.g. https://vps.example.com
    #[arg(long)]
    server: Option<String>,
    /// Directory to open first
    #[arg(long)]
    path: Option<String>,
    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(path) = cli.path {
        config.start_path = path;
    }
    if let Some(log_file) = cli.log_file {
        config.log_file = Some(log_file);
    }
    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(&config)?;
    info!(server = %config.server_url, "Starting vpscope");

    let base = Url::parse(&config.server_url)
        .wrap_err_with(|| format!("invalid server URL {:?}", config.server_url))?;
    let api = ApiClient::new(base, config.request_timeout())?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    tokio::spawn(watcher::run_change_notifier(
        api.socket_url(&config.file_updates_path)?,
        config.reconnect_delay(),
        events_tx.clone(),
    ));
    tokio::spawn(terminal::run_terminal_channel(
        api.socket_url(&config.terminal_path)?,
        config.reconnect_delay(),
        commands_rx,
        events_tx.clone(),
    ));

    let mut app = App::new(api, &config.start_path, config.download_dir(), events_tx, commands_tx);

    let terminal = ratatui::init();
    let result = run(terminal, &mut app, events_rx, config.poll_interval()).await;
    ratatui::restore();

    match &result {
        Ok(()) => info!("vpscope exited successfully"),
        Err(e) => error!("vpscope exited with error: {}", e),
    }

    result
}

fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_file();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).wrap_err_with(|| format!("cannot create log dir {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("cannot open log file {}", path.display()))?;

    // The TUI owns the terminal, so logs go to the file only.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vpscope={}", config.log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(
    mut terminal: DefaultTerminal,
    app: &mut App,
    mut events: UnboundedReceiver<AppEvent>,
    poll_interval: Duration,
) -> Result<()> {
    let mut input = EventStream::new();
    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut clock = tokio::time::interval(Duration::from_secs(1));
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

    app.start();

    loop {
        terminal.draw(|frame| render(app, frame))?;

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => app.handle_key_event(key),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
            Some(event) = events.recv() => app.handle_event(event),
            _ = poll.tick() => app.on_tick(),
            _ = clock.tick() => {}
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    app.render_header(frame, main_layout[0]);

    if app.show_help {
        render_help(frame, main_layout[1]);
    } else {
        match app.selected_panel {
            Panel::Files => render_files(app, frame, main_layout[1]),
            Panel::System => render_system(app, frame, main_layout[1]),
            Panel::Terminal => render_terminal(app, frame, main_layout[1]),
        }
    }

    app.render_footer(frame, main_layout[2]);

    render_modal(app, frame, area);
    if let Some(notice) = app.notices.front() {
        render_notice(notice, frame, area);
    }
}
