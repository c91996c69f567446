//! Remote shell: a command channel to the backend and the scrollback it feeds.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    event::AppEvent,
    model::{CommandOutput, RunCommand},
    utils::{display_safe, SCROLLBACK_LIMIT},
};

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalEvent {
    Connected,
    Output(CommandOutput),
    Error(String),
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Output,
    Command,
    Exit,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollLine {
    pub kind: LineKind,
    pub text: String,
}

/// Scrollback and input line of the terminal panel.
#[derive(Debug)]
pub struct TerminalSession {
    lines: VecDeque<ScrollLine>,
    pub input: String,
    pub connected: bool,
    /// Lines scrolled up from the bottom.
    pub scroll_offset: usize,
    error_reported: bool,
}

impl TerminalSession {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::new(),
            input: String::new(),
            connected: false,
            scroll_offset: 0,
            error_reported: false,
        }
    }

    pub fn lines(&self) -> &VecDeque<ScrollLine> {
        &self.lines
    }

    fn push(&mut self, kind: LineKind, text: &str) {
        for line in text.split('\n') {
            self.lines.push_back(ScrollLine {
                kind,
                text: display_safe(line.trim_end_matches('\r')),
            });
            if self.lines.len() > SCROLLBACK_LIMIT {
                self.lines.pop_front();
            }
        }
        self.scroll_offset = 0;
    }

    pub fn apply(&mut self, event: TerminalEvent) {
        match event {
            TerminalEvent::Connected => {
                self.connected = true;
                self.error_reported = false;
                self.push(LineKind::Info, "$ Connected to server");
            }
            TerminalEvent::Output(CommandOutput { output, exit }) => {
                if let Some(output) = output.filter(|o| !o.is_empty()) {
                    self.push(LineKind::Output, &output);
                }
                if let Some(code) = exit {
                    self.push(LineKind::Exit, &format!("[Process finished with code {}]", code));
                }
            }
            TerminalEvent::Error(message) => {
                // One marker per outage; retries repeat the same failure.
                if !self.error_reported {
                    self.push(LineKind::Error, &format!("[Connection error: {}]", message));
                    self.error_reported = true;
                }
            }
            TerminalEvent::Disconnected => {
                if self.connected {
                    self.push(LineKind::Info, "[Disconnected from server]");
                }
                self.connected = false;
            }
        }
    }

    /// Echo the typed command and clear the input. Returns the command to send,
    /// or None when there is nothing to send or no connection.
    pub fn submit(&mut self) -> Option<String> {
        let command = std::mem::take(&mut self.input);
        self.push(LineKind::Command, &format!("$ {}", command));
        if command.trim().is_empty() {
            return None;
        }
        if !self.connected {
            self.push(LineKind::Error, "[Not connected, command not sent]");
            return None;
        }
        Some(command)
    }

    pub fn scroll_up(&mut self, by: usize) {
        let max = self.lines.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + by).min(max);
    }

    pub fn scroll_down(&mut self, by: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(by);
    }
}

/// Keep the command channel open, reconnecting after `retry` forever.
/// Returns once the UI side drops either end.
pub async fn run_terminal_channel(
    url: Url,
    retry: Duration,
    mut commands: UnboundedReceiver<String>,
    events: UnboundedSender<AppEvent>,
) {
    let emit = |event: TerminalEvent| events.send(AppEvent::Terminal(event)).is_ok();
    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                info!(%url, "terminal channel connected");
                let (mut sink, mut stream) = socket.split();
                if !emit(TerminalEvent::Connected) {
                    return;
                }
                loop {
                    tokio::select! {
                        message = stream.next() => match message {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<CommandOutput>(text.as_str()) {
                                    Ok(output) => {
                                        if !emit(TerminalEvent::Output(output)) {
                                            return;
                                        }
                                    }
                                    Err(err) => debug!(%err, "ignoring unrecognized terminal message"),
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                warn!(%err, "terminal channel error");
                                emit(TerminalEvent::Error(err.to_string()));
                                break;
                            }
                        },
                        command = commands.recv() => {
                            let Some(command) = command else {
                                return;
                            };
                            let payload = match serde_json::to_string(&RunCommand { command: &command }) {
                                Ok(payload) => payload,
                                Err(err) => {
                                    warn!(%err, "cannot encode command");
                                    continue;
                                }
                            };
                            info!(command = %command, "running remote command");
                            if let Err(err) = sink.send(Message::text(payload)).await {
                                warn!(%err, "terminal send failed");
                                emit(TerminalEvent::Error(err.to_string()));
                                break;
                            }
                        }
                    }
                }
                info!(?retry, "terminal channel disconnected, reconnecting");
                if !emit(TerminalEvent::Disconnected) {
                    return;
                }
            }
            Err(err) => {
                warn!(%url, %err, ?retry, "terminal channel connect failed");
                if !emit(TerminalEvent::Error(err.to_string())) {
                    return;
                }
            }
        }
        tokio::time::sleep(retry).await;
    }
}
