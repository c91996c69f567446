use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render_help(frame: &mut Frame, area: Rect) {
    let help_text = "
VPSCOPE - HELP

GLOBAL:
  Tab / Shift-Tab - Next / previous panel
  1 2 3           - Files / System / Terminal
  ?               - Show/hide this help
  q               - Quit (Ctrl-C from the terminal panel)

FILES:
  ↑ ↓ j k         - Select entry
  PgUp/PgDn       - Jump by page
  Home/End g G    - First / last entry
  Enter           - Open directory or preview file
  Backspace / u   - Up one level (drive list at the root)
  b / f           - Back / forward in history
  r               - Re-list current directory
  R               - Rename selected entry
  x / Delete      - Delete selected entry
  N               - New file (name with '.') or folder
  U               - Upload local files into this directory
  d               - Download selected file
  D               - Pick a drive

SYSTEM:
  ↑ ↓ PgUp PgDn   - Scroll the process table
  r               - Poll metrics now

TERMINAL:
  Type a command and press Enter to run it on the server.
  ↑ ↓ PgUp PgDn   - Scroll output

EDITOR:
  Ctrl-S save, Esc or Ctrl-Q close.
  With unsaved changes, press Esc or Ctrl-Q twice to discard them.

Press '?' or Esc to close this help.
    ";

    let help_block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(help_text.trim())
        .style(Style::default().fg(Color::White))
        .block(help_block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}
