use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{App, Modal, Notice};
use crate::editor::TextEditor;
use crate::utils::display_safe;

/// Rect of `percent_x` by `percent_y` of `area`, centered in it.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn modal_block(title: String, color: Color) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .style(Style::default().fg(Color::White).bg(Color::Black))
}

fn render_text_box(frame: &mut Frame, area: Rect, title: String, color: Color, content: Text) {
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(modal_block(title, color));
    frame.render_widget(paragraph, area);
}

pub fn render_modal(app: &mut App, frame: &mut Frame, area: Rect) {
    let drives = app.explorer.drives().to_vec();
    let current_drive: Vec<bool> = drives.iter().map(|d| app.explorer.is_current_drive(d)).collect();
    let Some(modal) = app.modal.as_mut() else {
        return;
    };

    match modal {
        Modal::Prompt { kind, input } => {
            let content = Text::from(vec![
                Line::raw(kind.hint()),
                Line::styled(format!("> {}█", input), Style::default().fg(Color::Yellow)),
                Line::raw(""),
                Line::styled("Enter to confirm, Esc to cancel", Style::default().fg(Color::DarkGray)),
            ]);
            render_text_box(frame, centered_rect(60, 30, area), kind.title().to_string(), Color::Yellow, content);
        }
        Modal::ConfirmDelete { name, .. } => {
            let content = Text::from(vec![
                Line::raw(format!("Are you sure you want to delete {}?", display_safe(name))),
                Line::raw(""),
                Line::styled("y / Enter: delete    n / Esc: cancel", Style::default().fg(Color::DarkGray)),
            ]);
            render_text_box(frame, centered_rect(50, 25, area), "Delete".to_string(), Color::Red, content);
        }
        Modal::Drives { selected } => {
            let modal_area = centered_rect(30, 50, area);
            frame.render_widget(Clear, modal_area);
            let items: Vec<ListItem> = drives
                .iter()
                .zip(&current_drive)
                .map(|(drive, current)| {
                    let marker = if *current { " (current)" } else { "" };
                    ListItem::new(format!("💽 {}{}", display_safe(drive), marker))
                })
                .collect();
            let list = List::new(items)
                .block(modal_block("Drives".to_string(), Color::Blue))
                .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow));
            let mut state = ListState::default().with_selected(Some(*selected));
            frame.render_stateful_widget(list, modal_area, &mut state);
        }
        Modal::Viewer {
            name,
            url,
            kind,
            content_type,
            ..
        } => {
            let content = Text::from(vec![
                Line::raw(format!("Type: {} ({})", kind, content_type)),
                Line::raw(format!("URL: {}", url)),
                Line::raw(""),
                Line::styled(
                    "o / Enter: open in system viewer    d: download    Esc: close",
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            render_text_box(frame, centered_rect(70, 30, area), display_safe(name), Color::Cyan, content);
        }
        Modal::Editor(editor) => render_editor(editor, frame, centered_rect(90, 90, area)),
    }
}

fn render_editor(editor: &mut TextEditor, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);
    let mut title = format!("✏️ {}", display_safe(&editor.name));
    if editor.dirty {
        title.push_str(" [modified]");
    }
    if editor.saving {
        title.push_str(" [saving…]");
    }
    let color = if editor.confirm_discard {
        title.push_str("  Unsaved changes: Esc again to discard, Ctrl-S to save");
        Color::Red
    } else {
        title.push_str("  Ctrl-S save, Esc close");
        Color::Green
    };
    let block = modal_block(title, color);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = inner.height as usize;
    editor.scroll_to_cursor(height);
    let (row, col) = editor.cursor();
    let lines: Vec<Line> = editor
        .lines()
        .iter()
        .skip(editor.scroll)
        .take(height)
        .map(|line| Line::raw(display_safe(line)))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    if inner.width > 0 && inner.height > 0 && row >= editor.scroll {
        let x = inner.x + (col as u16).min(inner.width - 1);
        let y = inner.y + (row - editor.scroll) as u16;
        frame.set_cursor_position((x, y));
    }
}

pub fn render_notice(notice: &Notice, frame: &mut Frame, area: Rect) {
    let color = if notice.title.starts_with("Error") {
        Color::Red
    } else {
        Color::Yellow
    };
    let content = Text::from(vec![
        Line::raw(display_safe(&notice.message)),
        Line::raw(""),
        Line::styled("Enter or Esc to dismiss", Style::default().fg(Color::DarkGray)),
    ]);
    render_text_box(frame, centered_rect(60, 30, area), notice.title.clone(), color, content);
}
