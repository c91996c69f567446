use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, Gauge, GraphType, Paragraph, Row, Sparkline, Table, Wrap,
    },
    Frame,
};

use crate::{
    app::App,
    model::MetricsSnapshot,
    terminal::LineKind,
    utils::{
        bar_ratio, display_safe, format_bytes, format_rate, format_uptime, truncate_string, CHART_WINDOW_SIZE,
        DEVICE_NAME_MAX_LEN, FILE_NAME_MAX_LEN, PROCESS_NAME_MAX_LEN,
    },
};

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
}

fn nav_span(label: &'static str, enabled: bool) -> Span<'static> {
    if enabled {
        Span::styled(label, Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(label, Style::default().fg(Color::DarkGray))
    }
}

pub fn render_files(app: &App, frame: &mut Frame, area: Rect) {
    let explorer = &app.explorer;
    let block = panel_block("📂 Files".to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Nav bar + path
            Constraint::Length(1), // Drives
            Constraint::Min(0),    // Entries
        ])
        .split(inner);

    let affordances = explorer.affordances();
    let history = explorer.history().state();
    let position = history.cursor().map_or(0, |idx| idx + 1);
    let mut nav = vec![
        Span::styled(format!("[{}/{}] ", position, history.len()), Style::default().fg(Color::DarkGray)),
        nav_span("◀ Back", affordances.back),
        Span::raw("  "),
        nav_span("▶ Forward", affordances.forward),
        Span::raw("  "),
        nav_span("▲ Up", true),
        Span::raw("   "),
        Span::styled(
            display_safe(explorer.displayed_path().unwrap_or("")),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if explorer.loading {
        nav.push(Span::styled(
            format!("  loading {}…", display_safe(explorer.current_path())),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(nav)), layout[0]);

    let mut drives = vec![Span::styled("Drives: ", Style::default().fg(Color::DarkGray))];
    for drive in explorer.drives() {
        let style = if explorer.is_current_drive(drive) {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default().fg(Color::White).bg(Color::Blue)
        };
        drives.push(Span::styled(format!(" {} ", display_safe(drive)), style));
        drives.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(drives)), layout[1]);

    if explorer.rows().is_empty() {
        let message = if explorer.displayed_path().is_some() {
            "This directory is empty"
        } else {
            "No listing loaded"
        };
        let placeholder = Paragraph::new(message).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(placeholder, layout[2]);
        return;
    }

    let header = Row::new(["", "Name", "Type", "Size"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = explorer
        .rows()
        .iter()
        .map(|row| {
            let name_style = if row.is_dir {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            Row::new([
                Cell::from(row.icon),
                Cell::from(truncate_string(&row.display_name(), FILE_NAME_MAX_LEN)).style(name_style),
                Cell::from(display_safe(&row.type_label)),
                Cell::from(row.size_label.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow));

    let mut table_state = explorer.table_state.clone();
    frame.render_stateful_widget(table, layout[2], &mut table_state);
}

fn gauge(title: &'static str, percent: f64, color: Color) -> Gauge<'static> {
    Gauge::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(bar_ratio(percent))
        .label(format!("{:.1}%", percent))
}

fn details_text(snapshot: &MetricsSnapshot, rates: (f64, f64), totals: (u64, u64)) -> String {
    let mut lines = Vec::new();
    if let Some(os) = &snapshot.os {
        lines.push(format!("▶ OS: {}", display_safe(os)));
    }
    match (snapshot.cpu_count, snapshot.cpu_freq_current) {
        (Some(count), Some(freq)) => lines.push(format!("▶ CPU: {} cores @ {:.0} MHz", count, freq)),
        (Some(count), None) => lines.push(format!("▶ CPU: {} cores", count)),
        _ => {}
    }
    if let (Some(used), Some(total)) = (snapshot.ram_used, snapshot.ram_total) {
        lines.push(format!("▶ Memory: {} / {}", format_bytes(used), format_bytes(total)));
    }
    if let (Some(used), Some(total)) = (snapshot.disk_used, snapshot.disk_total) {
        lines.push(format!("▶ Disk: {} / {}", format_bytes(used), format_bytes(total)));
    }
    if let Some(uptime) = snapshot.uptime_seconds {
        lines.push(format!("▶ Uptime: {}", format_uptime(uptime)));
    }
    if let Some(count) = snapshot.process_count() {
        lines.push(format!("▶ Processes: {}", count));
    }
    if let Some(load) = snapshot.load_avg.as_ref().filter(|load| !load.is_empty()) {
        let load: Vec<String> = load.iter().map(|v| format!("{:.2}", v)).collect();
        lines.push(format!("▶ Load avg: {}", load.join(" ")));
    }
    let (rx, tx) = rates;
    lines.push(format!("▶ Network: ↓{} ↑{}", format_rate(rx), format_rate(tx)));
    let (sent, recv) = totals;
    lines.push(format!("  Total: ↓{} ↑{}", format_bytes(recv), format_bytes(sent)));
    lines.join("\n")
}

pub fn render_system(app: &App, frame: &mut Frame, area: Rect) {
    let metrics = &app.metrics;
    let block = panel_block("💻 System".to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Gauges
            Constraint::Percentage(45), // Chart + details
            Constraint::Min(0),         // Tables
            Constraint::Length(1),      // Status line
        ])
        .split(inner);

    render_status_line(app, frame, layout[3]);

    let Some(snapshot) = metrics.latest.as_ref() else {
        let waiting = Paragraph::new("Waiting for the first metrics sample…").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(waiting, layout[1]);
        return;
    };

    let gauges = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(layout[0]);
    frame.render_widget(gauge("CPU", snapshot.cpu_percent, Color::Red), gauges[0]);
    frame.render_widget(gauge("RAM", snapshot.ram_percent, Color::Green), gauges[1]);
    frame.render_widget(gauge("Disk", snapshot.disk_percent, Color::Blue), gauges[2]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[1]);

    let cpu_points = metrics.cpu.points();
    let ram_points = metrics.ram.points();
    let disk_points = metrics.disk.points();
    let datasets = vec![
        Dataset::default()
            .name("CPU")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&cpu_points),
        Dataset::default()
            .name("RAM")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&ram_points),
        Dataset::default()
            .name("Disk")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&disk_points),
    ];
    let chart = Chart::new(datasets)
        .block(Block::default().title("Usage history (%)").borders(Borders::ALL))
        .x_axis(Axis::default().bounds([0.0, (CHART_WINDOW_SIZE - 1) as f64]))
        .y_axis(
            Axis::default()
                .bounds([0.0, 100.0])
                .labels(vec![Span::raw("0"), Span::raw("50"), Span::raw("100")])
                .style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(chart, middle[0]);

    let details_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(middle[1]);
    let network = &metrics.network;
    let details = Paragraph::new(details_text(
        snapshot,
        network.current_rates(),
        (network.total_sent, network.total_recv),
    ))
    .style(Style::default().fg(Color::Cyan))
    .block(Block::default().title("Details").borders(Borders::ALL))
    .wrap(Wrap { trim: true });
    frame.render_widget(details, details_layout[0]);

    let sparklines = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(details_layout[1]);
    let rx_data: Vec<u64> = network.rx_rates.iter().map(|v| v.max(0.0) as u64).collect();
    let tx_data: Vec<u64> = network.tx_rates.iter().map(|v| v.max(0.0) as u64).collect();
    let rx = Sparkline::default()
        .block(Block::default().title("RX").borders(Borders::ALL).border_style(Style::default().fg(Color::Green)))
        .data(&rx_data)
        .style(Style::default().fg(Color::Green));
    let tx = Sparkline::default()
        .block(Block::default().title("TX").borders(Borders::ALL).border_style(Style::default().fg(Color::Red)))
        .data(&tx_data)
        .style(Style::default().fg(Color::Red));
    frame.render_widget(rx, sparklines[0]);
    frame.render_widget(tx, sparklines[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[2]);
    render_processes(app, snapshot, frame, bottom[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(bottom[1]);
    render_disks(snapshot, frame, right[0]);
    render_temperatures(snapshot, frame, right[1]);
}

fn render_status_line(app: &App, frame: &mut Frame, area: Rect) {
    let metrics = &app.metrics;
    let line = match (&metrics.last_error, metrics.last_update) {
        (Some(err), _) => Line::styled(
            format!("Metrics unavailable: {}", display_safe(err)),
            Style::default().fg(Color::Red),
        ),
        (None, Some(at)) => Line::styled(
            format!("Updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ),
        (None, None) => Line::styled("Polling…", Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn percent_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}

fn render_processes(app: &App, snapshot: &MetricsSnapshot, frame: &mut Frame, area: Rect) {
    let header = Row::new(["PID", "Name", "CPU %", "Mem %"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = snapshot
        .processes
        .iter()
        .skip(app.metrics.process_scroll)
        .map(|process| {
            let name = process.name.as_deref().map(display_safe).unwrap_or_default();
            Row::new([
                process.pid.to_string(),
                truncate_string(&name, PROCESS_NAME_MAX_LEN),
                percent_cell(process.cpu_percent),
                percent_cell(process.memory_percent),
            ])
        })
        .collect();
    let title = format!(
        "⚙️ Processes ({}/{})",
        (app.metrics.process_scroll + 1).min(snapshot.processes.len()),
        snapshot.processes.len()
    );
    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_disks(snapshot: &MetricsSnapshot, frame: &mut Frame, area: Rect) {
    let header = Row::new(["Device", "Mount", "Used / Total", "%"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = snapshot
        .all_disks
        .iter()
        .map(|disk| {
            Row::new([
                truncate_string(&display_safe(&disk.device), DEVICE_NAME_MAX_LEN),
                match &disk.fstype {
                    Some(fstype) => format!(
                        "{} ({})",
                        truncate_string(&display_safe(&disk.mountpoint), DEVICE_NAME_MAX_LEN),
                        display_safe(fstype)
                    ),
                    None => truncate_string(&display_safe(&disk.mountpoint), DEVICE_NAME_MAX_LEN),
                },
                format!("{} / {}", format_bytes(disk.used), format_bytes(disk.total)),
                format!("{:.1}", disk.percent),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Min(8),
            Constraint::Length(22),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(Block::default().title("💾 Disks").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_temperatures(snapshot: &MetricsSnapshot, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    for (group, readings) in &snapshot.temperatures {
        lines.push(Line::styled(display_safe(group), Style::default().fg(Color::Yellow)));
        for reading in readings {
            let mut text = format!("  {}: {}", display_safe(&reading.label), percent_cell(reading.current));
            text.push_str("°C");
            if let Some(high) = reading.high {
                text.push_str(&format!(" (high {:.0}", high));
                if let Some(critical) = reading.critical {
                    text.push_str(&format!(", crit {:.0}", critical));
                }
                text.push(')');
            }
            lines.push(Line::raw(text));
        }
    }
    if lines.is_empty() {
        lines.push(Line::styled("No sensors reported", Style::default().fg(Color::DarkGray)));
    }
    let paragraph = Paragraph::new(lines).block(Block::default().title("🌡 Temperatures").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Output => Style::default().fg(Color::White),
        LineKind::Command => Style::default().fg(Color::Yellow),
        LineKind::Exit => Style::default().fg(Color::Cyan),
        LineKind::Info => Style::default().fg(Color::Green),
        LineKind::Error => Style::default().fg(Color::Red),
    }
}

pub fn render_terminal(app: &App, frame: &mut Frame, area: Rect) {
    let session = &app.terminal;
    let status = if session.connected { "connected" } else { "disconnected" };
    let block = panel_block(format!("🖥 Terminal ({})", status));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(inner);

    let height = layout[0].height as usize;
    let total = session.lines().len();
    let end = total.saturating_sub(session.scroll_offset);
    let start = end.saturating_sub(height);
    let lines: Vec<Line> = session
        .lines()
        .range(start..end)
        .map(|line| Line::styled(line.text.as_str(), line_style(line.kind)))
        .collect();
    frame.render_widget(Paragraph::new(lines), layout[0]);

    let input = Paragraph::new(format!("$ {}█", session.input))
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(input, layout[1]);
}
