use crate::sort_session::{LogLevel, SortStage};
use crate::ui::app::{App, GroupRow, InputMode, Pane};
use humansize::{BINARY, format_size};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};
use std::path::Path;

pub fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let dir = app.workspace.directory.as_deref();

    // The disk holding the open directory: longest matching mount point.
    let disk = app
        .disks
        .list()
        .iter()
        .filter(|d| dir.unwrap_or(Path::new("/")).starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    let dir_text = dir.map_or_else(
        || "no directory ([o] to open)".to_string(),
        |d| d.display().to_string(),
    );
    let disk_text = disk.map_or_else(
        || "Disk: N/A".to_string(),
        |d| format!("Free: {}", format_size(d.available_space(), BINARY)),
    );

    let header = Paragraph::new(format!(
        "Sortra v{} | {dir_text} | {disk_text}",
        env!("CARGO_PKG_VERSION")
    ))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn pane_block(app: &App, pane: Pane, title: String) -> Block<'static> {
    let style = if app.pane == pane {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn titled(name: &str, query: &str) -> String {
    if query.is_empty() {
        name.to_string()
    } else {
        format!("{name} /{query}")
    }
}

fn highlight() -> Style {
    Style::default()
        .add_modifier(Modifier::BOLD)
        .fg(Color::Yellow)
}

pub fn render_files(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .workspace
        .visible_files()
        .iter()
        .map(|file| {
            ListItem::new(format!(
                "{:<30} {:>10}",
                file.name,
                format_size(file.size, BINARY)
            ))
        })
        .collect();

    let title = titled("Files", &app.workspace.file_query);
    let list = List::new(items)
        .block(pane_block(app, Pane::Files, title))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.file_state);
}

pub fn render_extensions(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .workspace
        .visible_extensions()
        .iter()
        .map(|ext| ListItem::new(format!(".{:<12} {:>5}", ext.name, ext.count)))
        .collect();

    let title = titled("Extensions", &app.workspace.extension_query);
    let list = List::new(items)
        .block(pane_block(app, Pane::Extensions, title))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.extension_state);
}

pub fn render_groups(f: &mut Frame, app: &mut App, area: Rect) {
    let groups = &app.workspace.groups;
    let mut number = 0;
    let items: Vec<ListItem> = app
        .group_rows()
        .into_iter()
        .filter_map(|row| {
            let group = groups.by_id(row.group())?;
            let line = match row {
                GroupRow::Group(_) => {
                    number += 1;
                    Line::from(format!("{number} {}/", group.name)).style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )
                }
                GroupRow::Extension { id, .. } => {
                    let ext = group.extension_list().iter().find(|e| e.id == id)?;
                    Line::from(format!("   .{}", ext.name))
                }
                GroupRow::File { id, .. } => {
                    let file = group.file_list().iter().find(|f| f.id == id)?;
                    Line::from(format!("   {}", file.name))
                }
            };
            Some(ListItem::new(line))
        })
        .collect();

    let list = List::new(items)
        .block(pane_block(app, Pane::Groups, "Groups".to_string()))
        .highlight_style(highlight())
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.group_state);
}

pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let summary = app.workspace.summary();
    let most_common = summary
        .most_common
        .map_or_else(|| "-".to_string(), |(name, count)| format!(".{name} ({count})"));
    let counts = format!(
        "{} files | {} extensions | {} groups | Most common: {most_common} | Total: {}",
        summary.files,
        summary.extensions,
        summary.groups,
        format_size(summary.total_size, BINARY)
    );

    let hint = if let Some(status) = &app.status {
        Line::from(status.as_str()).style(Style::default().fg(Color::Red))
    } else {
        Line::from(match app.sort.stage {
            SortStage::Reviewing => "[y/Enter] Sort [n/Esc] Back",
            SortStage::Executing => "Sorting...",
            SortStage::Complete | SortStage::Failed(_) if !app.sort.worker_done() => {
                "Finishing..."
            }
            SortStage::Complete | SortStage::Failed(_) => "[Enter] Rescan",
            SortStage::Idle => {
                "[Tab] Pane [1-9] Assign [x] Evict [n] New [r] Rename [d] Delete [R] Reset [/] Search [s] Sort [o] Open [q] Quit"
            }
        })
    };

    let footer = Paragraph::new(vec![Line::from(counts), hint])
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

pub fn render_input(f: &mut Frame, app: &App) {
    let title = match app.input_mode {
        InputMode::Normal => return,
        InputMode::Search => "Search",
        InputMode::NewGroup => "New group",
        InputMode::RenameGroup(_) => "Rename group",
        InputMode::OpenDirectory => "Open directory (empty to cancel)",
    };
    let area = centered_rect(50, 3, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(format!("{}_", app.input))
            .block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

pub fn render_review(f: &mut Frame, app: &App) {
    let Some(plan) = &app.sort.plan else {
        return;
    };
    let ws = &app.workspace;

    let mut lines = vec![
        Line::from(format!(
            "Create {} directories and move {} files into them.",
            plan.directory_count(),
            plan.file_count()
        )),
        Line::default(),
    ];

    for group in &ws.groups {
        let moving = plan.get(&group.name).map_or(0, <[String]>::len);
        lines.push(
            Line::from(format!("{}/ ({moving} files)", group.name))
                .style(Style::default().add_modifier(Modifier::BOLD)),
        );
        for ext in group.extension_list() {
            lines.push(Line::from(format!(
                "   .{} -> {} files",
                ext.name,
                ws.resolved_count(&ext.name)
            )));
        }
        for file in group.file_list() {
            lines.push(Line::from(format!(
                "   {} ({})",
                file.name,
                format_size(file.size, BINARY)
            )));
        }
    }

    let overlaps = ws.overlaps();
    if !overlaps.is_empty() {
        lines.push(Line::default());
        for overlap in overlaps {
            lines.push(
                Line::from(format!(
                    "! {} is claimed by {}",
                    overlap.file,
                    overlap.groups.join(", ")
                ))
                .style(Style::default().fg(Color::Yellow)),
            );
        }
    }

    let area = centered_rect_pct(70, 70, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Review sort"))
            .wrap(Wrap { trim: false }),
        area,
    );
}

pub fn render_progress(f: &mut Frame, app: &App) {
    let (title, color) = match &app.sort.stage {
        SortStage::Executing => ("Sorting".to_string(), Color::Cyan),
        SortStage::Complete => ("Sort complete".to_string(), Color::Green),
        SortStage::Failed(reason) => (format!("Sort failed: {reason}"), Color::Red),
        SortStage::Idle | SortStage::Reviewing => return,
    };

    let area = centered_rect_pct(70, 60, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let progress = app.sort.progress;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(progress.ratio().clamp(0.0, 1.0))
        .label(format!("{}/{}", progress.value, progress.max));
    f.render_widget(gauge, chunks[0]);

    // Newest lines at the bottom.
    let visible = usize::from(chunks[1].height);
    let skip = app.sort.log.len().saturating_sub(visible);
    let lines: Vec<Line> = app
        .sort
        .log
        .iter()
        .skip(skip)
        .map(|line| {
            let (marker, color) = match line.level {
                LogLevel::Info => ("[i]", Color::Gray),
                LogLevel::Success => ("[✓]", Color::Green),
                LogLevel::Error => ("[✗]", Color::Red),
            };
            Line::from(vec![
                Span::styled(format!("{marker} "), Style::default().fg(color)),
                Span::raw(format!("{} {}", line.timestamp, line.message)),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[1]);
}

/// A popup `height` rows tall and `percent_x` of the width, centered.
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn centered_rect_pct(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    centered_rect(percent_x, vertical[1].height, vertical[1])
}
