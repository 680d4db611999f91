//! 主界面：可升级列表 + 详情面板

use super::layout;
use super::state::{App, Intent, PackagePhase, StatusKind};
use super::theme::{BLUE, BRIGHT_WHITE, DESC_DIM, DIM, GOOD, PINK, SEL_BG};
use crate::orchestrator::ActionKind;
use crate::update_check::VersionStatus;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// 把按键翻译成意图
///
/// 需要选中项的动作在没有选中时直接写状态栏，不产生意图。
pub fn handle_key(key: KeyEvent, app: &mut App) -> Option<Intent> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Intent::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Intent::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(Intent::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(Intent::SelectNext),
        KeyCode::Home | KeyCode::Char('g') => Some(Intent::SelectFirst),
        KeyCode::End | KeyCode::Char('G') => Some(Intent::SelectLast),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Intent::Refresh),
        KeyCode::Char('v') => Some(Intent::CheckVersion),
        KeyCode::Char('a') => Some(Intent::UpgradeAll),
        KeyCode::Enter | KeyCode::Char('u') => selected_intent(app, Intent::Upgrade),
        KeyCode::Delete | KeyCode::Char('x') => selected_intent(app, Intent::Uninstall),
        _ => None,
    }
}

fn selected_intent(app: &mut App, make: fn(String) -> Intent) -> Option<Intent> {
    match app.selected().map(|record| record.id.clone()) {
        Some(id) => Some(make(id)),
        None => {
            app.set_status(StatusKind::Warning, "Please select a package first.");
            None
        }
    }
}

// ===== 渲染 =====

pub fn render_packages(f: &mut Frame, app: &App) {
    let chunks = layout::main_layout(f.area());

    layout::render_header(f, header_line(app), chunks[0]);

    let columns = layout::content_columns(chunks[1]);
    render_list(f, app, columns[0]);
    render_detail(f, app, columns[1]);

    layout::render_status(f, app.status.as_ref(), chunks[2]);
    layout::render_footer(f, &footer_hints(app), chunks[3]);
}

fn header_line(app: &App) -> Line<'static> {
    let mut spans = vec![Span::raw(format!(
        "📦 {} v{}",
        app.config.app.name, app.config.app.version
    ))];

    let checked_at = app
        .version_checked_at
        .map(|t| format!(" (checked {})", t.format("%H:%M:%S")))
        .unwrap_or_default();

    let badge = if app.schedule.in_flight() {
        Some(Span::styled("  | checking for updates...", Style::default().fg(Color::Yellow)))
    } else {
        app.version.as_ref().map(|v| match v.status {
            VersionStatus::UpdateAvailable => Span::styled(
                format!(
                    "  | update available: v{}{checked_at}",
                    v.latest_version.as_deref().unwrap_or("?")
                ),
                Style::default().fg(GOOD).add_modifier(Modifier::BOLD),
            ),
            VersionStatus::UpToDate => Span::styled(
                format!("  | up to date{checked_at}"),
                Style::default().fg(DIM),
            ),
            VersionStatus::CheckFailed => Span::styled(
                format!(
                    "  | update check failed: {}",
                    v.message.as_deref().unwrap_or("unknown error")
                ),
                Style::default().fg(PINK),
            ),
        })
    };
    spans.extend(badge);
    Line::from(spans)
}

fn list_title(app: &App) -> String {
    if !app.loaded_once || app.phase == PackagePhase::Loading {
        " Checking for available upgrades... ".to_string()
    } else if app.records.is_empty() {
        " No Available Upgrades Found ".to_string()
    } else {
        format!(" Available Upgrades ({}) ", app.records.len())
    }
}

/// 渲染可升级列表
fn render_list(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(list_title(app))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let padded = inner.inner(Margin {
        horizontal: 1,
        vertical: 0,
    });
    if padded.height == 0 || app.records.is_empty() {
        return;
    }

    let visible_height = padded.height as usize;
    let total = app.records.len();
    let selected = app.selected_index().unwrap_or(0);

    let scroll = if selected >= visible_height {
        selected.saturating_sub(visible_height - 1)
    } else {
        0
    };

    // 名称列对齐宽度
    let max_name_width = app
        .records
        .iter()
        .skip(scroll)
        .take(visible_height)
        .map(|r| UnicodeWidthStr::width(r.name.as_str()))
        .max()
        .unwrap_or(20);

    let lines: Vec<Line> = app
        .records
        .iter()
        .enumerate()
        .skip(scroll)
        .take(visible_height)
        .map(|(idx, record)| {
            let is_selected = Some(idx) == app.selected_index();
            let cursor = if is_selected { "> " } else { "  " };
            let padding = max_name_width.saturating_sub(UnicodeWidthStr::width(record.name.as_str())) + 2;

            if is_selected {
                let bg = Style::default().bg(SEL_BG);
                Line::from(vec![
                    Span::styled(cursor, bg.fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD)),
                    Span::styled(record.name.clone(), bg.fg(BRIGHT_WHITE).add_modifier(Modifier::BOLD)),
                    Span::styled(
                        format!("{}{}", " ".repeat(padding), record.current_version),
                        bg.fg(DESC_DIM),
                    ),
                    Span::styled(" → ", bg.fg(DESC_DIM)),
                    Span::styled(record.available_version.clone(), bg.fg(GOOD)),
                ])
            } else {
                Line::from(vec![
                    Span::styled(cursor, Style::default().fg(Color::White)),
                    Span::styled(record.name.clone(), Style::default().fg(BLUE)),
                    Span::styled(
                        format!("{}{}", " ".repeat(padding), record.current_version),
                        Style::default().fg(DIM),
                    ),
                    Span::styled(" → ", Style::default().fg(DIM)),
                    Span::styled(record.available_version.clone(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    f.render_widget(Paragraph::new(lines), padded);

    // 滚动条
    if total > visible_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut state = ScrollbarState::new(total).position(scroll);
        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                horizontal: 0,
                vertical: 1,
            }),
            &mut state,
        );
    }
}

/// 详情行: "标签: 值"
fn detail_line(label: &str, value: &str, value_style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(value.to_string(), value_style),
    ])
}

fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let plain = Style::default().fg(Color::White);
    let lines: Vec<Line> = match (app.loaded_once, app.selected()) {
        (false, _) => vec![Line::from(Span::styled(
            "Checking for available upgrades...",
            Style::default().fg(Color::Yellow),
        ))],
        (true, Some(record)) => vec![
            detail_line("Name", &record.name, plain),
            detail_line("ID", &record.id, plain),
            detail_line("Installed", &record.current_version, plain),
            detail_line(
                "Available",
                &record.available_version,
                Style::default().fg(GOOD).add_modifier(Modifier::BOLD),
            ),
            detail_line("Source", &record.source_repository, plain),
            Line::from(""),
            Line::from(Span::styled(action_hint(app), Style::default().fg(DIM))),
        ],
        (true, None) if app.records.is_empty() => vec![Line::from(Span::styled(
            "Everything is up to date!",
            Style::default().fg(GOOD).add_modifier(Modifier::BOLD),
        ))],
        (true, None) => vec![Line::from(Span::styled(
            "Select a package from the left to view details and perform actions.",
            plain,
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn action_hint(app: &App) -> &'static str {
    match app.phase {
        PackagePhase::Idle => "Ready for action.",
        PackagePhase::Loading => "Refreshing...",
        PackagePhase::InFlight(ActionKind::Upgrade) => "Upgrading...",
        PackagePhase::InFlight(ActionKind::Uninstall) => "Uninstalling...",
    }
}

/// 底部按键提示；列表为空时隐藏针对包的动作
fn footer_hints(app: &App) -> Vec<(&'static str, &'static str)> {
    let mut hints = vec![("↑↓", "select")];
    if !app.records.is_empty() {
        hints.extend([("Enter/u", "upgrade"), ("a", "upgrade all"), ("x", "uninstall")]);
    }
    hints.extend([("r", "refresh"), ("v", "check version"), ("q", "quit")]);
    hints
}
