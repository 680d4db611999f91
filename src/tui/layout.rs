use super::state::StatusLine;
use super::theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// 标准布局：Header(3) + Content(弹性) + Status(3) + Footer(3)
pub fn main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

/// 内容区左右分栏：列表 60% + 详情 40%
pub fn content_columns(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area)
        .to_vec()
}

/// 渲染通用 header
pub fn render_header(f: &mut Frame, title: Line<'_>, area: Rect) {
    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

/// 渲染状态栏（最近一次操作的结果）
pub fn render_status(f: &mut Frame, status: Option<&StatusLine>, area: Rect) {
    let (text, style) = match status {
        Some(s) => (
            format!(" {}", s.text),
            Style::default()
                .fg(theme::status_color(s.kind))
                .add_modifier(Modifier::BOLD),
        ),
        None => (String::new(), Style::default()),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(" Status "))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

/// 底部按键提示：按键高亮，说明文字暗色
pub fn render_footer(f: &mut Frame, hints: &[(&str, &str)], area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(theme::DIM)));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default().fg(theme::PINK).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {desc}"), Style::default().fg(Color::Green)));
    }
    let footer = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(footer, area);
}
