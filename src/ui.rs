// src/ui.rs
use std::collections::HashMap;
use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::charts::{ChartState, EventRow, Severity, StatsView};
use crate::history;
use crate::render::{Banner, BannerKind, ChartId, Renderer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Live,
    History,
}

/// Terminal-side view state. The dashboard writes into it through
/// [`Renderer`]; [`draw`] reads it every frame.
#[derive(Debug, Default)]
pub struct TuiRenderer {
    stats: Option<StatsView>,
    rows: Vec<EventRow>,
    history: Vec<EventRow>,
    charts: HashMap<ChartId, ChartState>,
    error: Option<Banner>,
    success: Option<Banner>,
    queue_size: u64,
    last_updated: Option<String>,
    retrain_busy: bool,
    auto_refresh: bool,
    released: bool,
    pub view: View,
    pub filter: String,
    pub editing_filter: bool,
}

impl TuiRenderer {
    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Live => View::History,
            View::History => View::Live,
        };
    }
}

impl Renderer for TuiRenderer {
    fn render_stats(&mut self, stats: &StatsView) {
        self.stats = Some(stats.clone());
    }

    fn render_table(&mut self, rows: &[EventRow]) {
        self.rows = rows.to_vec();
    }

    fn render_chart(&mut self, id: ChartId, chart: &ChartState) {
        match self.charts.get_mut(&id) {
            Some(existing) => existing.clone_from(chart),
            None => {
                self.charts.insert(id, chart.clone());
            }
        }
    }

    fn show_banner(&mut self, banner: Banner) {
        match banner.kind {
            BannerKind::Error => self.error = Some(banner),
            BannerKind::Success => self.success = Some(banner),
        }
    }

    fn render_history(&mut self, rows: &[EventRow]) {
        self.history = rows.to_vec();
    }

    fn render_queue(&mut self, queue_size: u64) {
        self.queue_size = queue_size;
    }

    fn render_last_updated(&mut self, at: &str) {
        self.last_updated = Some(at.to_string());
    }

    fn set_retrain_busy(&mut self, busy: bool) {
        self.retrain_busy = busy;
    }

    fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    fn release(&mut self) {
        self.charts.clear();
        self.released = true;
    }
}

fn severity_style(severity: Severity) -> Style {
    let color = match severity {
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Green,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn status_style(anomaly: bool) -> Style {
    if anomaly {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    }
}

pub fn draw(f: &mut Frame, r: &TuiRenderer, now: Instant) {
    if r.released {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Banner
            Constraint::Length(3), // Stat cards
            Constraint::Min(10),   // Body
        ])
        .split(f.size());

    render_header(f, chunks[0], r);
    render_banner(f, chunks[1], r, now);
    render_stat_cards(f, chunks[2], r);
    match r.view {
        View::Live => render_live(f, chunks[3], r),
        View::History => render_history(f, chunks[3], r),
    }
}

fn render_header(f: &mut Frame, area: Rect, r: &TuiRenderer) {
    let retrain = if r.retrain_busy { "Training..." } else { "t Retrain" };
    let auto = if r.auto_refresh { "on" } else { "off" };
    let line = Line::from(vec![
        Span::styled(
            " Network Anomaly Monitor ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "│ q Quit · r Refresh · {} · a Auto-refresh [{}] · h History · / Filter ",
                retrain, auto
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!(
                "│ Queue: {} · Updated: {}",
                r.queue_size,
                r.last_updated.as_deref().unwrap_or("never")
            ),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_banner(f: &mut Frame, area: Rect, r: &TuiRenderer, now: Instant) {
    let visible = [&r.error, &r.success]
        .into_iter()
        .flatten()
        .filter(|b| b.is_visible(now))
        .max_by_key(|b| b.raised_at);
    if let Some(banner) = visible {
        let style = match banner.kind {
            BannerKind::Error => Style::default().fg(Color::White).bg(Color::Red),
            BannerKind::Success => Style::default().fg(Color::Black).bg(Color::Green),
        };
        f.render_widget(Paragraph::new(format!(" {} ", banner.message)).style(style), area);
    }
}

fn render_stat_cards(f: &mut Frame, area: Rect, r: &TuiRenderer) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let (total, normal, anomaly, rate, severity) = match &r.stats {
        Some(s) => (s.total, s.normal, s.anomaly, s.rate_label.clone(), s.severity),
        None => (0, 0, 0, "0.00%".to_string(), Severity::Low),
    };
    let cards = [
        ("Total Packets", total.to_string(), Style::default().fg(Color::Cyan)),
        ("Normal", normal.to_string(), Style::default().fg(Color::Green)),
        ("Anomalies", anomaly.to_string(), Style::default().fg(Color::Red)),
        ("Anomaly Rate", rate, severity_style(severity)),
    ];
    for ((title, value, style), col) in cards.into_iter().zip(cols.iter()) {
        let card = Paragraph::new(Span::styled(value, style))
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(card, *col);
    }
}

fn render_live(f: &mut Frame, area: Rect, r: &TuiRenderer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_bar_chart(f, top[0], r.charts.get(&ChartId::Status), &[Color::Green, Color::Red]);
    render_bar_chart(
        f,
        top[1],
        r.charts.get(&ChartId::Protocol),
        &[Color::Blue, Color::Green, Color::Yellow, Color::Red, Color::Magenta, Color::Cyan],
    );
    render_line_chart(f, middle[0], r.charts.get(&ChartId::Flow), &[Color::Blue]);
    render_line_chart(f, middle[1], r.charts.get(&ChartId::Hourly), &[Color::Green, Color::Red]);
    render_event_table(f, rows[2], " Recent Packets ", r.rows.iter(), None);
}

fn render_bar_chart(f: &mut Frame, area: Rect, chart: Option<&ChartState>, palette: &[Color]) {
    let Some(chart) = chart else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let data: Vec<(&str, u64)> = chart
        .labels
        .iter()
        .map(String::as_str)
        .zip(chart.values(0).iter().copied())
        .collect();
    let color = palette.first().copied().unwrap_or(Color::Gray);
    let bars = BarChart::default()
        .block(Block::default().title(format!(" {} ", chart.title)).borders(Borders::ALL))
        .data(data.as_slice())
        .bar_width(9)
        .bar_gap(2)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));
    f.render_widget(bars, area);
}

fn render_line_chart(f: &mut Frame, area: Rect, chart: Option<&ChartState>, palette: &[Color]) {
    let Some(chart) = chart else {
        f.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let points: Vec<Vec<(f64, f64)>> = chart
        .series
        .iter()
        .map(|s| {
            s.values
                .iter()
                .enumerate()
                .map(|(x, y)| (x as f64, *y as f64))
                .collect()
        })
        .collect();
    let datasets: Vec<Dataset> = chart
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (s, pts))| {
            Dataset::default()
                .name(s.name.as_str())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(palette.get(i).copied().unwrap_or(Color::Gray)))
                .data(pts)
        })
        .collect();

    let width = chart.labels.len().max(1) as f64 - 1.0;
    let y_max = chart
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let x_labels: Vec<Span> = match (chart.labels.first(), chart.labels.last()) {
        (Some(first), Some(last)) => vec![Span::raw(first.as_str()), Span::raw(last.as_str())],
        _ => Vec::new(),
    };

    let widget = Chart::new(datasets)
        .block(Block::default().title(format!(" {} ", chart.title)).borders(Borders::ALL))
        .x_axis(Axis::default().bounds([0.0, width.max(1.0)]).labels(x_labels))
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{}", y_max as u64))]),
        );
    f.render_widget(widget, area);
}

fn render_event_table<'a>(
    f: &mut Frame,
    area: Rect,
    title: &'a str,
    rows: impl Iterator<Item = &'a EventRow>,
    empty: Option<&'a str>,
) {
    let body: Vec<Row> = rows
        .map(|row| {
            Row::new(vec![
                Cell::from(row.timestamp.as_str()),
                Cell::from(row.source.as_str()),
                Cell::from(row.destination.as_str()),
                Cell::from(row.protocol.as_str()),
                Cell::from(row.length.as_str()),
                Cell::from(row.status.as_str()).style(status_style(row.anomaly)),
            ])
        })
        .collect();

    let block = Block::default().title(title).borders(Borders::ALL);
    if body.is_empty() {
        if let Some(msg) = empty {
            let p = Paragraph::new(Span::styled(msg, Style::default().fg(Color::Gray)))
                .block(block)
                .wrap(Wrap { trim: true });
            f.render_widget(p, area);
            return;
        }
    }

    let table = Table::new(
        body,
        [
            Constraint::Length(20),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["Timestamp", "Source", "Destination", "Protocol", "Length", "Status"])
            .style(Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD)),
    )
    .block(block);
    f.render_widget(table, area);
}

fn render_history(f: &mut Frame, area: Rect, r: &TuiRenderer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let cursor = if r.editing_filter { "_" } else { "" };
    let filter = Paragraph::new(format!("{}{}", r.filter, cursor)).block(
        Block::default()
            .title(" Filter (/ to edit, Enter to apply) ")
            .borders(Borders::ALL),
    );
    f.render_widget(filter, chunks[0]);

    let matched = history::filter_rows(&r.history, &r.filter);
    render_event_table(
        f,
        chunks[1],
        " Anomaly History ",
        matched.into_iter(),
        Some(history::EMPTY_MESSAGE),
    );
}
