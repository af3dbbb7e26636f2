use std::{io, time::Duration};

use anyhow::Result;
use codetime_core::{format_duration, AggregateStats, CodeTime};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Gauge, Padding, Paragraph},
};

// --- THEME ---
struct Theme {
    primary: Color,
    muted: Color,
    text: Color,
    bar: Color,
    peak: Color,
}

const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    text: Color::White,
    bar: Color::Green,
    peak: Color::Yellow,
};

/// One screen of the dashboard: the whole window or a single day.
pub struct View {
    pub title: String,
    pub stats: AggregateStats,
}

pub struct DashboardApp {
    pub views: Vec<View>,
    pub current: usize,
    pub average_per_day: f64,
}

impl DashboardApp {
    pub fn new(rollup: AggregateStats, days: usize) -> Self {
        let average_per_day = rollup.average_per_day;
        let mut views = Vec::with_capacity(rollup.daily_data.len() + 1);
        for day in &rollup.daily_data {
            views.push(View {
                title: day.date.format("%a %Y-%m-%d").to_string(),
                stats: AggregateStats::from_records(vec![day.clone()]),
            });
        }
        views.insert(
            0,
            View {
                title: format!("Last {} day(s)", days.max(1)),
                stats: rollup,
            },
        );
        Self {
            views,
            current: 0,
            average_per_day,
        }
    }

    pub fn next(&mut self) {
        if self.current + 1 < self.views.len() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        if self.current > 0 {
            self.current -= 1;
        }
    }

    pub fn current_view(&self) -> &View {
        &self.views[self.current]
    }
}

pub fn run(app: &CodeTime, days: usize) -> Result<()> {
    let mut dashboard = DashboardApp::new(app.stats(days), days);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = event_loop(&mut terminal, &mut dashboard, app, days);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &mut DashboardApp,
    app: &CodeTime,
    days: usize,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, dashboard))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Left | KeyCode::Char('h') => dashboard.previous(),
                        KeyCode::Right | KeyCode::Char('l') => dashboard.next(),
                        KeyCode::Char('r') => {
                            let current = dashboard.current;
                            *dashboard = DashboardApp::new(app.stats(days), days);
                            dashboard.current = current.min(dashboard.views.len() - 1);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

fn ui(frame: &mut Frame, app: &DashboardApp) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Chart + sidebar
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    let view = app.current_view();

    // --- Header ---
    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20),
            Constraint::Min(1),
            Constraint::Length(30),
        ])
        .split(main_layout[0]);

    let app_title = Paragraph::new(Span::styled(
        "CODETIME",
        Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(app_title, header_layout[0]);

    let nav_text = Line::from(vec![
        Span::styled(" < ", nav_style(app.current > 0)),
        Span::styled(
            format!(" {} ", view.title),
            Style::default().fg(THEME.text).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" > ", nav_style(app.current + 1 < app.views.len())),
    ]);
    let nav = Paragraph::new(nav_text)
        .alignment(Alignment::Right)
        .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(nav, header_layout[2]);

    frame.render_widget(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(THEME.muted)),
        main_layout[0],
    );

    // --- Content ---
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(75),
            Constraint::Length(1),
            Constraint::Percentage(25),
        ])
        .split(main_layout[1]);

    draw_chart(frame, &view.stats, content_chunks[0]);
    draw_info_panel(frame, app, &view.stats, content_chunks[2]);

    // --- Footer ---
    let help = Line::from(vec![
        Span::styled("NAV: ", Style::default().fg(THEME.muted)),
        Span::styled("←/→ ", Style::default().fg(THEME.text)),
        Span::raw("  "),
        Span::styled("RELOAD: ", Style::default().fg(THEME.muted)),
        Span::styled("r ", Style::default().fg(THEME.text)),
        Span::raw("  "),
        Span::styled("QUIT: ", Style::default().fg(THEME.muted)),
        Span::styled("q", Style::default().fg(THEME.text)),
    ]);
    frame.render_widget(
        Paragraph::new(help).alignment(Alignment::Center),
        main_layout[2],
    );
}

fn nav_style(enabled: bool) -> Style {
    Style::default().fg(if enabled { THEME.text } else { THEME.muted })
}

fn draw_chart(frame: &mut Frame, stats: &AggregateStats, area: Rect) {
    let peak = stats.most_productive_hour.hour;
    let bars: Vec<Bar> = stats
        .hourly_breakdown
        .iter()
        .enumerate()
        .map(|(hour, seconds)| {
            let minutes = seconds / 60;
            let color = if Some(hour) == peak { THEME.peak } else { THEME.bar };
            Bar::default()
                .label(Line::from(format!("{:02}", hour)))
                .value(minutes)
                .style(Style::default().fg(color))
                .text_value(if minutes > 0 { minutes.to_string() } else { String::new() })
        })
        .collect();

    let chart_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(THEME.muted))
        .title(" Minutes by Hour ");

    let chart = BarChart::default()
        .block(chart_block)
        .bar_width(2)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

fn draw_info_panel(frame: &mut Frame, app: &DashboardApp, stats: &AggregateStats, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(area);

    let mut lines = vec![
        Line::from(Span::styled("Overview", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        stat_line("Total:   ", format_duration(stats.total_seconds), THEME.bar),
        stat_line("Avg/day: ", format_duration(stats.average_per_day as u64), THEME.text),
    ];
    if let Some(hour) = stats.most_productive_hour.hour {
        lines.push(stat_line("Peak:    ", format!("{:02}:00", hour), THEME.peak));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Languages",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (lang, seconds) in stats.top_languages().into_iter().take(5) {
        lines.push(stat_line(
            &format!("{:<9}", truncate(lang, 8)),
            format_duration(seconds),
            THEME.text,
        ));
    }

    let info = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(THEME.muted))
            .title(" Summary "),
    );
    frame.render_widget(info, chunks[0]);

    // Selected view against the window's daily average.
    let ratio = if app.average_per_day > 0.0 {
        stats.average_per_day / app.average_per_day
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" vs. Average ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(THEME.muted)),
        )
        .gauge_style(Style::default().fg(if ratio >= 1.0 { THEME.bar } else { THEME.peak }))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{:.0}%", ratio * 100.0));
    frame.render_widget(gauge, chunks[1]);
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(label.to_string(), Style::default().fg(THEME.muted)),
        Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ])
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use codetime_core::{DailyRecord, Delta};

    fn rollup() -> AggregateStats {
        let mut a = DailyRecord::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), Utc::now());
        a.add(&Delta::new(600, "rust", "rs", "main.rs"), 9);
        let mut b = DailyRecord::new(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(), Utc::now());
        b.add(&Delta::new(1200, "go", "go", "main.go"), 15);
        AggregateStats::from_records(vec![a, b])
    }

    #[test]
    fn test_views_rollup_first_then_days() {
        let app = DashboardApp::new(rollup(), 7);
        assert_eq!(app.views.len(), 3);
        assert_eq!(app.views[0].title, "Last 7 day(s)");
        assert_eq!(app.views[0].stats.total_seconds, 1800);
        assert_eq!(app.views[1].title, "Mon 2025-03-10");
        assert_eq!(app.views[2].stats.total_seconds, 1200);
        assert_eq!(app.average_per_day, 900.0);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut app = DashboardApp::new(rollup(), 7);
        app.previous();
        assert_eq!(app.current, 0);
        app.next();
        app.next();
        app.next();
        assert_eq!(app.current, 2);
        assert_eq!(app.current_view().stats.most_productive_hour.hour, Some(15));
    }
}
