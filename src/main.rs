use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph};

use xg_tracker::chart::{BarChart as BarSpec, ChartSpec, ScatterChart, TimelineChart};
use xg_tracker::config::Settings;
use xg_tracker::dashboard::{DashboardState, Report, ViewMode};
use xg_tracker::export;
use xg_tracker::logging;
use xg_tracker::normalize::PlayerRow;
use xg_tracker::xg_fetch::XgScraper;

const LOG_FILE: &str = "xg_tracker.log";

struct App {
    state: DashboardState,
    settings: Settings,
    scraper: XgScraper,
    should_quit: bool,
}

impl App {
    fn new(settings: Settings) -> Self {
        let scraper = XgScraper::from_settings(&settings);
        Self {
            state: DashboardState::new(),
            settings,
            scraper,
            should_quit: false,
        }
    }

    fn load(&mut self, force_refresh: bool) {
        self.state
            .load(&self.scraper, &self.settings.normalize, force_refresh);
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') => self.state.cycle_country(),
            KeyCode::Char('t') => self.state.cycle_team(),
            KeyCode::Char('y') => self.state.cycle_year(),
            KeyCode::Char('m') => self.state.toggle_view(),
            KeyCode::Enter | KeyCode::Char('l') => self.load(false),
            KeyCode::Char('r') => self.load(true),
            KeyCode::Right => self.state.next_chart(),
            KeyCode::Left => self.state.prev_chart(),
            KeyCode::Char('g') => self.focus("xGoal"),
            KeyCode::Char('a') => self.focus("xAssist"),
            KeyCode::Char('s') => self.focus("xG differential"),
            KeyCode::Char('o') => self.focus("Shot quality"),
            KeyCode::Char('x') => self.focus("xG for"),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn focus(&mut self, prefix: &str) {
        if !self.state.focus_chart(prefix) {
            self.state.push_log(format!("[INFO] No \"{prefix}\" chart loaded"));
        }
    }

    fn export(&mut self) {
        let Some(report) = self.state.report.as_ref() else {
            self.state.push_log("[INFO] Nothing to export");
            return;
        };
        let path = PathBuf::from(format!(
            "{}_{}.xlsx",
            self.state.entity(),
            self.state.season()
        ));
        match export::export_report(&path, report) {
            Ok(done) => self.state.push_log(format!(
                "[INFO] Exported {} rows to {}",
                done.rows,
                path.display()
            )),
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }
}

fn main() -> io::Result<()> {
    let settings = Settings::from_env();
    logging::init_file(&settings.cache_dir.join(LOG_FILE));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(settings);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.current_chart() {
        Some(ChartSpec::Scatter(chart)) => render_scatter(frame, chunks[1], chart),
        Some(ChartSpec::Timeline(chart)) => render_timeline(frame, chunks[1], chart),
        Some(ChartSpec::Bar(chart)) => render_bars(frame, chunks[1], chart),
        None => {
            let empty = Paragraph::new("Press Enter to load the current selection")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(empty, chunks[1]);
        }
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(
        "c Country | t Team | y Year | m Mode | Enter Load | r Refresh | ←/→ Chart | e Export | ? Help | q Quit",
    );
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, area);
    }
}

fn header_text(state: &DashboardState) -> String {
    let mode = match state.view {
        ViewMode::Team => format!("Team: {}", state.team_name()),
        ViewMode::League => format!("League: {}", state.country().league),
    };
    let charts = state
        .report
        .as_ref()
        .map(|r| format!(" | Chart {}/{}", state.chart_index + 1, r.charts().len()))
        .unwrap_or_default();
    let performers = match &state.report {
        Some(Report::Team(team)) => team
            .performers
            .as_ref()
            .map(|p| {
                format!(
                    "\nClinical: {} | Wasteful: {}",
                    performer_names(&p.over),
                    performer_names(&p.under)
                )
            })
            .unwrap_or_default(),
        _ => String::new(),
    };
    format!(
        "XG TRACKER | {} | {mode} | Season {}-{}{charts}{performers}",
        state.country().name,
        state.season(),
        state.season() + 1
    )
}

fn performer_names(rows: &[PlayerRow]) -> String {
    rows.iter()
        .map(|r| format!("{} {:+.2}", r.player, r.diff_xg))
        .collect::<Vec<_>>()
        .join(", ")
}

fn hex_color(hex: &str) -> Color {
    let raw = hex.trim_start_matches('#');
    if raw.len() == 6 {
        if let Ok(v) = u32::from_str_radix(raw, 16) {
            return Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8);
        }
    }
    match hex {
        "green" => Color::Green,
        "red" => Color::Red,
        "black" => Color::White,
        _ => Color::Gray,
    }
}

/// Groups points by color since each ratatui dataset has one style.
fn points_by_color(points: &[xg_tracker::chart::ScatterPoint]) -> Vec<(&'static str, Vec<(f64, f64)>)> {
    let mut groups: Vec<(&'static str, Vec<(f64, f64)>)> = Vec::new();
    for p in points {
        match groups.iter_mut().find(|(c, _)| *c == p.color) {
            Some((_, data)) => data.push((p.x, p.y)),
            None => groups.push((p.color, vec![(p.x, p.y)])),
        }
    }
    groups
}

fn axis_labels(lo: f64, hi: f64) -> Vec<Span<'static>> {
    let mid = (lo + hi) / 2.0;
    vec![
        Span::raw(format!("{lo:.1}")),
        Span::raw(format!("{mid:.1}")),
        Span::raw(format!("{hi:.1}")),
    ]
}

fn render_scatter(frame: &mut Frame, area: Rect, chart: &ScatterChart) {
    let (x_lo, x_hi) = chart.x_range;
    let line_data: Vec<Vec<(f64, f64)>> = chart
        .reference_lines
        .iter()
        .map(|line| vec![(0.0, 0.0), (x_hi, x_hi * line.slope)])
        .collect();
    let groups = points_by_color(&chart.points);

    let mut datasets = Vec::new();
    for (line, data) in chart.reference_lines.iter().zip(&line_data) {
        datasets.push(
            Dataset::default()
                .name(line.label.clone().unwrap_or_default())
                .marker(if line.dashed { symbols::Marker::Dot } else { symbols::Marker::Braille })
                .graph_type(GraphType::Line)
                .style(Style::default().fg(hex_color(line.color)))
                .data(data),
        );
    }
    for (color, data) in &groups {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(hex_color(color)))
                .data(data),
        );
    }

    let (y_lo, y_hi) = chart.y_range;
    let widget = Chart::new(datasets)
        .block(Block::default().title(chart.title.clone()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(chart.x_label.clone())
                .bounds([x_lo, x_hi])
                .labels(axis_labels(x_lo, x_hi)),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label.clone())
                .bounds([y_lo, y_hi])
                .labels(axis_labels(y_lo, y_hi)),
        );
    frame.render_widget(widget, area);
}

fn render_timeline(frame: &mut Frame, area: Rect, chart: &TimelineChart) {
    let groups = points_by_color(&chart.points);
    let x_hi = chart
        .points
        .iter()
        .map(|p| p.x)
        .fold(1.0_f64, f64::max);

    let mut datasets = Vec::new();
    for line in &chart.lines {
        datasets.push(
            Dataset::default()
                .name(line.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(hex_color(line.color)))
                .data(&line.points),
        );
    }
    for (color, data) in &groups {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(hex_color(color)))
                .data(data),
        );
    }

    let (y_lo, y_hi) = chart.y_range;
    let widget = Chart::new(datasets)
        .block(Block::default().title(chart.title.clone()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(chart.x_label.clone())
                .bounds([0.0, x_hi + 1.0])
                .labels(axis_labels(0.0, x_hi + 1.0)),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label.clone())
                .bounds([y_lo, y_hi])
                .labels(axis_labels(y_lo, y_hi)),
        );
    frame.render_widget(widget, area);
}

/// Text bars; ratatui's BarChart has no negative values.
fn render_bars(frame: &mut Frame, area: Rect, chart: &BarSpec) {
    let block = Block::default().title(chart.title.clone()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width < 30 || inner.height == 0 {
        return;
    }

    let label_width = chart
        .bars
        .iter()
        .map(|b| bar_label(b).chars().count())
        .max()
        .unwrap_or(0)
        .min(28);
    let bar_room = (inner.width as usize).saturating_sub(label_width + 10);
    let (lo, hi) = chart.value_range;
    let scale = hi.abs().max(lo.abs()).max(f64::EPSILON);
    let half = bar_room / 2;
    let diverging = lo < 0.0;

    let lines: Vec<Line> = chart
        .bars
        .iter()
        .map(|bar| {
            let label = format!("{:<label_width$}", bar_label(bar));
            let room = if diverging { half } else { bar_room };
            let len = ((bar.value.abs() / scale) * room as f64).round() as usize;
            let style = Style::default().fg(hex_color(bar.color));
            let blocks = "█".repeat(len);
            let mut spans = vec![Span::raw(label), Span::raw(" ")];
            if diverging {
                let pad = if bar.value < 0.0 { half - len.min(half) } else { half };
                spans.push(Span::raw(" ".repeat(pad)));
                spans.push(Span::styled(blocks, style));
            } else {
                spans.push(Span::styled(blocks, style));
            }
            spans.push(Span::styled(
                format!(" {:+.2}", bar.value),
                Style::default().add_modifier(Modifier::DIM),
            ));
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn bar_label(bar: &xg_tracker::chart::Bar) -> String {
    match &bar.group {
        Some(group) => format!("{} {group}", bar.category),
        None => bar.category.clone(),
    }
}

fn console_text(state: &DashboardState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "xG Tracker - Help",
        "",
        "Selection:",
        "  c            Cycle country",
        "  t            Cycle team",
        "  y            Cycle season",
        "  m            Team / league mode",
        "  Enter / l    Load (cache first)",
        "  r            Force refresh from site",
        "",
        "Charts:",
        "  ← / →        Previous / next chart",
        "  g / a        Goals / assists",
        "  s / o        Situations / shot quality",
        "  x            Matches timeline",
        "  e            Export tables to xlsx",
        "",
        "  ?            Toggle help",
        "  q / Esc      Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
