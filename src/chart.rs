use serde::Serialize;

use crate::error::UnsupportedModeError;
use crate::match_calendar::{MatchResult, MatchRow};
use crate::metric::MetricMode;
use crate::normalize::{LeagueRow, PlayerRow, TeamStatRow};

/// ColorBrewer RdYlGn, red (low) to green (high).
pub const RD_YL_GN_9: [&str; 9] = [
    "#d73027", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#d9ef8b", "#a6d96a", "#66bd63",
    "#1a9850",
];
pub const RD_YL_GN_11: [&str; 11] = [
    "#a50026", "#d73027", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#d9ef8b", "#a6d96a",
    "#66bd63", "#1a9850", "#006837",
];
const RESULT_COLORS: [(MatchResult, &str); 3] = [
    (MatchResult::Win, "#91cf60"),
    (MatchResult::Draw, "#ffffbf"),
    (MatchResult::Loss, "#fc8d59"),
];

pub const PLAYER_AXIS_OFFSET: f64 = 2.0;
pub const LEAGUE_AXIS_OFFSET: f64 = 5.0;
pub const PLAYER_MIN_AMPLITUDE: f64 = 2.0;
pub const LEAGUE_MIN_AMPLITUDE: f64 = 2.0;
pub const SITUATION_MIN_AMPLITUDE: f64 = 4.5;
pub const SHOT_QUALITY_HIGH: f64 = 0.2;
const PENALTY_SITUATION: &str = "Penalty";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub palette: Vec<&'static str>,
    pub low: f64,
    pub high: f64,
}

impl ColorScale {
    /// Symmetric around zero, never narrower than `min_amplitude`.
    pub fn diverging(diffs: impl IntoIterator<Item = f64>, min_amplitude: f64, palette: &[&'static str]) -> Self {
        let amplitude = diffs
            .into_iter()
            .map(f64::abs)
            .fold(0.0_f64, f64::max)
            .max(min_amplitude);
        Self {
            palette: palette.to_vec(),
            low: -amplitude,
            high: amplitude,
        }
    }

    pub fn sequential(low: f64, high: f64, palette: &[&'static str]) -> Self {
        Self {
            palette: palette.to_vec(),
            low,
            high,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.palette.reverse();
        self
    }

    pub fn amplitude(&self) -> f64 {
        (self.high - self.low) / 2.0
    }

    /// Linear bucket lookup; values outside the range take the end colors.
    pub fn color_for(&self, value: f64) -> &'static str {
        let n = self.palette.len();
        if n == 0 {
            return "#000000";
        }
        let span = self.high - self.low;
        if !(span > 0.0) || !value.is_finite() {
            return self.palette[n / 2];
        }
        let t = ((value - self.low) / span).clamp(0.0, 1.0);
        let idx = ((t * n as f64) as usize).min(n - 1);
        self.palette[idx]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub label: String,
    pub value: String,
}

fn tip(label: impl Into<String>, value: impl Into<String>) -> Tooltip {
    Tooltip {
        label: label.into(),
        value: value.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub color_value: f64,
    pub color: &'static str,
    pub tooltip: Vec<Tooltip>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: Option<String>,
    pub slope: f64,
    pub color: &'static str,
    pub dashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub color_scale: ColorScale,
    pub points: Vec<ScatterPoint>,
    pub reference_lines: Vec<ReferenceLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub category: String,
    pub group: Option<String>,
    pub value: f64,
    pub color: &'static str,
    pub tooltip: Vec<Tooltip>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub orientation: Orientation,
    pub value_range: (f64, f64),
    pub color_scale: ColorScale,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub color: &'static str,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_range: (f64, f64),
    pub points: Vec<ScatterPoint>,
    pub lines: Vec<LineSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Scatter(ScatterChart),
    Bar(BarChart),
    Timeline(TimelineChart),
}

impl ChartSpec {
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Scatter(c) => &c.title,
            ChartSpec::Bar(c) => &c.title,
            ChartSpec::Timeline(c) => &c.title,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn season_label(year: i32) -> String {
    format!("{year}-{}", year + 1)
}

fn max_of(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(f64::INFINITY, f64::min)
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

/// Expected vs actual per player, colored by the differential.
pub fn player_chart(
    rows: &[PlayerRow],
    team_name: &str,
    year: i32,
    mode: MetricMode,
) -> Result<ScatterChart, UnsupportedModeError> {
    let mode = mode.require(&[MetricMode::G, MetricMode::A], "player")?;
    let triples: Vec<(&PlayerRow, f64, f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r, r.expected(mode)?, r.actual(mode)?, r.diff(mode)?)))
        .collect();

    let plot_max = finite_or(
        max_of(triples.iter().flat_map(|(_, x, y, _)| [*x, *y])),
        0.0,
    ) + PLAYER_AXIS_OFFSET;
    let color_scale =
        ColorScale::diverging(triples.iter().map(|t| t.3), PLAYER_MIN_AMPLITUDE, &RD_YL_GN_9);

    let expected_col = mode.expected_column();
    let actual_col = mode.actual_column();
    let points = triples
        .iter()
        .map(|(row, x, y, diff)| ScatterPoint {
            label: row.player.clone(),
            x: *x,
            y: *y,
            color_value: *diff,
            color: color_scale.color_for(*diff),
            tooltip: vec![
                tip("", row.player.clone()),
                tip(expected_col, format!("{x:.2}")),
                tip(actual_col, format!("{y:.2}")),
                tip(format!("Diff. {expected_col} vs {actual_col}"), format!("{diff:.2}")),
            ],
        })
        .collect();

    let full = mode.full_name();
    Ok(ScatterChart {
        title: format!("x{full} vs. actual {full} for {team_name}, season {}", season_label(year)),
        x_label: format!("x{full}"),
        y_label: full.to_string(),
        x_range: (-0.5, plot_max),
        y_range: (-0.5, plot_max),
        color_scale,
        points,
        reference_lines: player_reference_lines(),
    })
}

fn player_reference_lines() -> Vec<ReferenceLine> {
    vec![
        ReferenceLine {
            label: Some("Normal performance".to_string()),
            slope: 1.0,
            color: "black",
            dashed: false,
        },
        ReferenceLine {
            label: Some("20% over".to_string()),
            slope: 1.2,
            color: "green",
            dashed: true,
        },
        ReferenceLine {
            label: Some("20% under".to_string()),
            slope: 0.8,
            color: "red",
            dashed: true,
        },
        ReferenceLine {
            label: None,
            slope: 1.4,
            color: "green",
            dashed: true,
        },
        ReferenceLine {
            label: None,
            slope: 0.6,
            color: "red",
            dashed: true,
        },
    ]
}

/// Expected vs actual per team in a league table.
pub fn league_chart(
    rows: &[LeagueRow],
    league_name: &str,
    year: i32,
    mode: MetricMode,
) -> Result<ScatterChart, UnsupportedModeError> {
    let mode = mode.require(&[MetricMode::G, MetricMode::GA, MetricMode::PTS], "league")?;
    let triples: Vec<(&LeagueRow, f64, f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r, r.expected(mode)?, r.actual(mode)?, r.diff(mode)?)))
        .collect();

    let values = || triples.iter().flat_map(|(_, x, y, _)| [*x, *y]);
    let plot_max = finite_or(max_of(values()), 0.0) + LEAGUE_AXIS_OFFSET;
    let plot_min = finite_or(min_of(values()), 0.0) - LEAGUE_AXIS_OFFSET;

    let mut color_scale =
        ColorScale::diverging(triples.iter().map(|t| t.3), LEAGUE_MIN_AMPLITUDE, &RD_YL_GN_9);
    if mode.lower_is_better() {
        color_scale = color_scale.reversed();
    }

    let expected_col = mode.expected_column();
    let actual_col = mode.actual_column();
    let points = triples
        .iter()
        .map(|(row, x, y, diff)| ScatterPoint {
            label: row.team.clone(),
            x: *x,
            y: *y,
            color_value: *diff,
            color: color_scale.color_for(*diff),
            tooltip: vec![
                tip("", row.team.clone()),
                tip(expected_col, format!("{x:.2}")),
                tip(actual_col, format!("{y:.2}")),
                tip(format!("Diff. {expected_col} vs {actual_col}"), format!("{diff:.2}")),
                tip("Rank", row.rank_points.to_string()),
                tip("Expected rank", row.rank_xpts.to_string()),
            ],
        })
        .collect();

    let full = mode.full_name();
    Ok(ScatterChart {
        title: format!("x{full} vs. actual {full} for {league_name}, season {}", season_label(year)),
        x_label: format!("x{full}"),
        y_label: full.to_string(),
        x_range: (plot_min, plot_max),
        y_range: (plot_min, plot_max),
        color_scale,
        points,
        reference_lines: vec![ReferenceLine {
            label: Some("Normal performance".to_string()),
            slope: 1.0,
            color: "black",
            dashed: false,
        }],
    })
}

/// Horizontal xG differential bar per game situation.
pub fn situation_chart(rows: &[TeamStatRow], team_name: &str, year: i32) -> BarChart {
    let widest = max_of(rows.iter().map(|r| r.diff_xg.abs()));
    let amplitude = (finite_or(widest, 0.0) + 1.0).max(SITUATION_MIN_AMPLITUDE);
    let color_scale = ColorScale::sequential(-amplitude, amplitude, &RD_YL_GN_11);

    let bars = rows
        .iter()
        .map(|r| Bar {
            category: r.situation.clone(),
            group: None,
            value: r.diff_xg,
            color: color_scale.color_for(r.diff_xg),
            tooltip: vec![
                tip("Situation", r.situation.clone()),
                tip("diff xG", format!("{:.2}", r.diff_xg)),
            ],
        })
        .collect();

    BarChart {
        title: format!("xG differential for {team_name}, season {}", season_label(year)),
        orientation: Orientation::Horizontal,
        value_range: (-amplitude, amplitude),
        color_scale,
        bars,
    }
}

/// Shot quality for and against per situation. Penalties are left out since
/// every penalty carries the same xG.
pub fn shot_quality_chart(rows: &[TeamStatRow], team_name: &str, year: i32) -> BarChart {
    let color_scale = ColorScale::sequential(0.0, SHOT_QUALITY_HIGH, &RD_YL_GN_11);
    let mut bars = Vec::new();
    for r in rows.iter().filter(|r| r.situation != PENALTY_SITUATION) {
        for (group, value) in [("xG/Sh", r.xg_per_shot), ("xGA/Sh", r.xga_per_shot)] {
            bars.push(Bar {
                category: r.situation.clone(),
                group: Some(group.to_string()),
                value,
                color: color_scale.color_for(value),
                tooltip: vec![tip(format!("{} / {group}", r.situation), format!("{value:.2}"))],
            });
        }
    }
    let top = finite_or(max_of(bars.iter().map(|b| b.value)), 0.0).max(SHOT_QUALITY_HIGH);

    BarChart {
        title: format!(
            "Shot quality for (xG) and against (xGA) by situation for {team_name}, season {}",
            season_label(year)
        ),
        orientation: Orientation::Vertical,
        value_range: (0.0, top),
        color_scale,
        bars,
    }
}

/// Team xG per matchday colored by result, with optional rolling lines.
pub fn match_timeline(
    rows: &[MatchRow],
    team_name: &str,
    year: i32,
    rolling_xg: bool,
    rolling_xga: bool,
) -> TimelineChart {
    let top = finite_or(max_of(rows.iter().map(|r| r.team_xg)), 0.0) + 0.5;

    let points = rows
        .iter()
        .map(|r| ScatterPoint {
            label: r.opponent.clone(),
            x: r.matchday as f64,
            y: r.team_xg,
            color_value: r.team_xg,
            color: result_color(r.result),
            tooltip: vec![
                tip("Date", r.date.clone()),
                tip("xG", format!("{:.2}", r.team_xg)),
                tip("xG against", format!("{:.2}", r.opponent_xg)),
                tip("Opponent", r.opponent.clone()),
                tip("Venue", r.side.label()),
                tip("Result", r.result.label()),
            ],
        })
        .collect();

    let mut lines = Vec::new();
    if rolling_xg {
        lines.push(LineSeries {
            name: "Rolling mean of xG for".to_string(),
            color: "green",
            points: rows
                .iter()
                .filter_map(|r| Some((r.matchday as f64, r.rolling_team_xg?)))
                .collect(),
        });
    }
    if rolling_xga {
        lines.push(LineSeries {
            name: "Rolling mean of xG against".to_string(),
            color: "red",
            points: rows
                .iter()
                .filter_map(|r| Some((r.matchday as f64, r.rolling_opponent_xg?)))
                .collect(),
        });
    }

    TimelineChart {
        title: format!("xG for {team_name}, season {}", season_label(year)),
        x_label: "Matchday".to_string(),
        y_label: "xGoals per match".to_string(),
        y_range: (0.0, top),
        points,
        lines,
    }
}

fn result_color(result: MatchResult) -> &'static str {
    RESULT_COLORS
        .iter()
        .find(|(r, _)| *r == result)
        .map(|(_, c)| *c)
        .unwrap_or("#888888")
}
