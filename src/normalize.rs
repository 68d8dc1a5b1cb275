use serde::Serialize;

use crate::error::{ParseError, XgError};
use crate::html_table::{parse_first_table, Cells, RawTable, INDEX_COLUMN};
use crate::metric::MetricMode;

pub const DEFAULT_SIGNIFICANCE: f64 = 0.5;
pub const DEFAULT_ROLLING_WINDOW: usize = 6;
pub const DEFAULT_ROLLING_MIN_PERIODS: usize = 2;
pub const DEFAULT_ROSTER_LIMIT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub significance_threshold: f64,
    pub rolling_window: usize,
    pub rolling_min_periods: usize,
    pub roster_limit: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            significance_threshold: DEFAULT_SIGNIFICANCE,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            rolling_min_periods: DEFAULT_ROLLING_MIN_PERIODS,
            roster_limit: DEFAULT_ROSTER_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRow {
    pub player: String,
    pub position: String,
    pub apps: f64,
    pub minutes: f64,
    pub goals: f64,
    pub assists: f64,
    pub shots_per90: f64,
    pub key_passes_per90: f64,
    pub xg: f64,
    pub xa: f64,
    pub xg_per90: f64,
    pub xa_per90: f64,
    pub diff_xg: f64,
    pub diff_xa: f64,
}

impl PlayerRow {
    pub fn actual(&self, mode: MetricMode) -> Option<f64> {
        match mode {
            MetricMode::G => Some(self.goals),
            MetricMode::A => Some(self.assists),
            _ => None,
        }
    }

    pub fn expected(&self, mode: MetricMode) -> Option<f64> {
        match mode {
            MetricMode::G => Some(self.xg),
            MetricMode::A => Some(self.xa),
            _ => None,
        }
    }

    pub fn diff(&self, mode: MetricMode) -> Option<f64> {
        match mode {
            MetricMode::G => Some(self.diff_xg),
            MetricMode::A => Some(self.diff_xa),
            _ => None,
        }
    }
}

struct RosterColumns {
    player: usize,
    position: usize,
    apps: usize,
    minutes: usize,
    goals: usize,
    assists: usize,
    shots_per90: usize,
    key_passes_per90: usize,
    xg: usize,
    xa: usize,
    xg_per90: usize,
    xa_per90: usize,
}

impl RosterColumns {
    fn resolve(table: &RawTable) -> Result<Self, ParseError> {
        Ok(Self {
            player: table.column("Player")?,
            position: table.column("Pos")?,
            apps: table.column("Apps")?,
            minutes: table.column("Min")?,
            goals: table.column("G")?,
            assists: table.column("A")?,
            shots_per90: table.column("Sh90")?,
            key_passes_per90: table.column("KP90")?,
            xg: table.column("xG")?,
            xa: table.column("xA")?,
            xg_per90: table.column("xG90")?,
            xa_per90: table.column("xA90")?,
        })
    }
}

/// Team roster in source order, truncated to `roster_limit` before filtering.
/// A row survives when xG or the expected value of `metric` clears the
/// significance threshold. Rosters only know goals and assists.
pub fn parse_roster(
    fragment: &str,
    metric: MetricMode,
    opts: &NormalizeOptions,
) -> Result<Vec<PlayerRow>, XgError> {
    let metric = metric.require(&[MetricMode::G, MetricMode::A], "roster")?;
    let mut table = parse_first_table(fragment)?;
    table.drop_column(INDEX_COLUMN);
    table.truncate(opts.roster_limit);
    let cols = RosterColumns::resolve(&table)?;

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let cells = Cells::new(&table, row);
        let goals = cells.plain(cols.goals)?;
        let assists = cells.plain(cols.assists)?;
        let xg = cells.expected(cols.xg)?;
        let xa = cells.expected(cols.xa)?;
        let parsed = PlayerRow {
            player: cells.text(cols.player),
            position: cells.text(cols.position),
            apps: cells.plain(cols.apps)?,
            minutes: cells.plain(cols.minutes)?,
            goals,
            assists,
            shots_per90: cells.plain(cols.shots_per90)?,
            key_passes_per90: cells.plain(cols.key_passes_per90)?,
            xg,
            xa,
            xg_per90: cells.plain(cols.xg_per90)?,
            xa_per90: cells.plain(cols.xa_per90)?,
            diff_xg: goals - xg,
            diff_xa: assists - xa,
        };
        let second = parsed.expected(metric).unwrap_or(parsed.xa);
        if is_significant(&[parsed.xg, second], opts.significance_threshold) {
            out.push(parsed);
        }
    }
    Ok(out)
}

/// One row of the team situation table (open play, set piece, penalty, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStatRow {
    pub situation: String,
    pub shots: f64,
    pub goals: f64,
    pub shots_against: f64,
    pub goals_against: f64,
    pub xg: f64,
    pub xga: f64,
    pub xg_per_shot: f64,
    pub xga_per_shot: f64,
    pub diff_xg: f64,
    pub diff_xga: f64,
}

struct TeamStatColumns {
    situation: usize,
    shots: usize,
    goals: usize,
    shots_against: usize,
    goals_against: usize,
    xg: usize,
    xga: usize,
    xg_per_shot: usize,
    xga_per_shot: usize,
}

impl TeamStatColumns {
    fn resolve(table: &RawTable) -> Result<Self, ParseError> {
        Ok(Self {
            situation: table.column("Situation")?,
            shots: table.column("Sh")?,
            goals: table.column("G")?,
            shots_against: table.column("ShA")?,
            goals_against: table.column("GA")?,
            xg: table.column("xG")?,
            xga: table.column("xGA")?,
            xg_per_shot: table.column("xG/Sh")?,
            xga_per_shot: table.column("xGA/Sh")?,
        })
    }
}

pub fn parse_team_stats(
    fragment: &str,
    opts: &NormalizeOptions,
) -> Result<Vec<TeamStatRow>, ParseError> {
    let mut table = parse_first_table(fragment)?;
    table.drop_column(INDEX_COLUMN);
    table.truncate(opts.roster_limit);
    let cols = TeamStatColumns::resolve(&table)?;

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let cells = Cells::new(&table, row);
        let goals = cells.plain(cols.goals)?;
        let goals_against = cells.plain(cols.goals_against)?;
        let xg = cells.expected(cols.xg)?;
        let xga = cells.expected(cols.xga)?;
        if !is_significant(&[xg, xga], opts.significance_threshold) {
            continue;
        }
        out.push(TeamStatRow {
            situation: cells.text(cols.situation),
            shots: cells.plain(cols.shots)?,
            goals,
            shots_against: cells.plain(cols.shots_against)?,
            goals_against,
            xg,
            xga,
            xg_per_shot: cells.plain(cols.xg_per_shot)?,
            xga_per_shot: cells.plain(cols.xga_per_shot)?,
            diff_xg: goals - xg,
            diff_xga: goals_against - xga,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueRow {
    pub team: String,
    pub matches: f64,
    pub wins: f64,
    pub draws: f64,
    pub losses: f64,
    pub goals: f64,
    pub goals_against: f64,
    pub points: f64,
    pub xg: f64,
    pub xga: f64,
    pub xpts: f64,
    pub diff_xg: f64,
    pub diff_xga: f64,
    pub diff_xpts: f64,
    /// 1 = most points.
    pub rank_points: usize,
    /// 1 = most expected points.
    pub rank_xpts: usize,
}

impl LeagueRow {
    pub fn actual(&self, mode: MetricMode) -> Option<f64> {
        match mode {
            MetricMode::G => Some(self.goals),
            MetricMode::GA => Some(self.goals_against),
            MetricMode::PTS => Some(self.points),
            MetricMode::A => None,
        }
    }

    pub fn expected(&self, mode: MetricMode) -> Option<f64> {
        match mode {
            MetricMode::G => Some(self.xg),
            MetricMode::GA => Some(self.xga),
            MetricMode::PTS => Some(self.xpts),
            MetricMode::A => None,
        }
    }

    pub fn diff(&self, mode: MetricMode) -> Option<f64> {
        match mode {
            MetricMode::G => Some(self.diff_xg),
            MetricMode::GA => Some(self.diff_xga),
            MetricMode::PTS => Some(self.diff_xpts),
            MetricMode::A => None,
        }
    }
}

struct LeagueColumns {
    team: usize,
    matches: usize,
    wins: usize,
    draws: usize,
    losses: usize,
    goals: usize,
    goals_against: usize,
    points: usize,
    xg: usize,
    xga: usize,
    xpts: usize,
}

impl LeagueColumns {
    fn resolve(table: &RawTable) -> Result<Self, ParseError> {
        Ok(Self {
            team: table.column("Team")?,
            matches: table.column("M")?,
            wins: table.column("W")?,
            draws: table.column("D")?,
            losses: table.column("L")?,
            goals: table.column("G")?,
            goals_against: table.column("GA")?,
            points: table.column("PTS")?,
            xg: table.column("xG")?,
            xga: table.column("xGA")?,
            xpts: table.column("xPTS")?,
        })
    }
}

/// Full standings; no significance filter and no truncation.
pub fn parse_league(fragment: &str) -> Result<Vec<LeagueRow>, ParseError> {
    let mut table = parse_first_table(fragment)?;
    table.drop_column(INDEX_COLUMN);
    let cols = LeagueColumns::resolve(&table)?;

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let cells = Cells::new(&table, row);
        let goals = cells.plain(cols.goals)?;
        let goals_against = cells.plain(cols.goals_against)?;
        let points = cells.plain(cols.points)?;
        let xg = cells.expected(cols.xg)?;
        let xga = cells.expected(cols.xga)?;
        let xpts = cells.expected(cols.xpts)?;
        out.push(LeagueRow {
            team: cells.text(cols.team),
            matches: cells.plain(cols.matches)?,
            wins: cells.plain(cols.wins)?,
            draws: cells.plain(cols.draws)?,
            losses: cells.plain(cols.losses)?,
            goals,
            goals_against,
            points,
            xg,
            xga,
            xpts,
            diff_xg: goals - xg,
            diff_xga: goals_against - xga,
            diff_xpts: points - xpts,
            rank_points: 0,
            rank_xpts: 0,
        });
    }

    let by_points = rank_desc(&out.iter().map(|r| r.points).collect::<Vec<_>>());
    let by_xpts = rank_desc(&out.iter().map(|r| r.xpts).collect::<Vec<_>>());
    for ((row, rp), rx) in out.iter_mut().zip(by_points).zip(by_xpts) {
        row.rank_points = rp;
        row.rank_xpts = rx;
    }
    Ok(out)
}

/// Ordinal 1-based ranks, highest value first. Equal values keep source order,
/// so the result is always a permutation of 1..=N.
pub fn rank_desc(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    let mut ranks = vec![0; values.len()];
    for (pos, idx) in order.into_iter().enumerate() {
        ranks[idx] = pos + 1;
    }
    ranks
}

fn is_significant(expected: &[f64], threshold: f64) -> bool {
    expected.iter().any(|v| *v > threshold)
}

/// Best and worst finishers relative to xG.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performers {
    pub over: Vec<PlayerRow>,
    pub under: Vec<PlayerRow>,
}

pub fn finishing_performers(rows: &[PlayerRow], n: usize) -> Performers {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.diff_xg.total_cmp(&a.diff_xg));
    let over = sorted.iter().take(n).cloned().collect();
    sorted.sort_by(|a, b| a.diff_xg.total_cmp(&b.diff_xg));
    let under = sorted.into_iter().take(n).collect();
    Performers { over, under }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_desc_breaks_ties_by_source_order() {
        assert_eq!(rank_desc(&[10.0, 30.0, 20.0]), vec![3, 1, 2]);
        assert_eq!(rank_desc(&[5.0, 7.0, 5.0, 7.0]), vec![3, 1, 4, 2]);
        assert!(rank_desc(&[]).is_empty());
    }

    #[test]
    fn significance_is_strictly_greater() {
        assert!(!is_significant(&[0.5, 0.5], 0.5));
        assert!(is_significant(&[0.2, 0.51], 0.5));
    }
}
