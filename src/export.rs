use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::dashboard::{LeagueReport, Report, TeamReport};
use crate::match_calendar::MatchRow;
use crate::normalize::{LeagueRow, PlayerRow, TeamStatRow};

pub struct ExportReport {
    pub sheets: Vec<&'static str>,
    pub rows: usize,
}

pub fn export_report(path: &Path, report: &Report) -> Result<ExportReport> {
    match report {
        Report::Team(team) => export_team(path, team),
        Report::League(league) => export_league(path, league),
    }
}

pub fn export_team(path: &Path, report: &TeamReport) -> Result<ExportReport> {
    let mut sheets: Vec<(&'static str, Vec<Vec<String>>)> = Vec::new();

    let mut players = vec![player_header()];
    players.extend(report.players.iter().map(player_row));
    sheets.push(("Players", players));

    if let Some(performers) = &report.performers {
        let mut over = vec![player_header()];
        over.extend(performers.over.iter().map(player_row));
        sheets.push(("Overperformers", over));

        let mut under = vec![player_header()];
        under.extend(performers.under.iter().map(player_row));
        sheets.push(("Underperformers", under));
    }

    let mut stats = vec![situation_header()];
    stats.extend(report.stats.iter().map(situation_row));
    sheets.push(("Situations", stats));

    let mut matches = vec![match_header()];
    matches.extend(report.matches.iter().map(match_row));
    sheets.push(("Matches", matches));

    write_workbook(path, &sheets)
}

pub fn export_league(path: &Path, report: &LeagueReport) -> Result<ExportReport> {
    let mut rows = vec![league_header()];
    rows.extend(report.rows.iter().map(league_row));
    write_workbook(path, &[("League", rows)])
}

fn write_workbook(path: &Path, sheets: &[(&'static str, Vec<Vec<String>>)]) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        sheets: sheets.iter().map(|(name, _)| *name).collect(),
        rows: sheets
            .iter()
            .map(|(_, rows)| rows.len().saturating_sub(1))
            .sum(),
    })
}

fn player_header() -> Vec<String> {
    [
        "Player", "Pos", "Apps", "Min", "G", "A", "xG", "xA", "xG90", "xA90", "diff_xG",
        "diff_xA",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn player_row(row: &PlayerRow) -> Vec<String> {
    vec![
        row.player.clone(),
        row.position.clone(),
        format!("{:.0}", row.apps),
        format!("{:.0}", row.minutes),
        format!("{:.0}", row.goals),
        format!("{:.0}", row.assists),
        format!("{:.2}", row.xg),
        format!("{:.2}", row.xa),
        format!("{:.2}", row.xg_per90),
        format!("{:.2}", row.xa_per90),
        format!("{:.2}", row.diff_xg),
        format!("{:.2}", row.diff_xa),
    ]
}

fn situation_header() -> Vec<String> {
    ["Situation", "Sh", "G", "ShA", "GA", "xG", "xGA", "xG/Sh", "xGA/Sh", "diff_xG", "diff_xGA"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn situation_row(row: &TeamStatRow) -> Vec<String> {
    vec![
        row.situation.clone(),
        format!("{:.0}", row.shots),
        format!("{:.0}", row.goals),
        format!("{:.0}", row.shots_against),
        format!("{:.0}", row.goals_against),
        format!("{:.2}", row.xg),
        format!("{:.2}", row.xga),
        format!("{:.2}", row.xg_per_shot),
        format!("{:.2}", row.xga_per_shot),
        format!("{:.2}", row.diff_xg),
        format!("{:.2}", row.diff_xga),
    ]
}

fn match_header() -> Vec<String> {
    [
        "Matchday", "Date", "Opponent", "Venue", "Result", "xG", "xG against", "Rolling xG",
        "Rolling xG against",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn match_row(row: &MatchRow) -> Vec<String> {
    vec![
        row.matchday.to_string(),
        row.date.clone(),
        row.opponent.clone(),
        row.side.label().to_string(),
        row.result.label().to_string(),
        format!("{:.2}", row.team_xg),
        format!("{:.2}", row.opponent_xg),
        opt_to_string(row.rolling_team_xg),
        opt_to_string(row.rolling_opponent_xg),
    ]
}

fn league_header() -> Vec<String> {
    [
        "Rank", "xRank", "Team", "M", "W", "D", "L", "G", "GA", "PTS", "xG", "xGA", "xPTS",
        "diff_xG", "diff_xGA", "diff_xPTS",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn league_row(row: &LeagueRow) -> Vec<String> {
    vec![
        row.rank_points.to_string(),
        row.rank_xpts.to_string(),
        row.team.clone(),
        format!("{:.0}", row.matches),
        format!("{:.0}", row.wins),
        format!("{:.0}", row.draws),
        format!("{:.0}", row.losses),
        format!("{:.0}", row.goals),
        format!("{:.0}", row.goals_against),
        format!("{:.0}", row.points),
        format!("{:.2}", row.xg),
        format!("{:.2}", row.xga),
        format!("{:.2}", row.xpts),
        format!("{:.2}", row.diff_xg),
        format!("{:.2}", row.diff_xga),
        format!("{:.2}", row.diff_xpts),
    ]
}

fn opt_to_string(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
