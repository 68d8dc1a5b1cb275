use std::collections::VecDeque;

use tracing::info;

use crate::browser::PageLoader;
use crate::cache_store::StatKind;
use crate::chart::{self, ChartSpec};
use crate::config::{Country, COUNTRIES, SEASONS};
use crate::error::XgError;
use crate::match_calendar::{parse_matches, MatchRow};
use crate::metric::MetricMode;
use crate::normalize::{
    finishing_performers, parse_league, parse_roster, parse_team_stats, LeagueRow,
    NormalizeOptions, Performers, PlayerRow, TeamStatRow,
};
use crate::xg_fetch::XgScraper;

const MAX_LOGS: usize = 50;
const PERFORMERS_SHOWN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Team,
    League,
}

/// Which sections a team analysis builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub goals: bool,
    pub assists: bool,
    pub performers: bool,
    pub situations: bool,
    pub shot_quality: bool,
    pub matches: bool,
    pub rolling_xg: bool,
    pub rolling_xga: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            goals: true,
            assists: true,
            performers: true,
            situations: true,
            shot_quality: true,
            matches: true,
            rolling_xg: true,
            rolling_xga: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TeamReport {
    pub team: String,
    pub year: i32,
    pub players: Vec<PlayerRow>,
    pub stats: Vec<TeamStatRow>,
    pub matches: Vec<MatchRow>,
    pub performers: Option<Performers>,
    pub charts: Vec<ChartSpec>,
}

#[derive(Debug, Clone)]
pub struct LeagueReport {
    pub league: String,
    pub year: i32,
    pub rows: Vec<LeagueRow>,
    pub charts: Vec<ChartSpec>,
}

#[derive(Debug, Clone)]
pub enum Report {
    Team(TeamReport),
    League(LeagueReport),
}

impl Report {
    pub fn charts(&self) -> &[ChartSpec] {
        match self {
            Report::Team(r) => &r.charts,
            Report::League(r) => &r.charts,
        }
    }
}

/// Fetches (cache first) and normalizes everything one team view needs.
/// Errors are not swallowed here; the caller decides how to present them.
pub fn build_team_report<L: PageLoader>(
    scraper: &XgScraper<L>,
    team: &str,
    year: i32,
    sections: Sections,
    opts: &NormalizeOptions,
    force_refresh: bool,
) -> Result<TeamReport, XgError> {
    let mut charts = Vec::new();

    let need_roster = sections.goals || sections.assists || sections.performers;
    let players = if need_roster {
        let fragment = scraper.fetch(team, year, StatKind::Players, force_refresh)?;
        parse_roster(&fragment, MetricMode::A, opts)?
    } else {
        Vec::new()
    };
    if sections.goals {
        charts.push(ChartSpec::Scatter(chart::player_chart(&players, team, year, MetricMode::G)?));
    }
    if sections.assists {
        charts.push(ChartSpec::Scatter(chart::player_chart(&players, team, year, MetricMode::A)?));
    }

    let stats = if sections.situations || sections.shot_quality {
        let fragment = scraper.fetch(team, year, StatKind::Statistics, force_refresh)?;
        parse_team_stats(&fragment, opts)?
    } else {
        Vec::new()
    };
    if sections.situations {
        charts.push(ChartSpec::Bar(chart::situation_chart(&stats, team, year)));
    }
    if sections.shot_quality {
        charts.push(ChartSpec::Bar(chart::shot_quality_chart(&stats, team, year)));
    }

    let matches = if sections.matches {
        let fragment = scraper.fetch(team, year, StatKind::Matches, force_refresh)?;
        let rows = parse_matches(&fragment, opts)?;
        charts.push(ChartSpec::Timeline(chart::match_timeline(
            &rows,
            team,
            year,
            sections.rolling_xg,
            sections.rolling_xga,
        )));
        rows
    } else {
        Vec::new()
    };

    let performers = sections
        .performers
        .then(|| finishing_performers(&players, PERFORMERS_SHOWN));

    info!(team, year, charts = charts.len(), "team report ready");
    Ok(TeamReport {
        team: team.to_string(),
        year,
        players,
        stats,
        matches,
        performers,
        charts,
    })
}

pub fn build_league_report<L: PageLoader>(
    scraper: &XgScraper<L>,
    league: &str,
    year: i32,
    force_refresh: bool,
) -> Result<LeagueReport, XgError> {
    let fragment = scraper.fetch(league, year, StatKind::League, force_refresh)?;
    let rows = parse_league(&fragment)?;
    let charts = [MetricMode::G, MetricMode::GA, MetricMode::PTS]
        .into_iter()
        .map(|mode| chart::league_chart(&rows, league, year, mode).map(ChartSpec::Scatter))
        .collect::<Result<Vec<_>, _>>()?;
    info!(league, year, teams = rows.len(), "league report ready");
    Ok(LeagueReport {
        league: league.to_string(),
        year,
        rows,
        charts,
    })
}

/// Selection and console state behind the terminal dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub country: usize,
    pub team: usize,
    pub year: usize,
    pub view: ViewMode,
    pub sections: Sections,
    pub chart_index: usize,
    pub report: Option<Report>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            country: 0,
            team: 0,
            year: 0,
            view: ViewMode::Team,
            sections: Sections::default(),
            chart_index: 0,
            report: None,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn country(&self) -> &'static Country {
        &COUNTRIES[self.country % COUNTRIES.len()]
    }

    pub fn team_name(&self) -> &'static str {
        let teams = self.country().teams;
        teams[self.team % teams.len()]
    }

    pub fn season(&self) -> i32 {
        SEASONS[self.year % SEASONS.len()]
    }

    /// Entity the current view is about: a team slug or a league slug.
    pub fn entity(&self) -> &'static str {
        match self.view {
            ViewMode::Team => self.team_name(),
            ViewMode::League => self.country().league,
        }
    }

    pub fn cycle_country(&mut self) {
        self.country = (self.country + 1) % COUNTRIES.len();
        self.team = 0;
        self.invalidate();
    }

    pub fn cycle_team(&mut self) {
        self.team = (self.team + 1) % self.country().teams.len();
        self.invalidate();
    }

    pub fn cycle_year(&mut self) {
        self.year = (self.year + 1) % SEASONS.len();
        self.invalidate();
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            ViewMode::Team => ViewMode::League,
            ViewMode::League => ViewMode::Team,
        };
        self.invalidate();
    }

    pub fn next_chart(&mut self) {
        let n = self.report.as_ref().map(|r| r.charts().len()).unwrap_or(0);
        if n > 0 {
            self.chart_index = (self.chart_index + 1) % n;
        }
    }

    pub fn prev_chart(&mut self) {
        let n = self.report.as_ref().map(|r| r.charts().len()).unwrap_or(0);
        if n > 0 {
            self.chart_index = (self.chart_index + n - 1) % n;
        }
    }

    pub fn current_chart(&self) -> Option<&ChartSpec> {
        self.report.as_ref()?.charts().get(self.chart_index)
    }

    /// Jumps to the first chart whose title starts with `prefix`.
    pub fn focus_chart(&mut self, prefix: &str) -> bool {
        let Some(report) = self.report.as_ref() else {
            return false;
        };
        match report.charts().iter().position(|c| c.title().starts_with(prefix)) {
            Some(idx) => {
                self.chart_index = idx;
                true
            }
            None => false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Loads the report for the current selection, logging instead of failing.
    pub fn load<L: PageLoader>(
        &mut self,
        scraper: &XgScraper<L>,
        opts: &NormalizeOptions,
        force_refresh: bool,
    ) {
        let year = self.season();
        let entity = self.entity();
        let res = match self.view {
            ViewMode::Team => {
                build_team_report(scraper, entity, year, self.sections, opts, force_refresh)
                    .map(Report::Team)
            }
            ViewMode::League => {
                build_league_report(scraper, entity, year, force_refresh).map(Report::League)
            }
        };
        match res {
            Ok(report) => {
                self.push_log(format!(
                    "[INFO] Loaded {entity} {year} ({} charts)",
                    report.charts().len()
                ));
                self.report = Some(report);
                self.chart_index = 0;
            }
            Err(err) => {
                self.push_log(format!("[WARN] {entity} {year}: {err}"));
                self.report = None;
            }
        }
    }

    fn invalidate(&mut self) {
        self.report = None;
        self.chart_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycling_country_resets_team() {
        let mut state = DashboardState::new();
        state.cycle_team();
        state.cycle_team();
        assert_eq!(state.team, 2);
        state.cycle_country();
        assert_eq!(state.team, 0);
        assert_eq!(state.country().name, "Spain");
    }

    #[test]
    fn league_view_uses_league_slug() {
        let mut state = DashboardState::new();
        assert_eq!(state.entity(), "Lille");
        state.toggle_view();
        assert_eq!(state.entity(), "Ligue_1");
    }

    #[test]
    fn logs_are_bounded() {
        let mut state = DashboardState::new();
        for i in 0..(MAX_LOGS + 5) {
            state.push_log(format!("line {i}"));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert_eq!(state.logs.front().map(String::as_str), Some("line 5"));
    }
}
