use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::debug;

use crate::error::ParseError;
use crate::normalize::NormalizeOptions;
use crate::xg_value::parse_plain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    fn from_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'h' => Some(Side::Home),
            'a' => Some(Side::Away),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Home => "Home",
            Side::Away => "Away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchResult {
    Win,
    Draw,
    Loss,
}

impl MatchResult {
    fn from_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'w' => Some(MatchResult::Win),
            'd' => Some(MatchResult::Draw),
            'l' => Some(MatchResult::Loss),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchResult::Win => "Win",
            MatchResult::Draw => "Draw",
            MatchResult::Loss => "Loss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    /// 1-based position in the calendar, unplayed fixtures included.
    pub matchday: usize,
    pub date: String,
    pub date_parsed: Option<NaiveDate>,
    pub opponent: String,
    pub side: Side,
    pub result: MatchResult,
    pub home_xg: f64,
    pub away_xg: f64,
    pub team_xg: f64,
    pub opponent_xg: f64,
    pub rolling_team_xg: Option<f64>,
    pub rolling_opponent_xg: Option<f64>,
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| unreachable!("static selector {css}"))
}

/// One row per played match, in calendar order. Fixtures without a result or
/// xG block are not played yet and are skipped.
pub fn parse_matches(fragment: &str, opts: &NormalizeOptions) -> Result<Vec<MatchRow>, ParseError> {
    let doc = Html::parse_fragment(fragment);
    let node_sel = selector("div.calendar-date-container.mini");

    let mut out = Vec::new();
    for (idx, node) in doc.select(&node_sel).enumerate() {
        match parse_match_node(node)? {
            Some(played) => out.push(played.into_row(idx + 1)),
            None => debug!(matchday = idx + 1, "skipping unplayed match"),
        }
    }

    apply_rolling(&mut out, opts);
    Ok(out)
}

struct PlayedMatch {
    date: String,
    opponent: String,
    side: Side,
    result: MatchResult,
    home_xg: f64,
    away_xg: f64,
}

impl PlayedMatch {
    fn into_row(self, matchday: usize) -> MatchRow {
        let team_xg = match self.side {
            Side::Home => self.home_xg,
            Side::Away => self.away_xg,
        };
        MatchRow {
            matchday,
            date_parsed: parse_calendar_date(&self.date),
            date: self.date,
            opponent: self.opponent,
            side: self.side,
            result: self.result,
            home_xg: self.home_xg,
            away_xg: self.away_xg,
            team_xg,
            opponent_xg: self.home_xg + self.away_xg - team_xg,
            rolling_team_xg: None,
            rolling_opponent_xg: None,
        }
    }
}

fn parse_match_node(node: ElementRef<'_>) -> Result<Option<PlayedMatch>, ParseError> {
    let Some(date) = first_text(node, &selector(".calendar-date")) else {
        return Ok(None);
    };
    let Some(opponent) = first_text(node, &selector(".team-title")) else {
        return Ok(None);
    };
    let Some(result) = data_attr(node, "data-result").and_then(|c| MatchResult::from_code(&c)) else {
        return Ok(None);
    };
    let Some(side) = data_attr(node, "data-side").and_then(|c| Side::from_code(&c)) else {
        return Ok(None);
    };
    let Some((home_raw, away_raw)) = xg_pair(node) else {
        return Ok(None);
    };

    Ok(Some(PlayedMatch {
        date,
        opponent,
        side,
        result,
        home_xg: parse_plain(&home_raw, "home_xG")?,
        away_xg: parse_plain(&away_raw, "away_xG")?,
    }))
}

fn first_text(node: ElementRef<'_>, sel: &Selector) -> Option<String> {
    node.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn data_attr(node: ElementRef<'_>, name: &str) -> Option<String> {
    let sel = Selector::parse(&format!("[{name}]")).ok()?;
    node.value()
        .attr(name)
        .or_else(|| node.select(&sel).next().and_then(|el| el.value().attr(name)))
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// The xG block holds home then away values, either as two child elements or
/// as one run of text where the home value takes the first four characters.
fn xg_pair(node: ElementRef<'_>) -> Option<(String, String)> {
    let block = node.select(&selector(".teams-xG")).next()?;
    let parts: Vec<String> = block
        .children()
        .filter_map(ElementRef::wrap)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if parts.len() >= 2 {
        return Some((parts[0].clone(), parts[1].clone()));
    }

    let text: String = block.text().collect::<String>().split_whitespace().collect();
    if text.len() <= 4 || !text.is_char_boundary(4) {
        return None;
    }
    let (home, away) = text.split_at(4);
    Some((home.to_string(), away.to_string()))
}

fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%b %d, %Y", "%B %d, %Y", "%A, %B %d, %Y", "%Y-%m-%d"];
    let cleaned = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}

fn apply_rolling(rows: &mut [MatchRow], opts: &NormalizeOptions) {
    let team: Vec<f64> = rows.iter().map(|r| r.team_xg).collect();
    let opponent: Vec<f64> = rows.iter().map(|r| r.opponent_xg).collect();
    let team_roll = rolling_mean(&team, opts.rolling_window, opts.rolling_min_periods);
    let opp_roll = rolling_mean(&opponent, opts.rolling_window, opts.rolling_min_periods);
    for ((row, t), o) in rows.iter_mut().zip(team_roll).zip(opp_roll) {
        row.rolling_team_xg = t;
        row.rolling_opponent_xg = o;
    }
}

/// Trailing mean over at most `window` values; `None` until `min_periods`
/// values are available.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    values
        .iter()
        .enumerate()
        .map(|(idx, _)| {
            let start = (idx + 1).saturating_sub(window);
            let slice = &values[start..=idx];
            if slice.len() < min_periods.max(1) {
                None
            } else {
                Some(slice.iter().sum::<f64>() / slice.len() as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_needs_two_samples() {
        let out = rolling_mean(&[1.0, 2.0, 3.0], 6, 2);
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(1.5));
        assert!((out[2].unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn rolling_mean_drops_values_outside_window() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 7.0];
        let out = rolling_mean(&values, 6, 2);
        assert!((out[6].unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn calendar_dates_parse_in_site_formats() {
        assert_eq!(
            parse_calendar_date("Aug 10, 2019"),
            NaiveDate::from_ymd_opt(2019, 8, 10)
        );
        assert_eq!(parse_calendar_date("soon"), None);
    }
}
