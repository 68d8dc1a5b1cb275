use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use xg_tracker::match_calendar::{parse_matches, rolling_mean, MatchResult, Side};
use xg_tracker::normalize::NormalizeOptions;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn close(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-9)
}

#[test]
fn parses_played_matches_and_skips_fixtures() {
    let raw = read_fixture("understat_matches.html");
    let rows = parse_matches(&raw, &NormalizeOptions::default()).expect("fixture should parse");

    assert_eq!(rows.len(), 4);
    let matchdays = rows.iter().map(|r| r.matchday).collect::<Vec<_>>();
    assert_eq!(matchdays, vec![1, 2, 3, 5]);
    assert!(rows.iter().all(|r| r.opponent != "Metz"));

    assert_eq!(rows[0].opponent, "Nantes");
    assert_eq!(rows[0].side, Side::Home);
    assert_eq!(rows[0].result, MatchResult::Win);
    assert_eq!(rows[0].date_parsed, NaiveDate::from_ymd_opt(2019, 8, 11));
}

#[test]
fn only_compact_calendar_entries_are_matches() {
    let raw = read_fixture("understat_matches.html");
    let rows = parse_matches(&raw, &NormalizeOptions::default()).expect("fixture should parse");
    // The fixture opens with a full-size container for Bordeaux.
    assert!(raw.contains("Bordeaux"));
    assert!(rows.iter().all(|r| r.opponent != "Bordeaux"));
    assert_eq!(rows[0].opponent, "Nantes");
    assert_eq!(rows[0].matchday, 1);
}

#[test]
fn match_rows_serialize_dates_as_iso_strings() {
    let raw = read_fixture("understat_matches.html");
    let rows = parse_matches(&raw, &NormalizeOptions::default()).expect("fixture should parse");
    let json = serde_json::to_string(&rows[0]).expect("serialize row");
    assert!(json.contains("\"date_parsed\":\"2019-08-11\""), "{json}");
}

#[test]
fn team_xg_follows_the_side() {
    let raw = read_fixture("understat_matches.html");
    let rows = parse_matches(&raw, &NormalizeOptions::default()).expect("fixture should parse");

    let nice = &rows[1];
    assert_eq!(nice.side, Side::Away);
    assert_eq!(nice.result, MatchResult::Loss);
    assert!((nice.home_xg - 0.95).abs() < 1e-9);
    assert!((nice.team_xg - 1.30).abs() < 1e-9);
    assert!((nice.opponent_xg - 0.95).abs() < 1e-9);

    // Single run of text: first four characters are the home value.
    let angers = &rows[2];
    assert_eq!(angers.result, MatchResult::Draw);
    assert!((angers.home_xg - 2.10).abs() < 1e-9);
    assert!((angers.away_xg - 1.05).abs() < 1e-9);
    assert!((angers.team_xg - 2.10).abs() < 1e-9);
}

#[test]
fn rolling_means_cover_played_matches() {
    let raw = read_fixture("understat_matches.html");
    let rows = parse_matches(&raw, &NormalizeOptions::default()).expect("fixture should parse");

    assert_eq!(rows[0].rolling_team_xg, None);
    assert_eq!(rows[0].rolling_opponent_xg, None);
    assert!(close(rows[1].rolling_team_xg, 1.46));
    assert!(close(rows[1].rolling_opponent_xg, 0.715));
    assert!(close(rows[2].rolling_team_xg, (1.62 + 1.30 + 2.10) / 3.0));
    assert!(close(rows[3].rolling_team_xg, (1.62 + 1.30 + 2.10 + 2.40) / 4.0));
}

#[test]
fn rolling_window_comes_from_options() {
    let raw = read_fixture("understat_matches.html");
    let opts = NormalizeOptions {
        rolling_window: 2,
        ..NormalizeOptions::default()
    };
    let rows = parse_matches(&raw, &opts).expect("fixture should parse");
    assert!(close(rows[3].rolling_team_xg, (2.10 + 2.40) / 2.0));
}

#[test]
fn rolling_mean_matches_trailing_average() {
    let out = rolling_mean(&[1.0, 2.0, 3.0], 6, 2);
    assert_eq!(out[0], None);
    assert!(close(out[2], 2.0));
    assert!(rolling_mean(&[], 6, 2).is_empty());
}

#[test]
fn empty_calendar_yields_no_rows() {
    let rows = parse_matches(
        r#"<div class="calendar-container"></div>"#,
        &NormalizeOptions::default(),
    )
    .expect("empty calendar is valid");
    assert!(rows.is_empty());
}
