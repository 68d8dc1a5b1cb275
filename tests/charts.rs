use std::fs;
use std::path::PathBuf;

use xg_tracker::chart::{self, ChartSpec, Orientation, RD_YL_GN_9, SITUATION_MIN_AMPLITUDE};
use xg_tracker::match_calendar::parse_matches;
use xg_tracker::metric::MetricMode;
use xg_tracker::normalize::{parse_league, parse_roster, parse_team_stats, NormalizeOptions};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn player_chart_axes_and_reference_lines() {
    let raw = read_fixture("understat_players.html");
    let rows = parse_roster(&raw, MetricMode::G, &NormalizeOptions::default())
        .expect("fixture should parse");
    let chart = chart::player_chart(&rows, "Lille", 2019, MetricMode::G).expect("goal chart");

    assert_eq!(chart.title, "xGoal vs. actual Goal for Lille, season 2019-2020");
    assert_eq!(chart.x_label, "xGoal");
    // Burak Yilmaz scored 16, the largest value on either axis.
    assert_eq!(chart.x_range, (-0.5, 18.0));
    assert_eq!(chart.y_range, chart.x_range);
    assert_eq!(chart.points.len(), rows.len());
    assert!((chart.color_scale.amplitude() - 2.5).abs() < 1e-9);

    let slopes = chart.reference_lines.iter().map(|l| l.slope).collect::<Vec<_>>();
    assert_eq!(slopes, vec![1.0, 1.2, 0.8, 1.4, 0.6]);
}

#[test]
fn player_chart_amplitude_has_a_floor() {
    let raw = read_fixture("understat_players.html");
    let rows = parse_roster(&raw, MetricMode::A, &NormalizeOptions::default())
        .expect("fixture should parse");
    let chart = chart::player_chart(&rows, "Lille", 2019, MetricMode::A).expect("assist chart");
    assert_eq!((chart.color_scale.low, chart.color_scale.high), (-2.0, 2.0));
    assert_eq!(chart.x_range.1, 9.0);
}

#[test]
fn player_chart_rejects_team_modes() {
    let err = chart::player_chart(&[], "Lille", 2019, MetricMode::GA).expect_err("GA is league only");
    assert_eq!(err.mode, "GA");
    assert_eq!(err.to_string(), "unsupported metric mode `GA` for player chart");
}

#[test]
fn league_chart_pads_both_ends_and_flips_goals_against() {
    let raw = read_fixture("understat_league.html");
    let rows = parse_league(&raw).expect("fixture should parse");

    let goals = chart::league_chart(&rows, "Ligue_1", 2020, MetricMode::G).expect("goals");
    assert!((goals.x_range.0 - 45.3).abs() < 1e-9);
    assert!((goals.x_range.1 - 91.0).abs() < 1e-9);
    assert_eq!(goals.reference_lines.len(), 1);

    let against = chart::league_chart(&rows, "Ligue_1", 2020, MetricMode::GA).expect("against");
    assert_eq!(against.color_scale.palette.first(), RD_YL_GN_9.last());
    // Lille conceded 7.5 fewer than expected: good, so green end.
    let lille = &against.points[0];
    assert!(lille.color_value < 0.0);
    assert_eq!(lille.color, against.color_scale.color_for(lille.color_value));
    assert_eq!(lille.color, RD_YL_GN_9[8]);

    assert!(chart::league_chart(&rows, "Ligue_1", 2020, MetricMode::A).is_err());
}

#[test]
fn situation_chart_uses_minimum_amplitude() {
    let raw = read_fixture("understat_statistics.html");
    let rows = parse_team_stats(&raw, &NormalizeOptions::default()).expect("fixture should parse");
    let chart = chart::situation_chart(&rows, "Lille", 2019);

    assert_eq!(chart.orientation, Orientation::Horizontal);
    assert_eq!(chart.value_range, (-SITUATION_MIN_AMPLITUDE, SITUATION_MIN_AMPLITUDE));
    assert_eq!(chart.bars.len(), 4);
}

#[test]
fn situation_chart_widens_past_the_floor() {
    let raw = read_fixture("understat_statistics.html");
    let mut rows = parse_team_stats(&raw, &NormalizeOptions::default()).expect("fixture should parse");
    rows[0].diff_xg = -6.0;
    let chart = chart::situation_chart(&rows, "Lille", 2019);
    assert_eq!(chart.value_range, (-7.0, 7.0));
}

#[test]
fn shot_quality_chart_leaves_out_penalties() {
    let raw = read_fixture("understat_statistics.html");
    let rows = parse_team_stats(&raw, &NormalizeOptions::default()).expect("fixture should parse");
    let chart = chart::shot_quality_chart(&rows, "Lille", 2019);

    assert_eq!(chart.orientation, Orientation::Vertical);
    assert_eq!(chart.bars.len(), 6);
    assert!(chart.bars.iter().all(|b| b.category != "Penalty"));
    assert_eq!(chart.value_range, (0.0, 0.2));
}

#[test]
fn match_timeline_colors_by_result() {
    let raw = read_fixture("understat_matches.html");
    let rows = parse_matches(&raw, &NormalizeOptions::default()).expect("fixture should parse");
    let chart = chart::match_timeline(&rows, "Lille", 2019, true, false);

    assert_eq!(chart.points.len(), 4);
    assert!((chart.y_range.1 - 2.9).abs() < 1e-9);
    assert_eq!(chart.points[0].color, chart.points[3].color, "both wins");
    assert_ne!(chart.points[0].color, chart.points[1].color);
    assert_eq!(chart.lines.len(), 1);
    // The first match has no rolling value yet.
    assert_eq!(chart.lines[0].points.len(), 3);
}

#[test]
fn chart_specs_serialize_with_kind_tag() {
    let raw = read_fixture("understat_statistics.html");
    let rows = parse_team_stats(&raw, &NormalizeOptions::default()).expect("fixture should parse");
    let spec = ChartSpec::Bar(chart::shot_quality_chart(&rows, "Lille", 2019));
    let json = spec.to_json().expect("serialize chart");
    assert!(json.contains("\"kind\": \"bar\""));
    assert!(json.contains("Open play"));
}
