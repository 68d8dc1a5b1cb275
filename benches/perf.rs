use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use xg_tracker::cache_store::StatKind;
use xg_tracker::chart::{league_chart, player_chart};
use xg_tracker::match_calendar::parse_matches;
use xg_tracker::metric::MetricMode;
use xg_tracker::normalize::{parse_league, parse_roster, NormalizeOptions};
use xg_tracker::xg_fetch::extract_fragment;

fn bench_roster_parse(c: &mut Criterion) {
    let opts = NormalizeOptions::default();
    c.bench_function("roster_parse", |b| {
        b.iter(|| {
            let rows = parse_roster(black_box(PLAYERS_HTML), MetricMode::A, &opts).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_league_parse(c: &mut Criterion) {
    c.bench_function("league_parse", |b| {
        b.iter(|| {
            let rows = parse_league(black_box(LEAGUE_HTML)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_matches_parse(c: &mut Criterion) {
    let opts = NormalizeOptions::default();
    c.bench_function("matches_parse", |b| {
        b.iter(|| {
            let rows = parse_matches(black_box(MATCHES_HTML), &opts).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_fragment_extract(c: &mut Criterion) {
    let page = format!(
        r#"<html><body><div id="team-statistics">{STATISTICS_HTML}</div><div id="team-players">{PLAYERS_HTML}</div>{MATCHES_HTML}</body></html>"#
    );
    c.bench_function("fragment_extract", |b| {
        b.iter(|| {
            let fragment = extract_fragment(black_box(&page), StatKind::Players).unwrap();
            black_box(fragment.len());
        })
    });
}

fn bench_chart_build(c: &mut Criterion) {
    let players = parse_roster(PLAYERS_HTML, MetricMode::A, &NormalizeOptions::default()).unwrap();
    let league = parse_league(LEAGUE_HTML).unwrap();
    c.bench_function("chart_build", |b| {
        b.iter(|| {
            let scatter = player_chart(black_box(&players), "Lille", 2019, MetricMode::G).unwrap();
            let table = league_chart(black_box(&league), "Ligue_1", 2020, MetricMode::PTS).unwrap();
            black_box((scatter.points.len(), table.points.len()));
        })
    });
}

criterion_group!(
    perf,
    bench_roster_parse,
    bench_league_parse,
    bench_matches_parse,
    bench_fragment_extract,
    bench_chart_build
);
criterion_main!(perf);

static PLAYERS_HTML: &str = include_str!("../tests/fixtures/understat_players.html");
static STATISTICS_HTML: &str = include_str!("../tests/fixtures/understat_statistics.html");
static LEAGUE_HTML: &str = include_str!("../tests/fixtures/understat_league.html");
static MATCHES_HTML: &str = include_str!("../tests/fixtures/understat_matches.html");
