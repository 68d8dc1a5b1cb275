use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};

use xg_tracker::cache_store::StatKind;
use xg_tracker::config::{self, Country, COUNTRIES, SEASONS, Settings};
use xg_tracker::logging;
use xg_tracker::xg_fetch::{XgScraper, batch_pairs};

fn main() -> Result<()> {
    logging::init_stderr();
    let settings = Settings::from_env();
    let scraper = XgScraper::from_settings(&settings);

    if has_flag("--list") {
        let keys = scraper
            .store()
            .keys()
            .context("unable to list cache directory")?;
        println!("Cache: {}", scraper.store().root().display());
        for key in &keys {
            println!("  {key}");
        }
        println!("{} entries", keys.len());
        return Ok(());
    }

    let countries = match arg_value("--country") {
        Some(name) => vec![config::country(&name).ok_or_else(|| anyhow!("unknown country {name}"))?],
        None => COUNTRIES.iter().collect::<Vec<_>>(),
    };
    let years = match arg_value("--years") {
        Some(raw) => parse_years(&raw),
        None => SEASONS.to_vec(),
    };
    if years.is_empty() {
        return Err(anyhow!("no seasons resolved for refresh"));
    }
    let kinds = match arg_value("--stats") {
        Some(raw) => parse_kinds(&raw)?,
        None => StatKind::ALL.to_vec(),
    };
    let force = has_flag("--force");
    let explicit_teams = arg_value("--teams").map(|raw| split_list(&raw));

    let mut failed = 0usize;
    for kind in kinds {
        let entities = entities_for(kind, &countries, explicit_teams.as_deref());
        if entities.is_empty() {
            continue;
        }
        let pairs = batch_pairs(&entities, &years);
        let summary = scraper.fetch_batch(&pairs, kind, force);

        println!(
            "{kind}: refreshed {}/{}",
            summary.refreshed.len(),
            summary.attempted
        );
        if !summary.failures.is_empty() {
            println!("  errors: {}", summary.failures.len());
            for failure in summary.failures.iter().take(6) {
                println!("   - unable to update {}: {}", failure.key, failure.error);
            }
        }
        failed += summary.failures.len();
    }

    println!("Cache refresh complete ({failed} failures)");
    Ok(())
}

fn entities_for(kind: StatKind, countries: &[&Country], teams: Option<&[String]>) -> Vec<String> {
    if !kind.is_team_scoped() {
        return countries.iter().map(|c| c.league.to_string()).collect();
    }
    match teams {
        Some(teams) => teams.to_vec(),
        None => dedup(
            countries
                .iter()
                .flat_map(|c| c.teams.iter().map(|t| t.to_string()))
                .collect(),
        ),
    }
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn split_list(raw: &str) -> Vec<String> {
    dedup(
        raw.split([',', ';', ' '])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn parse_years(raw: &str) -> Vec<i32> {
    let mut seen = HashSet::new();
    raw.split([',', ';', ' '])
        .filter_map(|part| part.trim().parse::<i32>().ok())
        .filter(|year| seen.insert(*year))
        .collect()
}

fn parse_kinds(raw: &str) -> Result<Vec<StatKind>> {
    split_list(raw)
        .iter()
        .map(|part| {
            part.parse::<StatKind>()
                .map_err(|_| anyhow!("unknown stat kind {part}"))
        })
        .collect()
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
