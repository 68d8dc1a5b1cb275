use once_cell::sync::OnceCell;
use rayon::prelude::*;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::browser::{HeadlessBrowser, PageLoader};
use crate::cache_store::{CacheKey, CacheStore, StatKind};
use crate::config::Settings;
use crate::error::FetchError;

pub struct XgScraper<L = HeadlessBrowser> {
    store: CacheStore,
    loader: L,
    site: String,
    parallelism: usize,
}

#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub key: CacheKey,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchRefresh {
    pub attempted: usize,
    pub refreshed: Vec<CacheKey>,
    pub failures: Vec<BatchFailure>,
}

impl XgScraper<HeadlessBrowser> {
    pub fn from_settings(settings: &Settings) -> Self {
        let loader = HeadlessBrowser::new(settings.browser_profile, settings.fetch_timeout);
        XgScraper::new(CacheStore::new(&settings.cache_dir), loader, &settings.site)
            .with_parallelism(settings.fetch_parallelism)
    }
}

impl<L: PageLoader> XgScraper<L> {
    pub fn new(store: CacheStore, loader: L, site: &str) -> Self {
        Self {
            store,
            loader,
            site: site.trim_end_matches('/').to_string(),
            parallelism: 1,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn page_url(&self, entity_name: &str, year: i32, stat_kind: StatKind) -> String {
        let scope = if stat_kind.is_team_scoped() { "team" } else { "league" };
        let site = &self.site;
        if site.starts_with("http://") || site.starts_with("https://") {
            format!("{site}/{scope}/{entity_name}/{year}")
        } else {
            format!("https://{site}/{scope}/{entity_name}/{year}")
        }
    }

    /// Cache-first fetch of one fragment. `force_refresh` skips the cache read
    /// but still overwrites the entry on success.
    pub fn fetch(
        &self,
        entity_name: &str,
        year: i32,
        stat_kind: StatKind,
        force_refresh: bool,
    ) -> Result<String, FetchError> {
        let key = CacheKey::new(entity_name, year, stat_kind);
        key.validate()?;
        if !force_refresh {
            if let Some(cached) = self.store.get(&key)? {
                return Ok(cached);
            }
        }

        let url = self.page_url(entity_name, year, stat_kind);
        let page = self.loader.load_page(&url)?;
        let fragment =
            extract_fragment(&page, stat_kind).ok_or_else(|| FetchError::FragmentMissing {
                url: url.clone(),
                stat_kind,
                selector: fragment_selector(stat_kind),
            })?;
        debug!(%key, bytes = fragment.len(), "extracted fragment");

        self.store.put(&key, &fragment)?;
        // Hand back exactly what later cache reads will see.
        Ok(self.store.get(&key)?.unwrap_or(fragment))
    }

    /// Best-effort bulk refresh. A failing pair is logged and recorded, never fatal.
    pub fn fetch_batch(
        &self,
        pairs: &[(String, i32)],
        stat_kind: StatKind,
        force_refresh: bool,
    ) -> BatchRefresh {
        let run = |pair: &(String, i32)| {
            let (entity, year) = pair;
            let key = CacheKey::new(entity.as_str(), *year, stat_kind);
            let res = self.fetch(entity, *year, stat_kind, force_refresh);
            (key, res)
        };

        let results: Vec<(CacheKey, Result<String, FetchError>)> = if self.parallelism > 1 {
            with_fetch_pool(&build_fetch_pool(self.parallelism), || {
                pairs.par_iter().map(run).collect()
            })
        } else {
            pairs.iter().map(run).collect()
        };

        let mut report = BatchRefresh {
            attempted: results.len(),
            ..BatchRefresh::default()
        };
        for (key, res) in results {
            match res {
                Ok(_) => report.refreshed.push(key),
                Err(err) => {
                    warn!(%key, error = %err, "unable to update");
                    report.failures.push(BatchFailure {
                        key,
                        error: err.to_string(),
                    });
                }
            }
        }
        info!(
            attempted = report.attempted,
            refreshed = report.refreshed.len(),
            failed = report.failures.len(),
            "batch refresh complete"
        );
        report
    }
}

impl<L> XgScraper<L> {
    pub fn loader(&self) -> &L {
        &self.loader
    }
}

/// Cartesian product of entities and seasons, entity-major.
pub fn batch_pairs<S: AsRef<str>>(entities: &[S], years: &[i32]) -> Vec<(String, i32)> {
    entities
        .iter()
        .flat_map(|e| years.iter().map(move |y| (e.as_ref().to_string(), *y)))
        .collect()
}

pub fn fragment_selector(stat_kind: StatKind) -> &'static str {
    match stat_kind {
        StatKind::Players => "div#team-players table",
        StatKind::Statistics => "div#team-statistics table",
        StatKind::League => "div#league-chemp table",
        StatKind::Matches => "div.calendar-container",
    }
}

/// Isolates the one table or container a stat kind cares about.
pub fn extract_fragment(page: &str, stat_kind: StatKind) -> Option<String> {
    let idx = StatKind::ALL.iter().position(|k| *k == stat_kind)?;
    let selector = fragment_selectors()?.get(idx)?;
    let doc = Html::parse_document(page);
    doc.select(selector).next().map(|el| el.html())
}

static FRAGMENT_SELECTORS: OnceCell<Vec<Selector>> = OnceCell::new();

/// Parsed once, in `StatKind::ALL` order.
fn fragment_selectors() -> Option<&'static Vec<Selector>> {
    FRAGMENT_SELECTORS
        .get_or_try_init(|| {
            StatKind::ALL
                .iter()
                .map(|kind| Selector::parse(fragment_selector(*kind)).map_err(|_| ()))
                .collect::<Result<Vec<_>, ()>>()
        })
        .ok()
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_pairs_is_entity_major() {
        let pairs = batch_pairs(&["Lille", "Lyon"], &[2020, 2019]);
        assert_eq!(
            pairs,
            vec![
                ("Lille".to_string(), 2020),
                ("Lille".to_string(), 2019),
                ("Lyon".to_string(), 2020),
                ("Lyon".to_string(), 2019),
            ]
        );
    }

    #[test]
    fn extract_takes_table_inside_named_container() {
        let page = r#"<html><body>
            <table id="decoy"><tr><td>x</td></tr></table>
            <div id="team-players"><h3>Players</h3><table id="real"><tr><td>1</td></tr></table></div>
        </body></html>"#;
        let fragment = extract_fragment(page, StatKind::Players).expect("fragment");
        assert!(fragment.starts_with("<table id=\"real\""));
        assert!(extract_fragment(page, StatKind::League).is_none());
    }
}
