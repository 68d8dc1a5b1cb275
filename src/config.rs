use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::browser::BrowserProfile;
use crate::normalize::NormalizeOptions;

pub const DEFAULT_CACHE_DIR: &str = "data_cache";
pub const DEFAULT_SITE: &str = "understat.com";

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const MIN_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub site: String,
    pub fetch_timeout: Duration,
    pub fetch_parallelism: usize,
    pub browser_profile: BrowserProfile,
    pub normalize: NormalizeOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            site: DEFAULT_SITE.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fetch_parallelism: 1,
            browser_profile: BrowserProfile::Local,
            normalize: NormalizeOptions::default(),
        }
    }
}

impl Settings {
    /// Loads `.env.local` / `.env` when present, then reads `XG_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let defaults = Self::default();
        let cache_dir = env::var("XG_CACHE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);
        let site = env::var("XG_SITE")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.site);
        let timeout_secs = env_parse("XG_FETCH_TIMEOUT_SECS")
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        let fetch_parallelism = env_parse::<usize>("XG_FETCH_PARALLELISM")
            .unwrap_or(1)
            .clamp(1, 16);

        // Hosted deployments expose DYNO; they have no GPU and no sandbox.
        let browser_profile = env::var("XG_BROWSER_PROFILE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(if env::var_os("DYNO").is_some() {
                BrowserProfile::Sandboxed
            } else {
                BrowserProfile::Local
            });

        let mut normalize = defaults.normalize;
        if let Some(v) = env_parse::<f64>("XG_SIGNIFICANCE").filter(|v| v.is_finite() && *v >= 0.0)
        {
            normalize.significance_threshold = v;
        }
        if let Some(v) = env_parse::<usize>("XG_ROLLING_WINDOW") {
            normalize.rolling_window = v.max(1);
            normalize.rolling_min_periods = normalize.rolling_min_periods.min(normalize.rolling_window);
        }
        if let Some(v) = env_parse::<usize>("XG_ROSTER_LIMIT") {
            normalize.roster_limit = v.max(1);
        }

        Self {
            cache_dir,
            site,
            fetch_timeout: Duration::from_secs(timeout_secs),
            fetch_parallelism,
            browser_profile,
            normalize,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

pub const SEASONS: &[i32] = &[2020, 2019, 2018, 2017, 2016, 2015, 2014];

#[derive(Debug, Clone, Copy)]
pub struct Country {
    pub name: &'static str,
    pub league: &'static str,
    pub teams: &'static [&'static str],
}

pub const COUNTRIES: &[Country] = &[
    Country {
        name: "France",
        league: "Ligue_1",
        teams: &[
            "Lille", "Lyon", "Paris_Saint_Germain", "Monaco", "Lens", "Metz", "Marseille",
            "Rennes", "Lorient", "Strasbourg", "Montpellier", "Bordeaux", "Nice", "Brest",
            "Angers", "Nantes", "Reims", "Dijon", "Nimes",
        ],
    },
    Country {
        name: "Spain",
        league: "La_liga",
        teams: &[
            "Atletico_Madrid", "Real_Madrid", "Barcelona", "Sevilla", "Real_Sociedad",
            "Villarreal", "Real_Betis", "Levante", "Granada", "Athletic_Club", "Celta_Vigo",
            "Valencia", "Osasuna", "Cadiz", "Getafe", "Alaves", "Eibar", "Real_Valladolid",
            "Elche", "SD_Huesca",
        ],
    },
    Country {
        name: "England",
        league: "EPL",
        teams: &[
            "Manchester_City", "Manchester_United", "Leicester", "West_Ham", "Chelsea",
            "Liverpool", "Everton", "Aston_Villa", "Tottenham", "Leeds", "Arsenal",
            "Wolverhampton_Wanderers", "Crystal_Palace", "Southampton", "Burnley", "Brighton",
            "Newcastle_United", "Fulham", "West_Bromwich_Albion", "Sheffield_United",
        ],
    },
    Country {
        name: "Germany",
        league: "Bundesliga",
        teams: &[
            "Werder_Bremen", "VfB_Stuttgart", "Union_Berlin", "Schalke_04",
            "RasenBallsport_Leipzig", "Mainz_05", "Hoffenheim", "Hertha_Berlin", "Freiburg",
            "FC_Cologne", "Eintracht_Frankfurt", "Borussia_M.Gladbach", "Borussia_Dortmund",
            "Bayern_Munich", "Bayer_Leverkusen", "Augsburg", "Arminia_Bielefeld",
        ],
    },
    Country {
        name: "Italy",
        league: "Serie_A",
        teams: &[
            "Inter", "AC_Milan", "Juventus", "Roma", "Atalanta", "Lazio", "Napoli", "Sassuolo",
            "Verona", "Sampdoria", "Genoa", "Bologna", "Udinese", "Fiorentina", "Benevento",
            "Spezia", "Torino", "Cagliari", "Parma_Calcio_1913", "Crotone",
        ],
    },
];

pub fn country(name: &str) -> Option<&'static Country> {
    COUNTRIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name) || c.league.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_lookup_accepts_league_slug() {
        assert_eq!(country("epl").map(|c| c.name), Some("England"));
        assert_eq!(country("France").map(|c| c.league), Some("Ligue_1"));
        assert!(country("Narnia").is_none());
    }

    #[test]
    fn catalog_has_no_duplicate_teams() {
        for c in COUNTRIES {
            let mut teams = c.teams.to_vec();
            teams.sort_unstable();
            teams.dedup();
            assert_eq!(teams.len(), c.teams.len(), "{} has duplicates", c.name);
        }
    }
}
