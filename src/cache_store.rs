use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::FetchError;

const CACHE_EXT: &str = "txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Players,
    Statistics,
    League,
    Matches,
}

impl StatKind {
    pub const ALL: [StatKind; 4] = [
        StatKind::Players,
        StatKind::Statistics,
        StatKind::League,
        StatKind::Matches,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatKind::Players => "players",
            StatKind::Statistics => "statistics",
            StatKind::League => "league",
            StatKind::Matches => "matches",
        }
    }

    /// Team pages carry players, statistics and matches; standings live on the league page.
    pub fn is_team_scoped(self) -> bool {
        !matches!(self, StatKind::League)
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "players" => Ok(StatKind::Players),
            "statistics" | "stats" => Ok(StatKind::Statistics),
            "league" => Ok(StatKind::League),
            "matches" => Ok(StatKind::Matches),
            other => Err(format!("unknown stat kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    entity_name: String,
    year: i32,
    stat_kind: StatKind,
}

impl CacheKey {
    pub fn new(entity_name: impl Into<String>, year: i32, stat_kind: StatKind) -> Self {
        Self {
            entity_name: entity_name.into(),
            year,
            stat_kind,
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn stat_kind(&self) -> StatKind {
        self.stat_kind
    }

    /// Entity names become part of a file name, so they must not carry path
    /// separators or parent references.
    pub fn validate(&self) -> Result<(), FetchError> {
        let entity = self.entity_name.as_str();
        let bad = entity.trim().is_empty()
            || entity.contains(['/', '\\', '\0'])
            || entity.contains("..");
        if bad {
            return Err(FetchError::InvalidEntity {
                entity: entity.to_string(),
            });
        }
        Ok(())
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{CACHE_EXT}",
            self.entity_name, self.year, self.stat_kind
        )
    }

    /// Inverse of [`CacheKey::file_name`]. Entity names may contain underscores,
    /// so the year and stat kind are peeled off from the right.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(&format!(".{CACHE_EXT}"))?;
        let (rest, kind) = stem.rsplit_once('_')?;
        let (entity, year) = rest.rsplit_once('_')?;
        let key = Self::new(entity, year.parse().ok()?, kind.parse().ok()?);
        key.validate().ok()?;
        Some(key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({})", self.entity_name, self.year, self.stat_kind)
    }
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.checked_path(key).is_ok_and(|path| path.is_file())
    }

    fn checked_path(&self, key: &CacheKey) -> Result<PathBuf, FetchError> {
        key.validate()?;
        Ok(self.path_for(key))
    }

    /// `Ok(None)` is a plain miss; IO failures other than not-found are errors.
    pub fn get(&self, key: &CacheKey) -> Result<Option<String>, FetchError> {
        let path = self.checked_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(%key, "cache hit");
                Ok(Some(raw))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FetchError::CacheIo { path, source }),
        }
    }

    /// Overwrites any previous entry. Newlines are stripped before writing.
    pub fn put(&self, key: &CacheKey, fragment: &str) -> Result<(), FetchError> {
        let path = self.checked_path(key)?;
        fs::create_dir_all(&self.root).map_err(|source| FetchError::CacheIo {
            path: self.root.clone(),
            source,
        })?;
        let tmp = path.with_extension("txt.tmp");
        let contents = strip_newlines(fragment);
        fs::write(&tmp, contents).map_err(|source| FetchError::CacheIo {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| FetchError::CacheIo {
            path: path.clone(),
            source,
        })?;
        info!(%key, path = %path.display(), "saved cache entry");
        Ok(())
    }

    pub fn invalidate(&self, key: &CacheKey) -> Result<bool, FetchError> {
        let path = self.checked_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(FetchError::CacheIo { path, source }),
        }
    }

    pub fn keys(&self) -> Result<Vec<CacheKey>, FetchError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(FetchError::CacheIo {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut keys = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                CacheKey::from_file_name(name.to_str()?)
            })
            .collect::<Vec<_>>();
        keys.sort_by(|a, b| {
            (a.entity_name(), a.year(), a.stat_kind().as_str())
                .cmp(&(b.entity_name(), b.year(), b.stat_kind().as_str()))
        });
        Ok(keys)
    }
}

fn strip_newlines(raw: &str) -> String {
    raw.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_joins_key_fields() {
        let key = CacheKey::new("Paris_Saint_Germain", 2019, StatKind::Players);
        assert_eq!(key.file_name(), "Paris_Saint_Germain_2019_players.txt");
    }

    #[test]
    fn file_name_parses_back_with_underscored_entities() {
        let key = CacheKey::new("Borussia_M.Gladbach", 2018, StatKind::Matches);
        assert_eq!(CacheKey::from_file_name(&key.file_name()), Some(key));
        assert_eq!(CacheKey::from_file_name("Lille_2019_players.txt.tmp"), None);
        assert_eq!(CacheKey::from_file_name("Lille_twenty_players.txt"), None);
        assert_eq!(CacheKey::from_file_name("_2019_players.txt"), None);
    }
}
