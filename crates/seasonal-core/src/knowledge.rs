//! Season knowledge base: recommendation records keyed by season name.
//!
//! The default table is embedded at compile time from `contrib/seasons.toml`.
//! A host may load its own file instead, and must call
//! [`KnowledgeBase::validate_covers`] at startup so that every season the
//! classifier can emit is guaranteed to resolve.

use crate::classifier::Season;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const EMBEDDED_SEASONS: &str = include_str!("../../../contrib/seasons.toml");

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid knowledge base: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no knowledge entry for season: {0}")]
    UnknownSeason(String),
    #[error("knowledge base is missing seasons: {}", .0.join(", "))]
    MissingSeasons(Vec<String>),
    #[error("season {0} has no occasions")]
    NoOccasions(String),
}

/// A named item with the reason it is recommended (or to be avoided).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occasion {
    pub outfit: String,
    pub shoes: String,
    pub accessories: String,
    pub makeup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonEntry {
    pub description: String,
    #[serde(default)]
    pub colors: Vec<Recommendation>,
    #[serde(default)]
    pub hair: Vec<Recommendation>,
    #[serde(default)]
    pub makeup: Vec<Recommendation>,
    #[serde(default)]
    pub jewelry: Vec<Recommendation>,
    #[serde(default)]
    pub avoid: Vec<Recommendation>,
    #[serde(default)]
    pub occasions: IndexMap<String, Occasion>,
}

impl SeasonEntry {
    /// Look up an occasion, or the first one when `name` is `None`.
    pub fn occasion(&self, name: Option<&str>) -> Option<(&str, &Occasion)> {
        match name {
            Some(name) => self
                .occasions
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v)),
            None => self.occasions.first().map(|(k, v)| (k.as_str(), v)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    seasons: IndexMap<String, SeasonEntry>,
}

impl KnowledgeBase {
    pub fn embedded() -> Result<Self, KnowledgeError> {
        Self::from_toml_str(EMBEDDED_SEASONS)
    }

    pub fn from_toml_str(src: &str) -> Result<Self, KnowledgeError> {
        Ok(toml::from_str(src)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, KnowledgeError> {
        let src = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let kb = Self::from_toml_str(&src)?;
        tracing::info!(path = %path.display(), seasons = kb.seasons.len(), "loaded knowledge base");
        Ok(kb)
    }

    pub fn lookup(&self, season: Season) -> Result<&SeasonEntry, KnowledgeError> {
        self.get(season.name())
            .ok_or_else(|| KnowledgeError::UnknownSeason(season.name().to_string()))
    }

    /// Entry by display name. Names outside the classifier's label set are allowed.
    pub fn get(&self, name: &str) -> Option<&SeasonEntry> {
        self.seasons.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.seasons.keys().map(String::as_str)
    }

    /// Check that every given season has an entry with at least one occasion.
    pub fn validate_covers(&self, seasons: &[Season]) -> Result<(), KnowledgeError> {
        let missing: Vec<String> = seasons
            .iter()
            .filter(|s| self.get(s.name()).is_none())
            .map(|s| s.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(KnowledgeError::MissingSeasons(missing));
        }

        for season in seasons {
            if self.lookup(*season)?.occasions.is_empty() {
                return Err(KnowledgeError::NoOccasions(season.name().to_string()));
            }
        }
        Ok(())
    }
}
