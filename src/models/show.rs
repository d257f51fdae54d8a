use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Display};

use super::GenreSet;

/// Unified show identifier, shared by movies and series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(pub i64);

impl Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which variant a show is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowKind {
    Movie,
    Series,
}

impl ShowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowKind::Movie => "movie",
            ShowKind::Series => "series",
        }
    }
}

/// Attributes shared by both show variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetails {
    pub name: String,
    pub description: String,
    pub genres: GenreSet,
    pub release_date: NaiveDate,
}

/// A movie or a series, each with its own id space
#[derive(Debug, Clone, PartialEq)]
pub enum Show {
    Movie { movie_id: i64, details: ShowDetails },
    Series { series_id: i64, details: ShowDetails },
}

impl Show {
    pub fn kind(&self) -> ShowKind {
        match self {
            Show::Movie { .. } => ShowKind::Movie,
            Show::Series { .. } => ShowKind::Series,
        }
    }

    /// Id within the variant's own id space
    pub fn variant_id(&self) -> i64 {
        match self {
            Show::Movie { movie_id, .. } => *movie_id,
            Show::Series { series_id, .. } => *series_id,
        }
    }

    pub fn details(&self) -> &ShowDetails {
        match self {
            Show::Movie { details, .. } | Show::Series { details, .. } => details,
        }
    }
}

/// A show together with the unified id that resolves to it
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub show_id: ShowId,
    pub show: Show,
}

impl CatalogEntry {
    pub fn card(&self) -> ShowCard {
        ShowCard::from(self)
    }
}

/// Read-only snapshot of every show
///
/// Iteration order is the store's order: movies by movie id, then series by
/// series id. Recommendation truncation depends on this order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<ShowId, usize>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.show_id, position))
            .collect();
        Self { entries, index }
    }

    /// Resolves a unified show id to its movie or series
    pub fn resolve(&self, show_id: ShowId) -> Option<&CatalogEntry> {
        self.index.get(&show_id).map(|&position| &self.entries[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn movies(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.of_kind(ShowKind::Movie)
    }

    pub fn series(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.of_kind(ShowKind::Series)
    }

    pub fn of_kind(&self, kind: ShowKind) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.show.kind() == kind)
    }
}

/// Flattened show representation returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShowCard {
    pub show_id: ShowId,
    pub kind: ShowKind,
    pub name: String,
    pub description: String,
    pub genres: GenreSet,
    pub release_date: NaiveDate,
}

impl From<&CatalogEntry> for ShowCard {
    fn from(entry: &CatalogEntry) -> Self {
        let details = entry.show.details();
        Self {
            show_id: entry.show_id,
            kind: entry.show.kind(),
            name: details.name.clone(),
            description: details.description.clone(),
            genres: details.genres.clone(),
            release_date: details.release_date,
        }
    }
}

/// Show definition submitted through the admin endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct NewShow {
    pub kind: ShowKind,
    #[serde(flatten)]
    pub details: ShowDetails,
}

/// Show definition whose genres are still legacy serialized text
#[derive(Debug, Clone, Deserialize)]
pub struct RawShow {
    pub kind: ShowKind,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub genre: String,
    pub release_date: NaiveDate,
}
