//! Media metadata models.
//!
//! The backend exposes two media kinds, movies and episodes, through separate
//! endpoints. Kind-specific fields (library folder layout for movies, show and
//! season structure for episodes) live on the variant structs; everything the
//! encoding path needs is reachable through the [`MediaItem`] accessors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// The kind of media a job refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Episode,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "episode",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown media kind string.
#[derive(Debug, Error)]
#[error("unknown media kind: {0}")]
pub struct MediaKindParseError(pub String);

impl FromStr for MediaKind {
    type Err = MediaKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "episode" => Ok(MediaKind::Episode),
            other => Err(MediaKindParseError(other.to_string())),
        }
    }
}

/// Movie metadata as returned by the movie endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub year: Option<String>,
    pub resolution: Option<i32>,
    pub height: Option<i32>,
    pub width: Option<i32>,
    pub duration: Option<i32>,
    pub codec: Option<String>,
    pub filename: String,
    pub filetype: String,
    pub folder_name: String,
    pub is_optimized: bool,
}

/// Show metadata embedded in an episode record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: Option<i64>,
    pub name: String,
    pub folder_name: String,
}

/// Episode metadata as returned by the episode endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub tvdb_id: Option<i64>,
    pub title: String,
    pub date: Option<String>,
    pub number: i32,
    pub season: i32,
    pub show: Show,
    pub filename: String,
    pub filetype: String,
    pub height: Option<i32>,
    pub width: Option<i32>,
    pub duration: Option<i32>,
    pub codec: Option<String>,
    pub resolution: Option<i32>,
    pub is_optimized: bool,
}

/// A media record of either kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaItem {
    Movie(Movie),
    Episode(Episode),
}

impl MediaItem {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaItem::Movie(_) => MediaKind::Movie,
            MediaItem::Episode(_) => MediaKind::Episode,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            MediaItem::Movie(m) => m.id,
            MediaItem::Episode(e) => e.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaItem::Movie(m) => &m.title,
            MediaItem::Episode(e) => &e.title,
        }
    }

    /// Source file extension, without a leading dot.
    pub fn filetype(&self) -> &str {
        match self {
            MediaItem::Movie(m) => &m.filetype,
            MediaItem::Episode(e) => &e.filetype,
        }
    }

    pub fn is_optimized(&self) -> bool {
        match self {
            MediaItem::Movie(m) => m.is_optimized,
            MediaItem::Episode(e) => e.is_optimized,
        }
    }

    /// Path of the source file relative to its library root.
    ///
    /// Movies live in a flat per-movie folder; episodes are nested under the
    /// show folder and a per-season directory.
    pub fn library_relative_path(&self) -> PathBuf {
        match self {
            MediaItem::Movie(m) => PathBuf::from(&m.folder_name).join(&m.filename),
            MediaItem::Episode(e) => PathBuf::from(&e.show.folder_name)
                .join(format!("Season {}", e.season))
                .join(&e.filename),
        }
    }
}
