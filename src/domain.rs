use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RemixError;

const INSTRUMENTAL_SUFFIX: &str = " (Instrumental)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Apple Lossless in an MPEG-4 container.
    #[default]
    M4a,
    Flac,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::M4a => "m4a",
            AudioFormat::Flac => "flac",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AudioFormat::M4a => "Apple Lossless",
            AudioFormat::Flac => "FLAC",
        }
    }

    fn counterpart(self) -> AudioFormat {
        match self {
            AudioFormat::M4a => AudioFormat::Flac,
            AudioFormat::Flac => AudioFormat::M4a,
        }
    }

    /// Swaps a trailing `.flac`/`.m4a` on the URL for this format's extension.
    /// URLs ending in anything else come back unchanged.
    pub fn rewrite_url(self, url: &str) -> String {
        let other = format!(".{}", self.counterpart().extension());
        match url.strip_suffix(&other) {
            Some(base) => format!("{base}.{}", self.extension()),
            None => url.to_string(),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    #[default]
    Original,
    Instrumental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TrackOrder {
    /// Playlist order, ascending by track number.
    #[default]
    TrackNumber,
    /// Chronological by the date work on the remix started.
    StartDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TrackNumber(u32);

impl TrackNumber {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for TrackNumber {
    type Error = RemixError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(RemixError::InvalidTrackNumber(value.to_string()));
        }
        Ok(Self(value))
    }
}

impl From<TrackNumber> for u32 {
    fn from(value: TrackNumber) -> Self {
        value.0
    }
}

impl FromStr for TrackNumber {
    type Err = RemixError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let number = value
            .trim()
            .parse::<u32>()
            .map_err(|_| RemixError::InvalidTrackNumber(value.to_string()))?;
        Self::try_from(number)
    }
}

impl fmt::Display for TrackNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track_number: TrackNumber,
    pub track_name: String,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, rename = "comments", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Track {
    pub fn display_name(&self, kind: TrackKind) -> String {
        match kind {
            TrackKind::Instrumental if !self.track_name.ends_with(INSTRUMENTAL_SUFFIX) => {
                format!("{}{INSTRUMENTAL_SUFFIX}", self.track_name)
            }
            _ => self.track_name.clone(),
        }
    }

    /// `NN - Name`, the basename shared by the final and staging files.
    pub fn file_stem(&self, kind: TrackKind) -> String {
        format!("{} - {}", self.track_number, self.display_name(kind))
    }

    pub fn source_url(&self, kind: TrackKind, format: AudioFormat) -> Result<String, RemixError> {
        let raw = match kind {
            TrackKind::Original => self.file_url.as_str(),
            TrackKind::Instrumental => self
                .inst_url
                .as_deref()
                .ok_or(RemixError::MissingInstrumental(self.track_number.get()))?,
        };
        let rewritten = format.rewrite_url(raw.trim());
        Url::parse(&rewritten).map_err(|err| RemixError::InvalidUrl(format!("{rewritten}: {err}")))?;
        Ok(rewritten)
    }
}

/// Rejects names that would escape the destination folder or cannot name a file.
pub fn validate_track_name(name: &str) -> Result<&str, RemixError> {
    let trimmed = name.trim();
    let is_valid = !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !name.contains(['/', '\\', '\0']);
    if !is_valid {
        return Err(RemixError::InvalidTrackName(name.to_string()));
    }
    Ok(name)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_art_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub metadata: AlbumMetadata,
    pub tracks: Vec<Track>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Stable sort; tracks that compare equal keep their manifest order.
    pub fn sort_tracks(&mut self, order: TrackOrder) {
        match order {
            TrackOrder::TrackNumber => self.tracks.sort_by_key(|track| track.track_number),
            TrackOrder::StartDate => self.tracks.sort_by(|a, b| {
                let left = a.start_date.as_deref().unwrap_or("");
                let right = b.start_date.as_deref().unwrap_or("");
                left.cmp(right)
            }),
        }
    }

    pub fn album_name(&self) -> &str {
        self.metadata.album_name.as_deref().unwrap_or("Unknown Album")
    }
}
