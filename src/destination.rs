use std::ffi::OsStr;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{AudioFormat, Track, TrackKind};
use crate::error::RemixError;

const TEMP_SUFFIX: &str = ".temp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PrepareOutcome {
    Created,
    Cleaned { removed: Vec<String> },
}

/// The album folder that receives one file per track.
#[derive(Debug, Clone)]
pub struct Destination {
    root: Utf8PathBuf,
    kind: TrackKind,
    format: AudioFormat,
}

impl Destination {
    pub fn new(root: impl Into<Utf8PathBuf>, kind: TrackKind, format: AudioFormat) -> Self {
        Self {
            root: root.into(),
            kind,
            format,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn final_path(&self, track: &Track) -> Utf8PathBuf {
        self.root
            .join(format!("{}.{}", track.file_stem(self.kind), self.format.extension()))
    }

    pub fn temp_path(&self, track: &Track) -> Utf8PathBuf {
        let mut path = self.final_path(track).into_string();
        path.push_str(TEMP_SUFFIX);
        Utf8PathBuf::from(path)
    }

    /// True for finished artifacts and leftover staging files of this format.
    /// Matches on raw bytes, so names that are not valid UTF-8 are still recognised.
    pub fn is_artifact(&self, file_name: impl AsRef<OsStr>) -> bool {
        let name = file_name.as_ref().as_encoded_bytes();
        let ext = format!(".{}", self.format.extension());
        let staged = format!("{ext}{TEMP_SUFFIX}");
        name.ends_with(ext.as_bytes()) || name.ends_with(staged.as_bytes())
    }

    /// Creates the folder, or removes artifacts left by an earlier run.
    /// Only direct children are considered and anything else is left alone.
    pub fn prepare(&self) -> Result<PrepareOutcome, RemixError> {
        if !self.root.as_std_path().exists() {
            fs::create_dir_all(self.root.as_std_path()).map_err(|err| {
                RemixError::Filesystem(format!("create {}: {err}", self.root))
            })?;
            info!(path = %self.root, "created destination folder");
            return Ok(PrepareOutcome::Created);
        }

        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| RemixError::Filesystem(format!("read {}: {err}", self.root)))?;
        let mut removed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| RemixError::Filesystem(err.to_string()))?;
            let file_type = entry
                .file_type()
                .map_err(|err| RemixError::Filesystem(err.to_string()))?;
            if file_type.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            if !self.is_artifact(&file_name) {
                continue;
            }
            let name = file_name.to_string_lossy().into_owned();
            fs::remove_file(entry.path()).map_err(|err| {
                RemixError::Filesystem(format!("remove {}: {err}", entry.path().display()))
            })?;
            debug!(file = %name, "removed previous download");
            removed.push(name);
        }
        removed.sort();
        info!(path = %self.root, removed = removed.len(), "cleaned destination folder");
        Ok(PrepareOutcome::Cleaned { removed })
    }

    /// Moves a fully written staging file onto its final name, replacing any earlier copy.
    pub fn promote(&self, temp: &Utf8Path, target: &Utf8Path) -> Result<(), RemixError> {
        fs::rename(temp.as_std_path(), target.as_std_path()).map_err(|err| {
            RemixError::Filesystem(format!("rename {temp} -> {target}: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrackNumber;

    fn track(number: u32, name: &str) -> Track {
        Track {
            track_number: TrackNumber::try_from(number).unwrap(),
            track_name: name.to_string(),
            file_url: "https://x/a.flac".to_string(),
            inst_url: None,
            start_date: None,
            comment: None,
        }
    }

    #[test]
    fn layout_paths() {
        let dest = Destination::new("/music/remixes", TrackKind::Original, AudioFormat::M4a);
        let track = track(1, "Bring Me To Life");
        assert_eq!(
            dest.final_path(&track),
            Utf8PathBuf::from("/music/remixes/01 - Bring Me To Life.m4a")
        );
        assert_eq!(
            dest.temp_path(&track),
            Utf8PathBuf::from("/music/remixes/01 - Bring Me To Life.m4a.temp")
        );
    }

    #[test]
    fn artifact_matching_is_suffix_based() {
        let dest = Destination::new("/music", TrackKind::Original, AudioFormat::M4a);
        assert!(dest.is_artifact("01 - X.m4a"));
        assert!(dest.is_artifact("02 - Y.m4a.temp"));
        assert!(!dest.is_artifact("notes.txt"));
        assert!(!dest.is_artifact("03 - Z.flac"));
        assert!(!dest.is_artifact("cover.m4a.jpg"));
    }
}
