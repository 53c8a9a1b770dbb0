use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;

use crate::domain::{AudioFormat, TrackKind, TrackOrder};
use crate::error::RemixError;

pub const MANIFEST_URL: &str =
    "https://gitlab.dannystewart.com/danny/evremixes/raw/main/evtracks.json";
pub const ALBUM_FOLDER: &str = "Evanescence Remixes";

pub const MANIFEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const COVER_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_folder: Utf8PathBuf,
    pub manifest_url: String,
    pub kind: TrackKind,
    pub format: AudioFormat,
    pub order: TrackOrder,
}

/// Values supplied on the command line; anything left `None` falls back to the default.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub output_folder: Option<Utf8PathBuf>,
    pub manifest_url: Option<String>,
    pub instrumentals: bool,
    pub format: Option<AudioFormat>,
    pub order: Option<TrackOrder>,
}

impl RunConfig {
    pub fn resolve(overrides: RunOverrides) -> Result<Self, RemixError> {
        let output_folder = match overrides.output_folder {
            Some(path) => path,
            None => default_output_folder()?,
        };
        let mut config = Self::for_folder(output_folder);
        if let Some(url) = overrides.manifest_url {
            config.manifest_url = url;
        }
        if overrides.instrumentals {
            config.kind = TrackKind::Instrumental;
        }
        if let Some(format) = overrides.format {
            config.format = format;
        }
        if let Some(order) = overrides.order {
            config.order = order;
        }
        Ok(config)
    }

    pub fn for_folder(output_folder: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
            manifest_url: MANIFEST_URL.to_string(),
            kind: TrackKind::default(),
            format: AudioFormat::default(),
            order: TrackOrder::default(),
        }
    }
}

/// `~/Downloads/Evanescence Remixes`
pub fn default_output_folder() -> Result<Utf8PathBuf, RemixError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join("Downloads").join(ALBUM_FOLDER)).ok()
        })
        .ok_or(RemixError::HomeDirUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let config = RunConfig::resolve(RunOverrides {
            output_folder: Some(Utf8PathBuf::from("/tmp/remixes")),
            manifest_url: None,
            instrumentals: true,
            format: Some(AudioFormat::Flac),
            order: None,
        })
        .unwrap();

        assert_eq!(config.output_folder, Utf8PathBuf::from("/tmp/remixes"));
        assert_eq!(config.manifest_url, MANIFEST_URL);
        assert_eq!(config.kind, TrackKind::Instrumental);
        assert_eq!(config.format, AudioFormat::Flac);
        assert_eq!(config.order, TrackOrder::TrackNumber);
    }
}
