use std::fs::File;
use std::io::{self, BufWriter};

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::COVER_TIMEOUT;
use crate::destination::Destination;
use crate::domain::{AlbumMetadata, Track, TrackKind, validate_track_name};
use crate::error::RemixError;
use crate::http::{build_client, handle_status};
use crate::tagging::{CoverArt, Tagger, TrackTags};

pub trait AudioClient {
    /// Streams the body at `url` into a newly created file at `destination`,
    /// returning the number of bytes written.
    fn download_to(&self, url: &str, destination: &Utf8Path) -> Result<u64, RemixError>;

    /// Fetches a small body, such as cover art, into memory.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, RemixError>;
}

impl<T: AudioClient + ?Sized> AudioClient for &T {
    fn download_to(&self, url: &str, destination: &Utf8Path) -> Result<u64, RemixError> {
        (**self).download_to(url, destination)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, RemixError> {
        (**self).fetch_bytes(url)
    }
}

#[derive(Clone)]
pub struct AudioHttpClient {
    client: Client,
}

impl AudioHttpClient {
    pub fn new() -> Result<Self, RemixError> {
        Ok(Self {
            client: build_client()?,
        })
    }
}

impl AudioClient for AudioHttpClient {
    fn download_to(&self, url: &str, destination: &Utf8Path) -> Result<u64, RemixError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| RemixError::Network(err.to_string()))?;
        let mut response = handle_status(response)?;
        let file = File::create(destination.as_std_path())
            .map_err(|err| RemixError::Filesystem(format!("create {destination}: {err}")))?;
        let mut writer = BufWriter::new(file);
        let bytes =
            io::copy(&mut response, &mut writer).map_err(|err| copy_error(err, destination))?;
        let file = writer.into_inner().map_err(|err| {
            RemixError::Filesystem(format!("flush {destination}: {}", err.error()))
        })?;
        file.sync_all()
            .map_err(|err| RemixError::Filesystem(format!("sync {destination}: {err}")))?;
        Ok(bytes)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, RemixError> {
        let response = self
            .client
            .get(url)
            .timeout(COVER_TIMEOUT)
            .send()
            .map_err(|err| RemixError::Network(err.to_string()))?;
        let response = handle_status(response)?;
        let body = response
            .bytes()
            .map_err(|err| RemixError::Network(err.to_string()))?;
        Ok(body.to_vec())
    }
}

// io::copy reports read and write failures alike; reqwest surfaces body read
// errors as io::Error wrapping its own error type.
fn copy_error(err: io::Error, destination: &Utf8Path) -> RemixError {
    let from_network = err
        .get_ref()
        .is_some_and(|inner| inner.is::<reqwest::Error>());
    if from_network {
        RemixError::Network(err.to_string())
    } else {
        RemixError::Filesystem(format!("write {destination}: {err}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackOutcome {
    pub number: u32,
    pub name: String,
    pub url: String,
    pub path: Utf8PathBuf,
    pub bytes: u64,
}

/// Album-wide inputs for tagging, shared by every track of a run.
#[derive(Debug, Clone, Copy)]
pub struct TagSource<'a> {
    pub album: &'a AlbumMetadata,
    pub cover: Option<&'a CoverArt>,
}

/// Downloads one track to its staging file, tags it there, and promotes it only
/// after both steps succeed.
pub struct TrackDownloader<'a, A: AudioClient, T: Tagger> {
    client: &'a A,
    tagger: &'a T,
    destination: &'a Destination,
    kind: TrackKind,
    tags: TagSource<'a>,
}

impl<'a, A: AudioClient, T: Tagger> TrackDownloader<'a, A, T> {
    pub fn new(
        client: &'a A,
        tagger: &'a T,
        destination: &'a Destination,
        kind: TrackKind,
        tags: TagSource<'a>,
    ) -> Self {
        Self {
            client,
            tagger,
            destination,
            kind,
            tags,
        }
    }

    pub fn download_track(&self, track: &Track) -> Result<TrackOutcome, RemixError> {
        validate_track_name(&track.track_name)?;
        let url = track.source_url(self.kind, self.destination.format())?;
        let temp_path = self.destination.temp_path(track);
        let final_path = self.destination.final_path(track);

        info!(track = track.track_number.get(), %url, "downloading");
        let staged = self.client.download_to(&url, &temp_path).and_then(|bytes| {
            let tags = TrackTags::for_track(track, self.tags.album, self.kind);
            self.tagger
                .apply(&temp_path, &tags, self.tags.cover)
                .map(|()| bytes)
        });
        let bytes = match staged {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(
                    track = track.track_number.get(),
                    error = %err,
                    staged = %temp_path,
                    "download failed"
                );
                return Err(err);
            }
        };

        self.destination.promote(&temp_path, &final_path)?;
        info!(path = %final_path, bytes, "installed");

        Ok(TrackOutcome {
            number: track.track_number.get(),
            name: track.display_name(self.kind),
            url,
            path: final_path,
            bytes,
        })
    }
}
