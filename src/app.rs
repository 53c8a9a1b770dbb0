use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::destination::{Destination, PrepareOutcome};
use crate::domain::{AlbumMetadata, AudioFormat, TrackKind};
use crate::download::{AudioClient, TagSource, TrackDownloader, TrackOutcome};
use crate::error::RemixError;
use crate::manifest::ManifestClient;
use crate::tagging::{CoverArt, Tagger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Info,
    Notice,
    TrackStarted,
    TrackDone,
    TrackFailed,
    Finished,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            elapsed: None,
        }
    }

    fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackFailure {
    pub number: u32,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub album: String,
    pub output_folder: Utf8PathBuf,
    pub format: AudioFormat,
    pub kind: TrackKind,
    pub prepare: PrepareOutcome,
    pub cover_art: bool,
    pub total: usize,
    pub downloaded: Vec<TrackOutcome>,
    pub failed: Vec<TrackFailure>,
    pub started_at: String,
    pub finished_at: String,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct App<M: ManifestClient, A: AudioClient, T: Tagger> {
    config: RunConfig,
    manifest: M,
    audio: A,
    tagger: T,
}

impl<M: ManifestClient, A: AudioClient, T: Tagger> App<M, A, T> {
    pub fn new(config: RunConfig, manifest: M, audio: A, tagger: T) -> Self {
        Self {
            config,
            manifest,
            audio,
            tagger,
        }
    }

    /// Prepares the folder, fetches the manifest and downloads every track in order.
    /// Only destination and manifest failures abort the run; a failed track is
    /// recorded in the report and the loop moves on.
    pub fn run(&self, sink: &dyn ProgressSink) -> Result<RunReport, RemixError> {
        let started_at = timestamp();
        let run_start = Instant::now();
        let destination = Destination::new(
            self.config.output_folder.clone(),
            self.config.kind,
            self.config.format,
        );

        sink.event(ProgressEvent::new(
            EventKind::Info,
            format!(
                "Downloading in {} to {}...",
                self.config.format.display_name(),
                destination.root()
            ),
        ));

        let prepare = destination.prepare()?;
        match &prepare {
            PrepareOutcome::Created => sink.event(ProgressEvent::new(
                EventKind::Notice,
                format!("Created {}", destination.root()),
            )),
            PrepareOutcome::Cleaned { removed } => sink.event(ProgressEvent::new(
                EventKind::Notice,
                format!(
                    "Folder already exists; removed {} previous download(s)",
                    removed.len()
                ),
            )),
        }

        let mut manifest = self.manifest.fetch_manifest()?;
        manifest.sort_tracks(self.config.order);
        let total = manifest.tracks.len();
        info!(album = manifest.album_name(), tracks = total, "manifest loaded");

        let cover = self.load_cover(&manifest.metadata, sink);
        let downloader = TrackDownloader::new(
            &self.audio,
            &self.tagger,
            &destination,
            self.config.kind,
            TagSource {
                album: &manifest.metadata,
                cover: cover.as_ref(),
            },
        );
        let mut downloaded = Vec::with_capacity(total);
        let mut failed = Vec::new();
        for (index, track) in manifest.tracks.iter().enumerate() {
            let name = track.display_name(self.config.kind);
            sink.event(ProgressEvent::new(
                EventKind::TrackStarted,
                format!("Downloading {name}... ({}/{total})", index + 1),
            ));
            let track_start = Instant::now();
            match downloader.download_track(track) {
                Ok(outcome) => {
                    sink.event(
                        ProgressEvent::new(EventKind::TrackDone, format!("Downloaded {name}"))
                            .with_elapsed(track_start.elapsed()),
                    );
                    downloaded.push(outcome);
                }
                Err(err) => {
                    sink.event(
                        ProgressEvent::new(
                            EventKind::TrackFailed,
                            format!("Failed to download {name}: {err}"),
                        )
                        .with_elapsed(track_start.elapsed()),
                    );
                    failed.push(TrackFailure {
                        number: track.track_number.get(),
                        name,
                        error: err.to_string(),
                    });
                }
            }
        }

        sink.event(
            ProgressEvent::new(
                EventKind::Finished,
                format!(
                    "All {total} remixes processed in {} to {}.",
                    self.config.format.display_name(),
                    destination.root()
                ),
            )
            .with_elapsed(run_start.elapsed()),
        );

        Ok(RunReport {
            album: manifest.album_name().to_string(),
            output_folder: destination.root().to_path_buf(),
            format: self.config.format,
            kind: self.config.kind,
            prepare,
            cover_art: cover.is_some(),
            total,
            downloaded,
            failed,
            started_at,
            finished_at: timestamp(),
        })
    }

    /// Fetched once per run. A missing or broken cover only costs the artwork;
    /// tracks are still tagged and installed without it.
    fn load_cover(&self, album: &AlbumMetadata, sink: &dyn ProgressSink) -> Option<CoverArt> {
        let url = album.cover_art_url.as_deref()?;
        let cover = self
            .audio
            .fetch_bytes(url)
            .and_then(|bytes| CoverArt::from_image_bytes(&bytes));
        match cover {
            Ok(cover) => Some(cover),
            Err(err) => {
                warn!(%url, error = %err, "cover art unavailable");
                sink.event(ProgressEvent::new(
                    EventKind::Notice,
                    format!("Cover art unavailable: {err}"),
                ));
                None
            }
        }
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
