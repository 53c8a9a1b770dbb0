use std::io::Cursor;

use camino::Utf8Path;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use tracing::debug;

use crate::domain::{AlbumMetadata, Track, TrackKind};
use crate::error::RemixError;

pub const COVER_SIZE: u32 = 800;

/// Album cover, resized to a square and re-encoded as JPEG.
#[derive(Debug, Clone)]
pub struct CoverArt {
    jpeg: Vec<u8>,
}

impl CoverArt {
    pub fn from_image_bytes(bytes: &[u8]) -> Result<Self, RemixError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|err| RemixError::CoverArt(err.to_string()))?;
        let resized = decoded.resize_exact(COVER_SIZE, COVER_SIZE, FilterType::Lanczos3);
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut jpeg = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .map_err(|err| RemixError::CoverArt(err.to_string()))?;
        Ok(Self { jpeg })
    }

    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    pub track_number: u32,
    pub disc_number: u32,
    pub comment: Option<String>,
}

impl TrackTags {
    /// Instrumentals go on disc 2 so both versions can share one library album.
    pub fn for_track(track: &Track, album: &AlbumMetadata, kind: TrackKind) -> Self {
        let disc_number = match kind {
            TrackKind::Original => 1,
            TrackKind::Instrumental => 2,
        };
        Self {
            title: track.display_name(kind),
            artist: album.artist_name.clone(),
            album_artist: album.album_artist.clone(),
            album: album.album_name.clone(),
            genre: album.genre.clone(),
            year: album.year,
            track_number: track.track_number.get(),
            disc_number,
            comment: track.comment.clone(),
        }
    }
}

pub trait Tagger {
    /// Writes `tags` (and the cover, when there is one) into the audio file at `path`.
    fn apply(
        &self,
        path: &Utf8Path,
        tags: &TrackTags,
        cover: Option<&CoverArt>,
    ) -> Result<(), RemixError>;
}

impl<T: Tagger + ?Sized> Tagger for &T {
    fn apply(
        &self,
        path: &Utf8Path,
        tags: &TrackTags,
        cover: Option<&CoverArt>,
    ) -> Result<(), RemixError> {
        (**self).apply(path, tags, cover)
    }
}

/// Tags MP4 and FLAC files in place. The container is sniffed from the content,
/// so staging files with a `.temp` suffix work.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagger;

impl Tagger for LoftyTagger {
    fn apply(
        &self,
        path: &Utf8Path,
        tags: &TrackTags,
        cover: Option<&CoverArt>,
    ) -> Result<(), RemixError> {
        let mut tagged = Probe::open(path.as_std_path())
            .map_err(|err| RemixError::Tagging(format!("open {path}: {err}")))?
            .guess_file_type()
            .map_err(|err| RemixError::Tagging(format!("detect format of {path}: {err}")))?
            .read()
            .map_err(|err| RemixError::Tagging(format!("read {path}: {err}")))?;

        if tagged.primary_tag().is_none() {
            let tag_type = tagged.primary_tag_type();
            tagged.insert_tag(Tag::new(tag_type));
        }
        let Some(tag) = tagged.primary_tag_mut() else {
            return Err(RemixError::Tagging(format!("{path}: no writable tag")));
        };

        tag.set_title(tags.title.clone());
        tag.set_track(tags.track_number);
        tag.set_disk(tags.disc_number);
        if let Some(artist) = &tags.artist {
            tag.set_artist(artist.clone());
        }
        if let Some(album_artist) = &tags.album_artist {
            tag.insert_text(ItemKey::AlbumArtist, album_artist.clone());
        }
        if let Some(album) = &tags.album {
            tag.set_album(album.clone());
        }
        if let Some(genre) = &tags.genre {
            tag.set_genre(genre.clone());
        }
        if let Some(year) = tags.year {
            tag.set_year(year);
        }
        if let Some(comment) = &tags.comment {
            tag.set_comment(comment.clone());
        }
        if let Some(cover) = cover {
            tag.remove_picture_type(PictureType::CoverFront);
            tag.push_picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(MimeType::Jpeg),
                None,
                cover.jpeg().to_vec(),
            ));
        }

        tagged
            .save_to_path(path.as_std_path(), WriteOptions::default())
            .map_err(|err| RemixError::Tagging(format!("save {path}: {err}")))?;
        debug!(%path, title = %tags.title, "tags written");
        Ok(())
    }
}
