//! Tag extraction from audio files.

use super::error::ScanError;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use std::path::Path;

/// Tag values read from one audio file. Absent tags stay `None`; the
/// pipeline only persists what was actually present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    pub track: Option<u32>,
    pub track_total: Option<u32>,
    pub disk: Option<u32>,
    pub disk_total: Option<u32>,
}

/// Seam between the pipeline and the tag parser, so tests can feed
/// synthetic tags without producing real encoded audio.
pub trait MetadataReader {
    fn read_tags(&self, path: &Path) -> Result<SongTags, ScanError>;
}

/// Production reader backed by lofty's format-probing parser.
#[derive(Debug, Default)]
pub struct LoftyReader;

impl MetadataReader for LoftyReader {
    fn read_tags(&self, path: &Path) -> Result<SongTags, ScanError> {
        let tagged_file = Probe::open(path)
            .map_err(|e| ScanError::Tags {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
            .read()
            .map_err(|e| ScanError::Tags {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());
        let tags = match tag {
            Some(tag) => SongTags {
                title: tag.title().map(|s| s.to_string()),
                artist: tag.artist().map(|s| s.to_string()),
                album_artist: tag
                    .get_string(&ItemKey::AlbumArtist)
                    .map(|s| s.to_string()),
                album: tag.album().map(|s| s.to_string()),
                genre: tag.genre().map(|s| s.to_string()),
                year: tag.year(),
                track: tag.track(),
                track_total: tag.track_total(),
                disk: tag.disk(),
                disk_total: tag.disk_total(),
            },
            None => SongTags::default(),
        };
        Ok(tags)
    }
}
