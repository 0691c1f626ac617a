//! The ingestion pipeline: walk a library tree, classify each file by
//! content, extract tags, probe duration and persist the resulting rows.
//!
//! Every step is idempotent. A file whose song row already exists skips
//! straight to library linkage; artists, albums and genres resolve by
//! natural key before anything is inserted. Re-running a scan over an
//! unchanged tree adds zero rows.

use super::classify::{self, MediaKind};
use super::error::ScanError;
use super::metadata::{LoftyReader, MetadataReader, SongTags};
use super::paths;
use super::probe::{DurationProbe, FfprobeDurationProbe};
use crate::store::{
    Album, Artist, Genre, Image, ImageInAlbum, Library, MediaStore, NullInt, NullText, Song,
};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counters for one library scan. Failures are per-file; they are logged
/// and never abort the walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub songs_added: usize,
    pub songs_skipped: usize,
    pub images_added: usize,
    pub failures: usize,
}

enum SongOutcome {
    Added,
    Skipped,
}

pub struct Scanner<'a> {
    store: &'a MediaStore,
    reader: Box<dyn MetadataReader>,
    probe: Box<dyn DurationProbe>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        store: &'a MediaStore,
        reader: Box<dyn MetadataReader>,
        probe: Box<dyn DurationProbe>,
    ) -> Self {
        Self {
            store,
            reader,
            probe,
        }
    }

    /// Production wiring: lofty for tags, an external inspector process for
    /// durations.
    pub fn with_default_tooling(
        store: &'a MediaStore,
        probe_command: &str,
    ) -> Result<Self, ScanError> {
        Ok(Self::new(
            store,
            Box::new(LoftyReader),
            Box::new(FfprobeDurationProbe::new(probe_command)?),
        ))
    }

    /// Walk one library tree and ingest everything in it.
    pub fn scan_library(&self, library: &Library) -> Result<ScanReport, ScanError> {
        let root_text = library
            .fs_path
            .get()
            .ok_or_else(|| ScanError::NoRoot(library.name.to_string()))?
            .to_string();
        let root = Path::new(&root_text);
        info!(library = %library.name, root = %root.display(), "scanning library");

        let mut report = ScanReport::default();
        // Images are collected and registered after the walk so that album
        // rows exist before artwork tries to attach to them.
        let mut images = Vec::new();

        for entry in WalkDir::new(root) {
            // Per-file errors are tolerated below; failing to traverse the
            // tree itself is not.
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            match classify::classify_file(path) {
                Ok(Some(MediaKind::Audio)) => match self.process_song(path, library, root) {
                    Ok(SongOutcome::Added) => report.songs_added += 1,
                    Ok(SongOutcome::Skipped) => report.songs_skipped += 1,
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "skipping song");
                        report.failures += 1;
                    }
                },
                Ok(Some(MediaKind::Image)) => images.push(path.to_path_buf()),
                Ok(None) => debug!(path = %path.display(), "not media, ignored"),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot read file");
                    report.failures += 1;
                }
            }
        }

        for path in images {
            match self.register_image(&path) {
                Ok(true) => report.images_added += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping image");
                    report.failures += 1;
                }
            }
        }

        info!(
            library = %library.name,
            added = report.songs_added,
            skipped = report.songs_skipped,
            images = report.images_added,
            failures = report.failures,
            "scan finished"
        );
        Ok(report)
    }

    /// Scan every registered library in turn. One library failing does not
    /// stop the others.
    pub fn scan_all(&self) -> Result<Vec<(Library, ScanReport)>, ScanError> {
        let libraries = self.store.libraries()?;
        let mut reports = Vec::with_capacity(libraries.len());
        for library in libraries {
            match self.scan_library(&library) {
                Ok(report) => reports.push((library, report)),
                Err(err) => warn!(library = %library.name, error = %err, "library scan failed"),
            }
        }
        Ok(reports)
    }

    fn process_song(
        &self,
        path: &Path,
        library: &Library,
        root: &Path,
    ) -> Result<SongOutcome, ScanError> {
        let path_text = path.to_string_lossy().to_string();

        // Dedup before any metadata work: a song already catalogued under
        // this path only needs its library link checked.
        let by_path = Song {
            fs_path: NullText::new(path_text.as_str()),
            ..Default::default()
        };
        if let Some(existing) = self.store.read(&by_path, &[])?.first() {
            self.store.add_song_to_library(existing, library)?;
            return Ok(SongOutcome::Skipped);
        }

        let tags = self.reader.read_tags(path)?;
        let size = std::fs::metadata(path)?.len() as i64;
        let duration = self.probe.duration_seconds(path)?;

        let genre_id = self.resolve_genre(&tags)?;
        let artist_path = paths::artist_dir(path, root);
        let artist_id = match artist_path {
            Some(dir) => self.resolve_artist(dir, tags.album_artist.as_deref())?,
            None => NullInt::default(),
        };
        let album_id = match artist_path.and_then(|dir| paths::album_dir(path, dir)) {
            Some(dir) => self.resolve_album(dir, artist_id, &tags)?,
            None => NullInt::default(),
        };

        let mut song = Song {
            album: album_id,
            genre: genre_id,
            fs_path: NullText::new(path_text),
            title: tags.title.clone().into(),
            track: positive(tags.track),
            num_tracks: positive(tags.track_total),
            disk: positive(tags.disk),
            num_disks: positive(tags.disk_total),
            size: NullInt::new(size),
            duration: duration.into(),
            artist: tags.artist.clone().into(),
            ..Default::default()
        };
        self.store.create(&mut song, &["id"])?;
        self.store.add_song_to_library(&song, library)?;
        debug!(path = %song.fs_path, "song catalogued");
        Ok(SongOutcome::Added)
    }

    /// Get-or-create by name. Empty and absent genre tags produce no row.
    fn resolve_genre(&self, tags: &SongTags) -> Result<NullInt, ScanError> {
        let name = match tags.genre.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name,
            None => return Ok(NullInt::default()),
        };
        let mut genre = Genre {
            name: NullText::new(name),
            ..Default::default()
        };
        self.store.create(&mut genre, &["id"])?;
        Ok(genre.id)
    }

    /// Get-or-create by directory path. The path alone is the natural key;
    /// the tag name only seeds a newly created row.
    fn resolve_artist(&self, dir: &Path, name: Option<&str>) -> Result<NullInt, ScanError> {
        let by_path = Artist {
            fs_path: NullText::new(dir.to_string_lossy()),
            ..Default::default()
        };
        if let Some(found) = self.store.read(&by_path, &[])?.pop() {
            return Ok(found.id);
        }
        let mut artist = Artist {
            name: name.map(str::to_string).into(),
            fs_path: NullText::new(dir.to_string_lossy()),
            ..Default::default()
        };
        self.store.create(&mut artist, &["id"])?;
        Ok(artist.id)
    }

    /// Get-or-create by directory path, seeded from the first song's tags.
    fn resolve_album(
        &self,
        dir: &Path,
        artist_id: NullInt,
        tags: &SongTags,
    ) -> Result<NullInt, ScanError> {
        let by_path = Album {
            fs_path: NullText::new(dir.to_string_lossy()),
            ..Default::default()
        };
        if let Some(found) = self.store.read(&by_path, &[])?.pop() {
            return Ok(found.id);
        }
        let mut album = Album {
            artist: artist_id,
            release_year: positive(tags.year),
            num_tracks: positive(tags.track_total),
            num_disks: positive(tags.disk_total),
            title: tags.album.clone().into(),
            fs_path: NullText::new(dir.to_string_lossy()),
            ..Default::default()
        };
        self.store.create(&mut album, &["id"])?;
        Ok(album.id)
    }

    /// Register an image row and, when the image sits in a catalogued album
    /// directory, attach it to that album.
    fn register_image(&self, path: &Path) -> Result<bool, ScanError> {
        let by_path = Image {
            fs_path: NullText::new(path.to_string_lossy()),
            ..Default::default()
        };
        if !self.store.read(&by_path, &[])?.is_empty() {
            return Ok(false);
        }
        let mut image = by_path;
        self.store.create(&mut image, &["id"])?;

        if let Some(dir) = path.parent() {
            let album_filter = Album {
                fs_path: NullText::new(dir.to_string_lossy()),
                ..Default::default()
            };
            if let Some(album) = self.store.read(&album_filter, &[])?.first() {
                let mut link = ImageInAlbum {
                    image_id: image.id,
                    album_id: album.id,
                    ..Default::default()
                };
                self.store.create(&mut link, &["id"])?;
            }
        }
        Ok(true)
    }
}

/// Zero-valued counters from tag frames mean "not set".
fn positive(value: Option<u32>) -> NullInt {
    value.filter(|&v| v != 0).map(i64::from).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_counters_are_unset() {
        assert!(!positive(Some(0)).is_set());
        assert!(!positive(None).is_set());
        assert_eq!(positive(Some(7)), NullInt::new(7));
    }
}
