//! Directory-convention identity derivation.
//!
//! Artist and album rows are keyed by directories: the artist directory is
//! the direct child of the library root on the song's path, and the album
//! directory is the direct child of the artist directory. The walk is pure
//! path arithmetic and never touches the filesystem.

use std::path::Path;

/// Ancestor of `path` whose parent is exactly `base`. Returns `path` itself
/// when its parent is already `base`, and `None` when `path` does not live
/// under `base` at all.
pub fn child_under<'a>(path: &'a Path, base: &Path) -> Option<&'a Path> {
    let mut current = path;
    loop {
        match current.parent() {
            Some(parent) if parent == base => return Some(current),
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// The artist directory for a song, or `None` when the song sits directly
/// in the library root (no directory to key an artist on).
pub fn artist_dir<'a>(song_path: &'a Path, library_root: &Path) -> Option<&'a Path> {
    let child = child_under(song_path, library_root)?;
    if child == song_path {
        None
    } else {
        Some(child)
    }
}

/// The album directory for a song, or `None` when the song sits directly
/// in the artist directory.
pub fn album_dir<'a>(song_path: &'a Path, artist_dir: &Path) -> Option<&'a Path> {
    let child = child_under(song_path, artist_dir)?;
    if child == song_path {
        None
    } else {
        Some(child)
    }
}
