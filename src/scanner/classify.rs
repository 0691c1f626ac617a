//! Media type detection from file magic bytes.
//!
//! Extensions are never consulted; a renamed or extensionless file is
//! classified the same as a well-named one.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How many leading bytes are sniffed. Every magic signature the matcher
/// knows fits well within this.
const SNIFF_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

/// Classify a byte prefix. Anything that is not audio or image content is
/// `None` and gets skipped by the walk.
pub fn classify_bytes(buffer: &[u8]) -> Option<MediaKind> {
    let kind = infer::get(buffer)?;
    let mime = kind.mime_type();
    if mime.starts_with("audio/") {
        Some(MediaKind::Audio)
    } else if mime.starts_with("image/") {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Classify a file on disk by its leading bytes.
pub fn classify_file(path: &Path) -> std::io::Result<Option<MediaKind>> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(classify_bytes(&buffer[..filled]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn id3_prefix_is_audio() {
        let mut content = b"ID3".to_vec();
        content.extend_from_slice(&[0u8; 64]);
        assert_eq!(classify_bytes(&content), Some(MediaKind::Audio));
    }

    #[test]
    fn png_magic_is_image() {
        let mut content = PNG_MAGIC.to_vec();
        content.extend_from_slice(&[0u8; 64]);
        assert_eq!(classify_bytes(&content), Some(MediaKind::Image));
    }

    #[test]
    fn plain_text_is_neither() {
        assert_eq!(classify_bytes(b"liner notes, not media"), None);
        assert_eq!(classify_bytes(&[]), None);
    }

    #[test]
    fn classification_ignores_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artwork.mp3");
        let mut file = File::create(&path).unwrap();
        file.write_all(PNG_MAGIC).unwrap();
        file.write_all(&[0u8; 32]).unwrap();
        drop(file);

        assert_eq!(classify_file(&path).unwrap(), Some(MediaKind::Image));
    }
}
