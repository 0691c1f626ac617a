//! Filesystem ingestion: classification, tag extraction, duration probing
//! and the scan pipeline that turns a directory tree into catalogue rows.

mod classify;
mod error;
mod metadata;
mod paths;
mod probe;
#[allow(clippy::module_inception)]
mod scanner;

pub use classify::{classify_bytes, classify_file, MediaKind};
pub use error::ScanError;
pub use metadata::{LoftyReader, MetadataReader, SongTags};
pub use probe::{DurationProbe, FfprobeDurationProbe};
pub use scanner::{ScanReport, Scanner};
