//! Warbler: a personal music catalogue.
//!
//! The crate has three layers: `store` persists catalogue entities through
//! a descriptor-driven SQLite mapper, `scanner` ingests media files from
//! registered library trees, and `config` resolves CLI and TOML settings.

pub mod config;
pub mod scanner;
pub mod store;

pub use scanner::{ScanReport, Scanner};
pub use store::{CreateOutcome, MediaStore, Registry, StoreError};
