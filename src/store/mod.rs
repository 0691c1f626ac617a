//! Catalogue persistence: null-safe value wrappers, entity descriptor
//! tables, a descriptor-driven query builder and the SQLite engine built on
//! top of them.

mod entities;
mod error;
mod query;
mod registry;
mod schema;
#[allow(clippy::module_inception)]
mod store;
mod values;

pub use entities::{
    convert_names, Album, Artist, ColumnSpec, Entity, EntityKind, Genre, Image, ImageInAlbum,
    Library, NameEncoding, Song, SongInLibrary,
};
pub use error::StoreError;
pub use query::{BuiltInsert, BuiltQuery};
pub use registry::Registry;
pub use schema::MUSIC_TABLES;
pub use store::{CreateOutcome, MediaStore};
pub use values::{NullBool, NullFloat, NullInt, NullText, ParseValueError, SqlValue};
