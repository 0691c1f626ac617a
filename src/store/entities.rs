//! Media entity records and their column descriptor tables.
//!
//! Each entity declares an ordered, compile-time table of
//! `(field, column name, JSON name, EDN name)` associations. The query
//! builder and the engine operate purely on those descriptors; there is no
//! runtime type introspection. Every field is a null-safe wrapper, so
//! "absent from the query" is an explicit, type-checked state.

use super::error::StoreError;
use super::values::{NullFloat, NullInt, NullText, SqlValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Library,
    Artist,
    Genre,
    Album,
    Song,
    Image,
    SongInLibrary,
    ImageInAlbum,
}

/// One persisted field: its physical column name plus the two external
/// names used by transport layers to refer to it.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub column: &'static str,
    pub json: &'static str,
    pub edn: &'static str,
}

/// External naming scheme for [`convert_names`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameEncoding {
    Json,
    Edn,
}

/// The queryable record capability consumed by the engine and by external
/// layers: identity access plus positional field access in column order.
pub trait Entity: Default + Clone + PartialEq + std::fmt::Debug {
    const KIND: EntityKind;

    /// Field descriptors in declaration order.
    fn columns() -> &'static [ColumnSpec];

    /// Current field values, index-aligned with [`Entity::columns`].
    fn values(&self) -> Vec<SqlValue>;

    /// Replace all field values positionally. Fails with
    /// [`StoreError::ColumnType`] when a value's type does not match the
    /// field it lands on.
    fn set_values(&mut self, values: Vec<SqlValue>) -> Result<(), StoreError>;

    fn id(&self) -> NullInt;

    fn set_id(&mut self, id: i64);
}

/// Translate an ordered list of external field names into column names.
pub fn convert_names<E: Entity>(
    names: &[&str],
    encoding: NameEncoding,
) -> Result<Vec<&'static str>, StoreError> {
    names
        .iter()
        .map(|name| {
            E::columns()
                .iter()
                .find(|spec| match encoding {
                    NameEncoding::Json => spec.json == *name,
                    NameEncoding::Edn => spec.edn == *name,
                })
                .map(|spec| spec.column)
                .ok_or_else(|| StoreError::InvalidTag((*name).to_string()))
        })
        .collect()
}

macro_rules! entity_columns {
    (
        $entity:ty, $kind:expr,
        $( $field:ident : $variant:ident => ($col:literal, $json:literal, $edn:literal) ),+ $(,)?
    ) => {
        impl Entity for $entity {
            const KIND: EntityKind = $kind;

            fn columns() -> &'static [ColumnSpec] {
                const COLUMNS: &[ColumnSpec] = &[
                    $( ColumnSpec { column: $col, json: $json, edn: $edn } ),+
                ];
                COLUMNS
            }

            fn values(&self) -> Vec<SqlValue> {
                vec![ $( SqlValue::$variant(self.$field.clone()) ),+ ]
            }

            fn set_values(&mut self, values: Vec<SqlValue>) -> Result<(), StoreError> {
                let expected = Self::columns().len();
                if values.len() != expected {
                    return Err(StoreError::ColumnType {
                        column: Self::columns()[values.len().min(expected - 1)].column,
                        expected: "a full row",
                        got: format!("{} of {} values", values.len(), expected),
                    });
                }
                let mut iter = values.into_iter();
                $(
                    match iter.next() {
                        Some(SqlValue::$variant(v)) => self.$field = v,
                        Some(other) => {
                            return Err(StoreError::ColumnType {
                                column: $col,
                                expected: stringify!($variant),
                                got: other.type_name().to_string(),
                            })
                        }
                        None => unreachable!(),
                    }
                )+
                Ok(())
            }

            fn id(&self) -> NullInt {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = NullInt::new(id);
            }
        }
    };
}

/// A named filesystem tree registered for ingestion. The path is always
/// absolute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub id: NullInt,
    pub name: NullText,
    #[serde(rename = "path")]
    pub fs_path: NullText,
}

entity_columns!(Library, EntityKind::Library,
    id: Int => ("id", "id", ":id"),
    name: Text => ("name", "name", ":name"),
    fs_path: Text => ("fs_path", "path", ":path"),
);

/// An artist, identified by the root directory holding its files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: NullInt,
    pub name: NullText,
    #[serde(rename = "path")]
    pub fs_path: NullText,
}

entity_columns!(Artist, EntityKind::Artist,
    id: Int => ("id", "id", ":id"),
    name: Text => ("name", "name", ":name"),
    fs_path: Text => ("fs_path", "path", ":path"),
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: NullInt,
    pub name: NullText,
}

entity_columns!(Genre, EntityKind::Genre,
    id: Int => ("id", "id", ":id"),
    name: Text => ("name", "name", ":name"),
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: NullInt,
    /// Foreign key into artists; nullable.
    pub artist: NullInt,
    #[serde(rename = "year")]
    pub release_year: NullInt,
    #[serde(rename = "num-tracks")]
    pub num_tracks: NullInt,
    #[serde(rename = "num-disks")]
    pub num_disks: NullInt,
    pub title: NullText,
    #[serde(rename = "path")]
    pub fs_path: NullText,
    /// Total duration in seconds.
    pub duration: NullFloat,
}

entity_columns!(Album, EntityKind::Album,
    id: Int => ("id", "id", ":id"),
    artist: Int => ("artist", "artist", ":artist"),
    release_year: Int => ("release_year", "year", ":year"),
    num_tracks: Int => ("num_tracks", "num-tracks", ":num-tracks"),
    num_disks: Int => ("num_disks", "num-disks", ":num-disks"),
    title: Text => ("title", "title", ":title"),
    fs_path: Text => ("fs_path", "path", ":path"),
    duration: Float => ("duration", "duration", ":duration"),
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: NullInt,
    /// Foreign key into albums; nullable.
    pub album: NullInt,
    /// Foreign key into genres; nullable.
    pub genre: NullInt,
    #[serde(rename = "path")]
    pub fs_path: NullText,
    pub title: NullText,
    pub track: NullInt,
    #[serde(rename = "num-tracks")]
    pub num_tracks: NullInt,
    pub disk: NullInt,
    #[serde(rename = "num-disks")]
    pub num_disks: NullInt,
    /// File size in bytes.
    #[serde(rename = "size")]
    pub size: NullInt,
    /// Duration in seconds.
    pub duration: NullFloat,
    /// Denormalized artist name, straight from the file's tags.
    pub artist: NullText,
}

entity_columns!(Song, EntityKind::Song,
    id: Int => ("id", "id", ":id"),
    album: Int => ("album", "album", ":album"),
    genre: Int => ("genre", "genre", ":genre"),
    fs_path: Text => ("fs_path", "path", ":path"),
    title: Text => ("title", "title", ":title"),
    track: Int => ("track", "track", ":track"),
    num_tracks: Int => ("num_tracks", "num-tracks", ":num-tracks"),
    disk: Int => ("disk", "disk", ":disk"),
    num_disks: Int => ("num_disks", "num-disks", ":num-disks"),
    size: Int => ("song_size", "size", ":size"),
    duration: Float => ("duration", "duration", ":duration"),
    artist: Text => ("artist", "artist", ":artist"),
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: NullInt,
    #[serde(rename = "path")]
    pub fs_path: NullText,
}

entity_columns!(Image, EntityKind::Image,
    id: Int => ("id", "id", ":id"),
    fs_path: Text => ("fs_path", "path", ":path"),
);

/// Junction row recording a song's membership in a library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongInLibrary {
    pub id: NullInt,
    #[serde(rename = "song-id")]
    pub song_id: NullInt,
    #[serde(rename = "library-id")]
    pub library_id: NullInt,
}

entity_columns!(SongInLibrary, EntityKind::SongInLibrary,
    id: Int => ("id", "id", ":id"),
    song_id: Int => ("song_id", "song-id", ":song-id"),
    library_id: Int => ("library_id", "library-id", ":library-id"),
);

/// Junction row recording an image attached to an album.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInAlbum {
    pub id: NullInt,
    #[serde(rename = "image-id")]
    pub image_id: NullInt,
    #[serde(rename = "album-id")]
    pub album_id: NullInt,
}

entity_columns!(ImageInAlbum, EntityKind::ImageInAlbum,
    id: Int => ("id", "id", ":id"),
    image_id: Int => ("image_id", "image-id", ":image-id"),
    album_id: Int => ("album_id", "album-id", ":album-id"),
);
