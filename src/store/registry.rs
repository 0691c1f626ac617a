//! Bidirectional entity-type ↔ table-name registry.
//!
//! Built once at startup as an immutable value and handed to the engine's
//! constructor; nothing here is process-global or mutable after
//! construction.

use super::entities::{Entity, EntityKind};
use super::error::StoreError;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_kind: HashMap<EntityKind, &'static str>,
    by_table: HashMap<&'static str, EntityKind>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of one association.
    pub fn register(mut self, kind: EntityKind, table: &'static str) -> Self {
        self.by_kind.insert(kind, table);
        self.by_table.insert(table, kind);
        self
    }

    /// All media tables under their physical names.
    pub fn with_music_tables() -> Self {
        Self::new()
            .register(EntityKind::Library, "music_libraries")
            .register(EntityKind::Artist, "music_artists")
            .register(EntityKind::Genre, "music_genres")
            .register(EntityKind::Album, "music_albums")
            .register(EntityKind::Song, "music_songs")
            .register(EntityKind::Image, "music_images")
            .register(EntityKind::SongInLibrary, "music_songs_in_library")
            .register(EntityKind::ImageInAlbum, "music_images_in_album")
    }

    pub fn table_name(&self, kind: EntityKind) -> Result<&'static str, StoreError> {
        self.by_kind
            .get(&kind)
            .copied()
            .ok_or_else(|| StoreError::InvalidTable(format!("{:?}", kind)))
    }

    pub fn table_for<E: Entity>(&self) -> Result<&'static str, StoreError> {
        self.table_name(E::KIND)
    }

    pub fn kind_for_table(&self, table: &str) -> Result<EntityKind, StoreError> {
        self.by_table
            .get(table)
            .copied()
            .ok_or_else(|| StoreError::InvalidTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entities::Song;

    #[test]
    fn lookup_both_directions() {
        let registry = Registry::with_music_tables();
        assert_eq!(registry.table_for::<Song>().unwrap(), "music_songs");
        assert_eq!(
            registry.kind_for_table("music_albums").unwrap(),
            EntityKind::Album
        );
    }

    #[test]
    fn unknown_table_is_typed_error() {
        let registry = Registry::with_music_tables();
        let err = registry.kind_for_table("music_users").unwrap_err();
        assert!(matches!(err, StoreError::InvalidTable(name) if name == "music_users"));
    }

    #[test]
    fn unregistered_kind_is_typed_error() {
        let registry = Registry::new().register(EntityKind::Genre, "music_genres");
        assert!(matches!(
            registry.table_name(EntityKind::Song),
            Err(StoreError::InvalidTable(_))
        ));
    }
}
