//! SQLite-backed persistence engine for the media catalogue.
//!
//! `MediaStore` is the sole writer of catalogue rows. It owns the
//! connection and the immutable table registry; all statement text and
//! parameter slices are call-local. Create implements the idempotent
//! get-or-create contract the ingestion pipeline leans on.

use super::entities::{Entity, Library, Song, SongInLibrary};
use super::error::StoreError;
use super::query;
use super::registry::Registry;
use super::schema;
use super::values::{NullInt, NullText, SqlValue};
use rusqlite::{params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// What [`MediaStore::create`] did. `Existing` is the idempotent no-op
/// signal: exactly one row already matched and the candidate was completed
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Inserted,
    Existing,
}

pub struct MediaStore {
    conn: Mutex<Connection>,
    registry: Registry,
}

impl MediaStore {
    /// Open (creating the schema if the database is brand new) with the
    /// standard media table registry.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        Self::open_with_registry(db_path, Registry::with_music_tables())
    }

    pub fn open_with_registry<P: AsRef<Path>>(
        db_path: P,
        registry: Registry,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn, registry)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, Registry::with_music_tables())
    }

    fn from_connection(conn: Connection, registry: Registry) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )?;
        if table_count == 0 {
            info!("creating media schema on fresh database");
            schema::create_all(&conn)?;
        }

        Ok(MediaStore {
            conn: Mutex::new(conn),
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Row count of a table referenced by its physical name; unknown names
    /// yield `InvalidTable`.
    pub fn count_table(&self, table: &str) -> Result<i64, StoreError> {
        self.registry.kind_for_table(table)?;
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(&format!("SELECT COUNT(1) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Fetch one row by primary identity. Zero rows is `NotPresent`; any
    /// other query error passes through unchanged.
    pub fn read_unique<E: Entity>(&self, id: i64) -> Result<E, StoreError> {
        let table = self.registry.table_for::<E>()?;
        let built = query::select_unique::<E>(table, id);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&built.sql)?;
        let mut rows = stmt.query(params_from_iter(built.params.iter()))?;
        match rows.next()? {
            Some(row) => entity_from_row::<E>(row),
            None => Err(StoreError::NotPresent),
        }
    }

    /// Run a filtered SELECT using the set fields of `filter`; zero matches
    /// is an empty vec, never an error. `order_by` takes column names,
    /// already translated from external names.
    pub fn read<E: Entity>(&self, filter: &E, order_by: &[&str]) -> Result<Vec<E>, StoreError> {
        let table = self.registry.table_for::<E>()?;
        let built = query::select(table, filter, order_by);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&built.sql)?;
        let mut rows = stmt.query(params_from_iter(built.params.iter()))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(entity_from_row::<E>(row)?);
        }
        Ok(results)
    }

    /// Idempotent insert. The candidate's set fields double as the
    /// existence filter:
    /// - no match: physical INSERT; `returning` columns are written back
    ///   onto the candidate.
    /// - exactly one match: the candidate's unset fields are completed from
    ///   the matched row and `Existing` is returned.
    /// - more than one match: the filter cannot identify a single row;
    ///   `NonUnique`.
    pub fn create<E: Entity>(
        &self,
        candidate: &mut E,
        returning: &[&str],
    ) -> Result<CreateOutcome, StoreError> {
        let matches = self.read(candidate, &[])?;
        match matches.len() {
            0 => {}
            1 => {
                merge_missing(candidate, &matches[0])?;
                return Ok(CreateOutcome::Existing);
            }
            n => {
                return Err(StoreError::NonUnique(format!(
                    "{} rows match {:?}",
                    n, candidate
                )))
            }
        }

        let table = self.registry.table_for::<E>()?;
        let built = query::insert(table, candidate, returning)?;
        let conn = self.conn.lock().unwrap();

        if built.returning_fields.is_empty() {
            conn.execute(&built.sql, params_from_iter(built.params.iter()))?;
        } else {
            let mut stmt = conn.prepare(&built.sql)?;
            let mut rows = stmt.query(params_from_iter(built.params.iter()))?;
            if let Some(row) = rows.next()? {
                let mut values = candidate.values();
                for (position, &field) in built.returning_fields.iter().enumerate() {
                    let raw = row.get_ref(position)?;
                    values[field] = SqlValue::read_as(&values[field], raw).map_err(|e| {
                        StoreError::ColumnType {
                            column: E::columns()[field].column,
                            expected: values[field].type_name(),
                            got: e.to_string(),
                        }
                    })?;
                }
                candidate.set_values(values)?;
            }
        }
        Ok(CreateOutcome::Inserted)
    }

    /// UPDATE rows matching `filter`'s set fields with `set`'s set fields,
    /// returning the affected row count. Both arguments are one entity type
    /// by construction. Driver errors (constraint violations and the like)
    /// pass through unchanged.
    pub fn update<E: Entity>(&self, set: &E, filter: &E) -> Result<usize, StoreError> {
        let table = self.registry.table_for::<E>()?;
        let built = query::update(table, set, filter);
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(&built.sql, params_from_iter(built.params.iter()))?;
        Ok(affected)
    }

    /// Register a library. The root path must be absolute; the server makes
    /// no assumption about its own working directory.
    pub fn add_library(&self, name: &str, fs_path: &Path) -> Result<Library, StoreError> {
        if !fs_path.is_absolute() {
            return Err(StoreError::NotAbs(fs_path.to_path_buf()));
        }
        let mut library = Library {
            id: NullInt::default(),
            name: NullText::new(name),
            fs_path: NullText::new(fs_path.to_string_lossy()),
        };
        self.create(&mut library, &["id"])?;
        Ok(library)
    }

    pub fn libraries(&self) -> Result<Vec<Library>, StoreError> {
        self.read(&Library::default(), &["id"])
    }

    /// Whether the song at this path is already linked to the library.
    /// An unsaved song (no path) cannot identify a row.
    pub fn song_in_library(&self, song: &Song, library: &Library) -> Result<bool, StoreError> {
        let path = song
            .fs_path
            .get()
            .ok_or_else(|| StoreError::NonUnique(format!("song without a path: {:?}", song)))?;

        let by_path = Song {
            fs_path: NullText::new(path),
            ..Default::default()
        };
        let songs = self.read(&by_path, &[])?;
        let song_id = match songs.first().and_then(|s| s.id.get()) {
            Some(id) => id,
            None => return Ok(false),
        };

        let membership = SongInLibrary {
            song_id: NullInt::new(song_id),
            library_id: library.id,
            ..Default::default()
        };
        let links = self.read(&membership, &[])?;
        match links.len() {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(StoreError::NonUnique(format!(
                "{} membership rows for song {} in library {}",
                n, song_id, library.id
            ))),
        }
    }

    /// Link a song to a library; a no-op when the link already exists.
    pub fn add_song_to_library(
        &self,
        song: &Song,
        library: &Library,
    ) -> Result<(), StoreError> {
        if self.song_in_library(song, library)? {
            return Ok(());
        }
        let mut link = SongInLibrary {
            song_id: song.id,
            library_id: library.id,
            ..Default::default()
        };
        self.create(&mut link, &["id"])?;
        Ok(())
    }

    /// All songs linked to a library, ordered by song id.
    pub fn songs_in_library(&self, library: &Library) -> Result<Vec<Song>, StoreError> {
        let library_id = library.id.get().ok_or_else(|| {
            StoreError::NonUnique(format!("library without an id: {:?}", library))
        })?;
        let filter = SongInLibrary {
            library_id: NullInt::new(library_id),
            ..Default::default()
        };
        let links = self.read(&filter, &["song_id"])?;
        let mut songs = Vec::with_capacity(links.len());
        for link in links {
            let song_id = link.song_id.get().ok_or(StoreError::NotPresent)?;
            songs.push(self.read_unique::<Song>(song_id)?);
        }
        Ok(songs)
    }
}

/// Materialize an entity from a result row, filling fields positionally in
/// column order.
fn entity_from_row<E: Entity>(row: &Row) -> Result<E, StoreError> {
    let mut entity = E::default();
    let templates = entity.values();
    let mut values = Vec::with_capacity(templates.len());
    for (index, template) in templates.iter().enumerate() {
        let raw = row.get_ref(index)?;
        let value =
            SqlValue::read_as(template, raw).map_err(|e| StoreError::ColumnType {
                column: E::columns()[index].column,
                expected: template.type_name(),
                got: e.to_string(),
            })?;
        values.push(value);
    }
    entity.set_values(values)?;
    Ok(entity)
}

/// Complete `candidate`'s unset fields from `existing`; set fields are left
/// alone.
fn merge_missing<E: Entity>(candidate: &mut E, existing: &E) -> Result<(), StoreError> {
    let merged = candidate
        .values()
        .into_iter()
        .zip(existing.values())
        .map(|(candidate_value, existing_value)| {
            if candidate_value.is_set() {
                candidate_value
            } else {
                existing_value
            }
        })
        .collect();
    candidate.set_values(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entities::{Artist, EntityKind, Genre};
    use crate::store::values::NullFloat;
    use std::path::PathBuf;

    fn store() -> MediaStore {
        MediaStore::open_in_memory().unwrap()
    }

    #[test]
    fn create_then_read_unique_round_trips() {
        let store = store();
        let mut artist = Artist {
            name: NullText::new("Miles Davis"),
            fs_path: NullText::new("/music/Miles Davis"),
            ..Default::default()
        };
        let outcome = store.create(&mut artist, &["id"]).unwrap();
        assert_eq!(outcome, CreateOutcome::Inserted);
        let id = artist.id.get().expect("returning populated the id");

        let fetched: Artist = store.read_unique(id).unwrap();
        assert_eq!(fetched, artist);
    }

    #[test]
    fn read_unique_missing_row_is_not_present() {
        let store = store();
        let err = store.read_unique::<Genre>(999).unwrap_err();
        assert!(matches!(err, StoreError::NotPresent));
    }

    #[test]
    fn read_with_empty_filter_returns_all_rows() {
        let store = store();
        for name in ["jazz", "bebop", "modal"] {
            let mut genre = Genre {
                name: NullText::new(name),
                ..Default::default()
            };
            store.create(&mut genre, &["id"]).unwrap();
        }
        let all = store.read(&Genre::default(), &[]).unwrap();
        assert_eq!(all.len(), 3);

        let none = store
            .read(
                &Genre {
                    name: NullText::new("metal"),
                    ..Default::default()
                },
                &[],
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn create_existing_match_merges_and_signals() {
        let store = store();
        let mut original = Artist {
            name: NullText::new("Nina Simone"),
            fs_path: NullText::new("/music/Nina Simone"),
            ..Default::default()
        };
        store.create(&mut original, &["id"]).unwrap();

        // Same path, no name: the name and the id come back merged.
        let mut again = Artist {
            fs_path: NullText::new("/music/Nina Simone"),
            ..Default::default()
        };
        let outcome = store.create(&mut again, &["id"]).unwrap();
        assert_eq!(outcome, CreateOutcome::Existing);
        assert_eq!(again, original);
    }

    #[test]
    fn create_ambiguous_match_is_non_unique() {
        let store = store();
        for path in ["/music/a", "/music/b"] {
            let mut artist = Artist {
                name: NullText::new("Duplicate Name"),
                fs_path: NullText::new(path),
                ..Default::default()
            };
            store.create(&mut artist, &["id"]).unwrap();
        }
        let mut probe = Artist {
            name: NullText::new("Duplicate Name"),
            ..Default::default()
        };
        let err = store.create(&mut probe, &["id"]).unwrap_err();
        assert!(matches!(err, StoreError::NonUnique(_)));
        // Candidate is untouched on the ambiguous path.
        assert!(!probe.id.is_set());
        assert!(!probe.fs_path.is_set());
    }

    #[test]
    fn update_rewrites_matched_rows() {
        let store = store();
        let mut artist = Artist {
            name: NullText::new("Old Name"),
            fs_path: NullText::new("/music/x"),
            ..Default::default()
        };
        store.create(&mut artist, &["id"]).unwrap();

        let set = Artist {
            name: NullText::new("New Name"),
            ..Default::default()
        };
        let filter = Artist {
            fs_path: NullText::new("/music/x"),
            ..Default::default()
        };
        let affected = store.update(&set, &filter).unwrap();
        assert_eq!(affected, 1);

        let fetched: Artist = store.read_unique(artist.id.get().unwrap()).unwrap();
        assert_eq!(fetched.name, NullText::new("New Name"));
    }

    #[test]
    fn add_library_requires_absolute_path() {
        let store = store();
        let err = store
            .add_library("relative", Path::new("music/here"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotAbs(p) if p == PathBuf::from("music/here")));

        let library = store.add_library("main", Path::new("/music")).unwrap();
        assert!(library.id.is_set());
        let libraries = store.libraries().unwrap();
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].name, NullText::new("main"));
    }

    #[test]
    fn count_table_checks_registry() {
        let store = store();
        assert_eq!(store.count_table("music_songs").unwrap(), 0);
        assert!(matches!(
            store.count_table("music_users"),
            Err(StoreError::InvalidTable(_))
        ));
    }

    #[test]
    fn unregistered_entity_type_is_invalid_table() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = Registry::new().register(EntityKind::Genre, "music_genres");
        let store = MediaStore::from_connection(conn, registry).unwrap();
        assert!(matches!(
            store.read(&Artist::default(), &[]),
            Err(StoreError::InvalidTable(_))
        ));
    }

    #[test]
    fn song_library_linkage_is_idempotent() {
        let store = store();
        let library = store.add_library("main", Path::new("/music")).unwrap();
        let mut song = Song {
            fs_path: NullText::new("/music/a/b/01.mp3"),
            title: NullText::new("One"),
            duration: NullFloat::new(61.5),
            ..Default::default()
        };
        store.create(&mut song, &["id"]).unwrap();

        assert!(!store.song_in_library(&song, &library).unwrap());
        store.add_song_to_library(&song, &library).unwrap();
        assert!(store.song_in_library(&song, &library).unwrap());
        // Second link is a no-op, not a constraint violation.
        store.add_song_to_library(&song, &library).unwrap();

        let songs = store.songs_in_library(&library).unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].fs_path, NullText::new("/music/a/b/01.mp3"));
    }
}
