//! Parameterized SQL generation from entity descriptor tables.
//!
//! Everything here is pure string/slice assembly: no connection, no state.
//! The omission rule is uniform — a field participates in a WHERE or INSERT
//! clause iff its null-safe wrapper is set. A consequence carried over from
//! the engine's contract: "set this column to NULL" is not expressible
//! through the builder.

use super::entities::{ColumnSpec, Entity};
use super::error::StoreError;
use super::values::{NullInt, SqlValue};

/// A statement plus its positional parameters, bind-ready.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// An INSERT statement; `returning_fields` holds the descriptor indices of
/// the RETURNING columns, in the order the row will yield them.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltInsert {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub returning_fields: Vec<usize>,
}

/// Comma-separated column list in declaration order.
pub fn selection_list(columns: &[ColumnSpec]) -> String {
    columns
        .iter()
        .map(|spec| spec.column)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Filtered SELECT: set fields become `column = ?N` predicates, AND-joined.
/// An entity with no set fields selects every row — an empty query object
/// is deliberately a "select all".
///
/// `order_by` columns are appended verbatim; callers translate external
/// names first (see [`super::entities::convert_names`]).
pub fn select<E: Entity>(table: &str, query: &E, order_by: &[&str]) -> BuiltQuery {
    let mut sql = format!("SELECT {} FROM {}", selection_list(E::columns()), table);
    let mut params = Vec::new();

    for (spec, value) in E::columns().iter().zip(query.values()) {
        if !value.is_set() {
            continue;
        }
        if params.is_empty() {
            sql.push_str(" WHERE ");
        } else {
            sql.push_str(" AND ");
        }
        sql.push_str(&format!("{} = ?{}", spec.column, params.len() + 1));
        params.push(value);
    }

    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by.join(", "));
    }

    BuiltQuery { sql, params }
}

/// Unique SELECT: filters by primary identity only, whatever else is set.
pub fn select_unique<E: Entity>(table: &str, id: i64) -> BuiltQuery {
    BuiltQuery {
        sql: format!(
            "SELECT {} FROM {} WHERE id = ?1",
            selection_list(E::columns()),
            table
        ),
        params: vec![SqlValue::Int(NullInt::new(id))],
    }
}

/// INSERT with only the set fields; unset nullable columns fall back to the
/// database default. Unknown `returning` column names are a configuration
/// error, reported as `InvalidTag`.
pub fn insert<E: Entity>(
    table: &str,
    entity: &E,
    returning: &[&str],
) -> Result<BuiltInsert, StoreError> {
    let columns = E::columns();
    let mut returning_fields = Vec::with_capacity(returning.len());
    for name in returning {
        let index = columns
            .iter()
            .position(|spec| spec.column == *name)
            .ok_or_else(|| StoreError::InvalidTag((*name).to_string()))?;
        returning_fields.push(index);
    }

    let mut names = Vec::new();
    let mut placeholders = Vec::new();
    let mut params = Vec::new();
    for (spec, value) in columns.iter().zip(entity.values()) {
        if !value.is_set() {
            continue;
        }
        names.push(spec.column);
        placeholders.push(format!("?{}", params.len() + 1));
        params.push(value);
    }

    let mut sql = if params.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders.join(", ")
        )
    };

    if !returning_fields.is_empty() {
        let cols: Vec<&str> = returning_fields
            .iter()
            .map(|&i| columns[i].column)
            .collect();
        sql.push_str(&format!(" RETURNING {}", cols.join(", ")));
    }

    Ok(BuiltInsert {
        sql,
        params,
        returning_fields,
    })
}

/// UPDATE with independent set/where field lists. Parameter numbering is
/// contiguous across both clauses: where parameters continue after set
/// parameters.
pub fn update<E: Entity>(table: &str, set: &E, filter: &E) -> BuiltQuery {
    let mut sql = format!("UPDATE {} SET ", table);
    let mut params = Vec::new();

    let mut first = true;
    for (spec, value) in E::columns().iter().zip(set.values()) {
        if !value.is_set() {
            continue;
        }
        if !first {
            sql.push_str(", ");
        }
        first = false;
        sql.push_str(&format!("{} = ?{}", spec.column, params.len() + 1));
        params.push(value);
    }

    let mut first = true;
    for (spec, value) in E::columns().iter().zip(filter.values()) {
        if !value.is_set() {
            continue;
        }
        if first {
            sql.push_str(" WHERE ");
        } else {
            sql.push_str(" AND ");
        }
        first = false;
        sql.push_str(&format!("{} = ?{}", spec.column, params.len() + 1));
        params.push(value);
    }

    BuiltQuery { sql, params }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entities::{Album, Genre, Library, Song};
    use crate::store::values::{NullFloat, NullText};

    #[test]
    fn selection_list_keeps_declaration_order() {
        assert_eq!(selection_list(Genre::columns()), "id, name");
        assert_eq!(
            selection_list(Library::columns()),
            "id, name, fs_path"
        );
    }

    #[test]
    fn select_omits_unset_fields() {
        let query = Song {
            fs_path: NullText::new("/m/x.mp3"),
            title: NullText::new("x"),
            ..Default::default()
        };
        let built = select("music_songs", &query, &[]);
        assert_eq!(
            built.sql,
            "SELECT id, album, genre, fs_path, title, track, num_tracks, disk, num_disks, \
             song_size, duration, artist FROM music_songs WHERE fs_path = ?1 AND title = ?2"
        );
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn empty_query_selects_all_rows() {
        let built = select("music_genres", &Genre::default(), &[]);
        assert_eq!(built.sql, "SELECT id, name FROM music_genres");
        assert!(built.params.is_empty());
    }

    #[test]
    fn order_by_is_appended_verbatim() {
        let built = select("music_songs", &Song::default(), &["track", "disk"]);
        assert!(built.sql.ends_with(" ORDER BY track, disk"));
    }

    #[test]
    fn unique_select_filters_by_id_only() {
        let built = select_unique::<Album>("music_albums", 7);
        assert_eq!(
            built.sql,
            "SELECT id, artist, release_year, num_tracks, num_disks, title, fs_path, duration \
             FROM music_albums WHERE id = ?1"
        );
        assert_eq!(built.params, vec![SqlValue::Int(NullInt::new(7))]);
    }

    #[test]
    fn insert_includes_only_set_fields_and_returning() {
        let album = Album {
            title: NullText::new("Kind of Blue"),
            fs_path: NullText::new("/m/md/kob"),
            duration: NullFloat::new(2765.7),
            ..Default::default()
        };
        let built = insert("music_albums", &album, &["id"]).unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO music_albums (title, fs_path, duration) VALUES (?1, ?2, ?3) RETURNING id"
        );
        assert_eq!(built.returning_fields, vec![0]);
    }

    #[test]
    fn insert_with_nothing_set_uses_defaults() {
        let built = insert("music_genres", &Genre::default(), &[]).unwrap();
        assert_eq!(built.sql, "INSERT INTO music_genres DEFAULT VALUES");
        assert!(built.params.is_empty());
    }

    #[test]
    fn insert_rejects_unknown_returning_column() {
        let err = insert("music_genres", &Genre::default(), &["uuid"]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTag(name) if name == "uuid"));
    }

    #[test]
    fn update_numbering_is_contiguous_across_clauses() {
        let set = Song {
            title: NullText::new("New Title"),
            artist: NullText::new("New Artist"),
            ..Default::default()
        };
        let filter = Song {
            fs_path: NullText::new("/m/x.mp3"),
            ..Default::default()
        };
        let built = update("music_songs", &set, &filter);
        assert_eq!(
            built.sql,
            "UPDATE music_songs SET title = ?1, artist = ?2 WHERE fs_path = ?3"
        );
        assert_eq!(built.params.len(), 3);
    }
}
