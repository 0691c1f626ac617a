//! SQLite DDL for the media tables, emitted from static descriptors.

use rusqlite::Connection;

pub enum SqlType {
    Text,
    Integer,
    Real,
}

pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub non_null: bool,
    pub unique: bool,
    pub references: Option<(&'static str, &'static str)>,
}

macro_rules! column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {{
        #[allow(unused_mut)]
        let mut column = ColumnDef {
            name: $name,
            sql_type: $sql_type,
            primary_key: false,
            non_null: false,
            unique: false,
            references: None,
        };
        $( column.$field = $value; )*
        column
    }};
}

pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub unique_constraints: &'static [&'static [&'static str]],
    pub indices: &'static [(&'static str, &'static str)],
}

impl TableDef {
    pub fn create(&self, conn: &Connection) -> rusqlite::Result<()> {
        let mut sql = format!("CREATE TABLE {} (", self.name);
        for (index, column) in self.columns.iter().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column.name);
            sql.push(' ');
            sql.push_str(match column.sql_type {
                SqlType::Text => "TEXT",
                SqlType::Integer => "INTEGER",
                SqlType::Real => "REAL",
            });
            if column.primary_key {
                sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                sql.push_str(" NOT NULL");
            }
            if column.unique {
                sql.push_str(" UNIQUE");
            }
            if let Some((table, referenced)) = column.references {
                sql.push_str(&format!(" REFERENCES {}({})", table, referenced));
            }
        }
        for constraint in self.unique_constraints {
            sql.push_str(&format!(", UNIQUE ({})", constraint.join(", ")));
        }
        sql.push_str(");");
        conn.execute(&sql, [])?;

        for (index_name, column) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {} ({});",
                    index_name, self.name, column
                ),
                [],
            )?;
        }
        Ok(())
    }
}

pub const MUSIC_TABLES: &[TableDef] = &[
    TableDef {
        name: "music_libraries",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!("name", SqlType::Text, non_null = true),
            column!("fs_path", SqlType::Text, non_null = true, unique = true),
        ],
        unique_constraints: &[],
        indices: &[],
    },
    TableDef {
        name: "music_artists",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!("name", SqlType::Text),
            column!("fs_path", SqlType::Text, unique = true),
        ],
        unique_constraints: &[],
        indices: &[],
    },
    TableDef {
        name: "music_genres",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!("name", SqlType::Text, unique = true),
        ],
        unique_constraints: &[],
        indices: &[],
    },
    TableDef {
        name: "music_albums",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!(
                "artist",
                SqlType::Integer,
                references = Some(("music_artists", "id"))
            ),
            column!("release_year", SqlType::Integer),
            column!("num_tracks", SqlType::Integer),
            column!("num_disks", SqlType::Integer),
            column!("title", SqlType::Text),
            column!("fs_path", SqlType::Text, unique = true),
            column!("duration", SqlType::Real),
        ],
        unique_constraints: &[],
        indices: &[("idx_albums_artist", "artist")],
    },
    TableDef {
        name: "music_songs",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!(
                "album",
                SqlType::Integer,
                references = Some(("music_albums", "id"))
            ),
            column!(
                "genre",
                SqlType::Integer,
                references = Some(("music_genres", "id"))
            ),
            column!("fs_path", SqlType::Text, non_null = true, unique = true),
            column!("title", SqlType::Text),
            column!("track", SqlType::Integer),
            column!("num_tracks", SqlType::Integer),
            column!("disk", SqlType::Integer),
            column!("num_disks", SqlType::Integer),
            column!("song_size", SqlType::Integer),
            column!("duration", SqlType::Real),
            column!("artist", SqlType::Text),
        ],
        unique_constraints: &[],
        indices: &[("idx_songs_album", "album")],
    },
    TableDef {
        name: "music_images",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!("fs_path", SqlType::Text, non_null = true, unique = true),
        ],
        unique_constraints: &[],
        indices: &[],
    },
    TableDef {
        name: "music_songs_in_library",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!(
                "song_id",
                SqlType::Integer,
                non_null = true,
                references = Some(("music_songs", "id"))
            ),
            column!(
                "library_id",
                SqlType::Integer,
                non_null = true,
                references = Some(("music_libraries", "id"))
            ),
        ],
        unique_constraints: &[&["song_id", "library_id"]],
        indices: &[("idx_songs_in_library_library", "library_id")],
    },
    TableDef {
        name: "music_images_in_album",
        columns: &[
            column!("id", SqlType::Integer, primary_key = true),
            column!(
                "image_id",
                SqlType::Integer,
                non_null = true,
                references = Some(("music_images", "id"))
            ),
            column!(
                "album_id",
                SqlType::Integer,
                non_null = true,
                references = Some(("music_albums", "id"))
            ),
        ],
        unique_constraints: &[&["image_id", "album_id"]],
        indices: &[],
    },
];

/// Create every media table and index on a fresh database.
pub fn create_all(conn: &Connection) -> rusqlite::Result<()> {
    for table in MUSIC_TABLES {
        table.create(conn)?;
    }
    Ok(())
}
