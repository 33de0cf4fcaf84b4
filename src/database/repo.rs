use std::fs;
use std::path::PathBuf;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;

use crate::database::schema::SCHEMA;
use crate::database::tags::{decode_tags, encode_tags};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed tags column: {0}")]
    Tags(#[from] serde_json::Error),
    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// A catalog item as stored, with tags decoded back into a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub image_path: String,
    pub created_at: String,
}

/// The client-supplied half of an item; `id` and `created_at` come from the store.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub image_path: String,
}

/// Persistence seam for catalog items.
pub trait ItemStore: Send + Sync {
    /// Inserts one row and returns the id assigned to it.
    fn insert(&self, item: &NewItem) -> Result<i64, StoreError>;

    /// Every item, most recently created first.
    fn list(&self) -> Result<Vec<Item>, StoreError>;

    fn get(&self, id: i64) -> Result<Option<Item>, StoreError>;
}

/// SQLite-backed store. Holds only the file path: each operation opens its
/// own connection and drops it before returning.
#[derive(Debug, Clone)]
pub struct SqliteItemStore {
    path: PathBuf,
}

const SELECT_ITEMS: &str =
    "SELECT id, title, description, tags, image_path, created_at FROM items";

impl SqliteItemStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let store = Self { path };
        store.connect()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.path)
    }
}

impl ItemStore for SqliteItemStore {
    fn insert(&self, item: &NewItem) -> Result<i64, StoreError> {
        let tags = encode_tags(&item.tags)?;
        let conn = self.connect()?;
        let id = conn.query_row(
            "INSERT INTO items (title, description, tags, image_path)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id",
            params![item.title, item.description, tags, item.image_path],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn list(&self) -> Result<Vec<Item>, StoreError> {
        let conn = self.connect()?;
        // id breaks ties between rows created within the same second.
        let mut stmt = conn.prepare(&format!(
            "{SELECT_ITEMS} ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], ItemRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    fn get(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("{SELECT_ITEMS} WHERE id = ?1"),
                params![id],
                ItemRow::from_row,
            )
            .optional()?;

        row.map(ItemRow::into_item).transpose()
    }
}

struct ItemRow {
    id: i64,
    title: String,
    description: String,
    tags: String,
    image_path: String,
    created_at: String,
}

impl ItemRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            tags: row.get(3)?,
            image_path: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_item(self) -> Result<Item, StoreError> {
        Ok(Item {
            id: self.id,
            title: self.title,
            description: self.description,
            tags: decode_tags(&self.tags)?,
            image_path: self.image_path,
            created_at: self.created_at,
        })
    }
}
