//! SQLite-хранилище словаря: категории, расширения, фразы.
//!
//! Движок читает только `read_dictionary`; остальные операции нужны CLI.

mod models;

pub use models::{Category, DictionaryEntry, Expansion, Phrase};

use crate::error::{Result, XpanderError};
use crate::services::dictionary::DictionarySource;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = r#"
DROP TABLE IF EXISTS phrases;
DROP TABLE IF EXISTS expansions;
DROP TABLE IF EXISTS categories;

CREATE TABLE categories (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE
);

CREATE TABLE expansions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  text TEXT NOT NULL,
  cat_id INTEGER NOT NULL,
  FOREIGN KEY (cat_id) REFERENCES categories(id) ON DELETE CASCADE
);
CREATE INDEX idx_expansions_cat ON expansions(cat_id);

CREATE TABLE phrases (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  exp_id INTEGER NOT NULL,
  FOREIGN KEY (exp_id) REFERENCES expansions(id) ON DELETE CASCADE
);
CREATE INDEX idx_phrases_exp ON phrases(exp_id);
"#;

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Открыть файл словаря; пустой файл получает схему
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self::with_connection(Connection::open(path)?)?;
        if !store.has_schema()? {
            info!("Словарь {} пуст, создаём схему", path.display());
            store.clean_slate()?;
        }
        Ok(store)
    }

    /// In-memory store (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let store = Self::with_connection(Connection::open_in_memory()?)?;
        store.clean_slate()?;
        Ok(store)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    fn has_schema(&self) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('categories', 'expansions', 'phrases')",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 3)
    }

    /// Пересоздать пустые таблицы
    pub fn clean_slate(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        debug!("Схема словаря пересоздана");
        Ok(())
    }

    // ---- создание ----

    pub fn add_category(&self, name: &str) -> Result<Category> {
        let conn = self.conn();
        conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn add_expansion(&self, category: &Category, name: &str, text: &str) -> Result<Expansion> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO expansions (name, text, cat_id) VALUES (?1, ?2, ?3)",
            params![name, text, category.id],
        )?;
        Ok(Expansion {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            text: text.to_string(),
            category_id: category.id,
        })
    }

    /// Дубликат фразы отклоняется ограничением UNIQUE
    pub fn add_phrase(&self, expansion: &Expansion, name: &str) -> Result<Phrase> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO phrases (name, exp_id) VALUES (?1, ?2)",
            params![name, expansion.id],
        )?;
        Ok(Phrase {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            expansion_id: expansion.id,
        })
    }

    // ---- изменение ----

    pub fn update_category(&self, category: &Category) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE categories SET name = ?1 WHERE id = ?2",
            params![category.name, category.id],
        )?;
        expect_one(changed, "категория", category.id)
    }

    pub fn update_expansion_name(&self, expansion: &Expansion) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE expansions SET name = ?1 WHERE id = ?2",
            params![expansion.name, expansion.id],
        )?;
        expect_one(changed, "расширение", expansion.id)
    }

    pub fn update_expansion_text(&self, expansion: &Expansion) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE expansions SET text = ?1 WHERE id = ?2",
            params![expansion.text, expansion.id],
        )?;
        expect_one(changed, "расширение", expansion.id)
    }

    pub fn update_phrase(&self, phrase: &Phrase) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE phrases SET name = ?1 WHERE id = ?2",
            params![phrase.name, phrase.id],
        )?;
        expect_one(changed, "фраза", phrase.id)
    }

    // ---- чтение ----

    pub fn read_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let category = self
            .conn()
            .query_row(
                "SELECT id, name FROM categories WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    pub fn find_expansion_by_name(&self, name: &str) -> Result<Option<Expansion>> {
        let expansion = self
            .conn()
            .query_row(
                "SELECT id, name, text, cat_id FROM expansions WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Expansion {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        text: row.get(2)?,
                        category_id: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(expansion)
    }

    pub fn find_phrase_by_name(&self, name: &str) -> Result<Option<Phrase>> {
        let phrase = self
            .conn()
            .query_row(
                "SELECT id, name, exp_id FROM phrases WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Phrase {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        expansion_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(phrase)
    }

    pub fn read_expansions(&self, category: &Category) -> Result<Vec<Expansion>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, text, cat_id FROM expansions WHERE cat_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![category.id], |row| {
            Ok(Expansion {
                id: row.get(0)?,
                name: row.get(1)?,
                text: row.get(2)?,
                category_id: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn read_phrases(&self, expansion: &Expansion) -> Result<Vec<Phrase>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, exp_id FROM phrases WHERE exp_id = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![expansion.id], |row| {
            Ok(Phrase {
                id: row.get(0)?,
                name: row.get(1)?,
                expansion_id: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Все пары фраза -> текст расширения в порядке id фразы
    pub fn read_dictionary(&self) -> Result<Vec<DictionaryEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT p.name, e.text FROM phrases p JOIN expansions e ON e.id = p.exp_id ORDER BY p.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DictionaryEntry {
                phrase: row.get(0)?,
                expansion: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ---- удаление ----

    /// Каскадно удаляет расширения категории и их фразы
    pub fn delete_category(&self, category: &Category) -> Result<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM categories WHERE id = ?1", params![category.id])?;
        expect_one(changed, "категория", category.id)
    }

    pub fn delete_expansion(&self, expansion: &Expansion) -> Result<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM expansions WHERE id = ?1", params![expansion.id])?;
        expect_one(changed, "расширение", expansion.id)
    }

    pub fn delete_phrase(&self, phrase: &Phrase) -> Result<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM phrases WHERE id = ?1", params![phrase.id])?;
        expect_one(changed, "фраза", phrase.id)
    }
}

impl DictionarySource for Store {
    fn read_dictionary(&self) -> Result<Vec<DictionaryEntry>> {
        Store::read_dictionary(self)
    }
}

fn expect_one(changed: usize, what: &str, id: i64) -> Result<()> {
    if changed == 0 {
        return XpanderError::not_found(format!("{} #{}", what, id));
    }
    Ok(())
}
