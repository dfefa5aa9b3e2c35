use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::{BarnodeError, Result};
use crate::models::{
    Article, BackupPayload, BackupSnapshot, MissingItem, Note, SINGLETON_BACKUP_ID,
};

/// SQLite store for articles, the missing list, the shopping note and the
/// backup snapshot.
pub struct Database {
    conn: Connection,
}

/// Row counts written back by a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreStats {
    pub articles: usize,
    pub missing_items: usize,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create all tables if they don't exist.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS articles (
                id         TEXT PRIMARY KEY,
                name       TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS missing_items (
                id           TEXT PRIMARY KEY,
                article_id   TEXT NOT NULL,
                article_name TEXT NOT NULL,
                created_at   TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notes (
                id         TEXT PRIMARY KEY,
                content    TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS backups (
                id         TEXT PRIMARY KEY,
                payload    TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_articles_name          ON articles(name);
            CREATE INDEX IF NOT EXISTS idx_missing_items_article  ON missing_items(article_id);
            ",
        )?;
        Ok(())
    }

    // ─── Articles ───────────────────────────────────────────

    /// Create an article from a free-text name. The name is trimmed; an
    /// empty result is rejected.
    pub fn create_article(&self, name: &str) -> Result<Article> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BarnodeError::ValidationError(
                "article name must not be empty".to_string(),
            ));
        }

        let article = Article::new(name);
        self.conn.execute(
            "INSERT INTO articles (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                article.id.to_string(),
                article.name,
                article.created_at.to_rfc3339(),
            ],
        )?;
        Ok(article)
    }

    /// Get an article by id.
    pub fn get_article(&self, id: &Uuid) -> Result<Article> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM articles WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_article,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    BarnodeError::ArticleNotFound(id.to_string())
                }
                other => BarnodeError::Database(other),
            })
    }

    /// List all articles, ordered by name ascending (case-insensitive).
    pub fn list_articles(&self) -> Result<Vec<Article>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at FROM articles
             ORDER BY name COLLATE NOCASE ASC, name ASC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Find an article by exact name, case-insensitively.
    pub fn find_article_by_name(&self, name: &str) -> Result<Option<Article>> {
        let result = self.conn.query_row(
            "SELECT id, name, created_at FROM articles
             WHERE name = ?1 COLLATE NOCASE LIMIT 1",
            params![name.trim()],
            Self::row_to_article,
        );
        match result {
            Ok(article) => Ok(Some(article)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(BarnodeError::Database(e)),
        }
    }

    /// Case-insensitive substring search over article names.
    pub fn search_articles(&self, query: &str) -> Result<Vec<Article>> {
        let pattern = format!("%{}%", query.trim());
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at FROM articles
             WHERE name LIKE ?1
             ORDER BY name COLLATE NOCASE ASC, name ASC",
        )?;
        let rows = stmt
            .query_map(params![pattern], Self::row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rename an article and rewrite the denormalized name on every missing
    /// item that references it.
    pub fn rename_article(&self, id: &Uuid, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(BarnodeError::ValidationError(
                "article name must not be empty".to_string(),
            ));
        }

        let updated = self.conn.execute(
            "UPDATE articles SET name = ?1 WHERE id = ?2",
            params![new_name, id.to_string()],
        )?;
        if updated == 0 {
            return Err(BarnodeError::ArticleNotFound(id.to_string()));
        }

        self.conn.execute(
            "UPDATE missing_items SET article_name = ?1 WHERE article_id = ?2",
            params![new_name, id.to_string()],
        )?;
        Ok(())
    }

    /// Delete an article, removing referencing missing items first.
    pub fn delete_article(&self, id: &Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM missing_items WHERE article_id = ?1",
            params![id.to_string()],
        )?;

        let deleted = self.conn.execute(
            "DELETE FROM articles WHERE id = ?1",
            params![id.to_string()],
        )?;
        if deleted == 0 {
            return Err(BarnodeError::ArticleNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Count total articles.
    pub fn count_articles(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ─── Missing items ──────────────────────────────────────

    /// Mark an article as missing. Idempotent: if the article is already on
    /// the list, the existing entry is returned unchanged.
    pub fn add_missing_item(&self, article: &Article) -> Result<MissingItem> {
        let existing = self.conn.query_row(
            "SELECT id, article_id, article_name, created_at FROM missing_items
             WHERE article_id = ?1 LIMIT 1",
            params![article.id.to_string()],
            Self::row_to_missing_item,
        );
        match existing {
            Ok(item) => return Ok(item),
            Err(rusqlite::Error::QueryReturnedNoRows) => {}
            Err(e) => return Err(BarnodeError::Database(e)),
        }

        let item = MissingItem::for_article(article);
        self.conn.execute(
            "INSERT INTO missing_items (id, article_id, article_name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                item.id.to_string(),
                item.article_id.to_string(),
                item.article_name,
                item.created_at.to_rfc3339(),
            ],
        )?;
        Ok(item)
    }

    /// List missing items, ordered by article name ascending.
    pub fn list_missing_items(&self) -> Result<Vec<MissingItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, article_id, article_name, created_at FROM missing_items
             ORDER BY article_name COLLATE NOCASE ASC, article_name ASC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_missing_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Remove a missing item by its own id (restock).
    pub fn remove_missing_item(&self, id: &Uuid) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM missing_items WHERE id = ?1",
            params![id.to_string()],
        )?;
        if deleted == 0 {
            return Err(BarnodeError::MissingItemNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Whether an article is currently on the missing list.
    pub fn is_article_missing(&self, article_id: &Uuid) -> Result<bool> {
        let exists = self
            .conn
            .prepare("SELECT 1 FROM missing_items WHERE article_id = ?1")?
            .exists(params![article_id.to_string()])?;
        Ok(exists)
    }

    /// Repoint every missing item from one article to another, rewriting the
    /// denormalized display name. If the target article is already on the
    /// list, the rows are folded into that entry instead (an article is
    /// marked missing at most once). Returns the number of rows touched.
    pub fn reassign_missing_items(
        &self,
        from: &Uuid,
        to: &Uuid,
        display_name: &str,
    ) -> Result<usize> {
        let target_listed = self.is_article_missing(to)?;

        let touched = if target_listed {
            self.conn.execute(
                "DELETE FROM missing_items WHERE article_id = ?1",
                params![from.to_string()],
            )?
        } else {
            self.conn.execute(
                "UPDATE missing_items SET article_id = ?1, article_name = ?2
                 WHERE article_id = ?3",
                params![to.to_string(), display_name, from.to_string()],
            )?
        };
        Ok(touched)
    }

    /// Count missing items.
    pub fn count_missing_items(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM missing_items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ─── Note ───────────────────────────────────────────────

    /// Load the shopping note, creating it with the given content on first
    /// access.
    pub fn get_or_init_note(&self, initial: &str) -> Result<Note> {
        let existing = self.conn.query_row(
            "SELECT id, content, updated_at FROM notes LIMIT 1",
            [],
            Self::row_to_note,
        );
        match existing {
            Ok(note) => return Ok(note),
            Err(rusqlite::Error::QueryReturnedNoRows) => {}
            Err(e) => return Err(BarnodeError::Database(e)),
        }

        let note = Note::new(initial);
        self.conn.execute(
            "INSERT INTO notes (id, content, updated_at) VALUES (?1, ?2, ?3)",
            params![
                note.id.to_string(),
                note.content,
                note.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(note)
    }

    /// Overwrite the note content.
    pub fn save_note(&self, id: &Uuid, content: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE notes SET content = ?1, updated_at = ?2 WHERE id = ?3",
            params![content, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if updated == 0 {
            return Err(BarnodeError::NoteNotFound(id.to_string()));
        }
        Ok(())
    }

    // ─── Backup ─────────────────────────────────────────────

    /// Capture the full state into the singleton backup row. A completely
    /// empty state is not worth snapshotting and returns `None`.
    pub fn save_snapshot(&self) -> Result<Option<BackupSnapshot>> {
        let payload = BackupPayload {
            articles: self.list_articles()?,
            missing_items: self.list_missing_items()?,
        };
        if payload.is_empty() {
            return Ok(None);
        }

        let snapshot = BackupSnapshot {
            id: SINGLETON_BACKUP_ID,
            payload,
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO backups (id, payload, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                snapshot.id.to_string(),
                serde_json::to_string(&snapshot.payload)?,
                snapshot.created_at.to_rfc3339(),
            ],
        )?;

        tracing::info!(
            articles = snapshot.payload.articles.len(),
            missing_items = snapshot.payload.missing_items.len(),
            "saved backup snapshot"
        );
        Ok(Some(snapshot))
    }

    /// Load the latest snapshot, if one was ever taken.
    pub fn latest_snapshot(&self) -> Result<Option<BackupSnapshot>> {
        let result = self.conn.query_row(
            "SELECT payload, created_at FROM backups WHERE id = ?1",
            params![SINGLETON_BACKUP_ID.to_string()],
            |row| {
                let payload: String = row.get(0)?;
                let created_at: String = row.get(1)?;
                Ok((payload, created_at))
            },
        );
        match result {
            Ok((payload, created_at)) => Ok(Some(BackupSnapshot {
                id: SINGLETON_BACKUP_ID,
                payload: serde_json::from_str(&payload)?,
                created_at: parse_timestamp(&created_at),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(BarnodeError::Database(e)),
        }
    }

    /// Replace the current articles and missing items with the latest
    /// snapshot, inside one transaction.
    pub fn restore_latest(&mut self) -> Result<RestoreStats> {
        let snapshot = self.latest_snapshot()?.ok_or(BarnodeError::BackupNotFound)?;

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM missing_items", [])?;
        tx.execute("DELETE FROM articles", [])?;

        for article in &snapshot.payload.articles {
            tx.execute(
                "INSERT INTO articles (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![
                    article.id.to_string(),
                    article.name,
                    article.created_at.to_rfc3339(),
                ],
            )?;
        }
        for item in &snapshot.payload.missing_items {
            tx.execute(
                "INSERT INTO missing_items (id, article_id, article_name, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    item.id.to_string(),
                    item.article_id.to_string(),
                    item.article_name,
                    item.created_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;

        let stats = RestoreStats {
            articles: snapshot.payload.articles.len(),
            missing_items: snapshot.payload.missing_items.len(),
        };
        tracing::info!(
            articles = stats.articles,
            missing_items = stats.missing_items,
            "restored backup snapshot"
        );
        Ok(stats)
    }

    // ─── Helpers ────────────────────────────────────────────

    fn row_to_article(row: &rusqlite::Row) -> rusqlite::Result<Article> {
        Ok(Article {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            name: row.get(1)?,
            created_at: parse_timestamp(&row.get::<_, String>(2)?),
        })
    }

    fn row_to_missing_item(row: &rusqlite::Row) -> rusqlite::Result<MissingItem> {
        Ok(MissingItem {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            article_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            article_name: row.get(2)?,
            created_at: parse_timestamp(&row.get::<_, String>(3)?),
        })
    }

    fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
        Ok(Note {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            content: row.get(1)?,
            updated_at: parse_timestamp(&row.get::<_, String>(2)?),
        })
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.count_articles().unwrap(), 0);
        assert_eq!(db.count_missing_items().unwrap(), 0);
    }

    #[test]
    fn test_create_and_get_article() {
        let db = Database::open_in_memory().unwrap();
        let article = db.create_article("  Gin Mare  ").unwrap();
        assert_eq!(article.name, "Gin Mare");

        let fetched = db.get_article(&article.id).unwrap();
        assert_eq!(fetched, article);
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.create_article("   "),
            Err(BarnodeError::ValidationError(_))
        ));
    }

    #[test]
    fn test_get_nonexistent_article() {
        let db = Database::open_in_memory().unwrap();
        let result = db.get_article(&Uuid::now_v7());
        assert!(matches!(result, Err(BarnodeError::ArticleNotFound(_))));
    }

    #[test]
    fn test_list_articles_ordered_by_name() {
        let db = Database::open_in_memory().unwrap();
        db.create_article("campari").unwrap();
        db.create_article("Aperol").unwrap();
        db.create_article("Birra Moretti").unwrap();

        let names: Vec<String> = db
            .list_articles()
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Aperol", "Birra Moretti", "campari"]);
    }

    #[test]
    fn test_find_article_by_name_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        let created = db.create_article("Gin Mare").unwrap();

        let found = db.find_article_by_name("gin mare").unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));
        assert!(db.find_article_by_name("Vermouth").unwrap().is_none());
    }

    #[test]
    fn test_search_articles_substring() {
        let db = Database::open_in_memory().unwrap();
        db.create_article("Vodka Smirnoff").unwrap();
        db.create_article("Smirnoff Ice").unwrap();
        db.create_article("Aperol").unwrap();

        let hits = db.search_articles("smirnoff").unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_rename_syncs_missing_item_names() {
        let db = Database::open_in_memory().unwrap();
        let article = db.create_article("Vodka smirnof").unwrap();
        db.add_missing_item(&article).unwrap();

        db.rename_article(&article.id, "Vodka Smirnoff").unwrap();

        let items = db.list_missing_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].article_name, "Vodka Smirnoff");
        assert_eq!(db.get_article(&article.id).unwrap().name, "Vodka Smirnoff");
    }

    #[test]
    fn test_delete_article_cascades_missing_items() {
        let db = Database::open_in_memory().unwrap();
        let article = db.create_article("Aperol").unwrap();
        db.add_missing_item(&article).unwrap();

        db.delete_article(&article.id).unwrap();

        assert_eq!(db.count_articles().unwrap(), 0);
        assert_eq!(db.count_missing_items().unwrap(), 0);
    }

    #[test]
    fn test_delete_nonexistent_article() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.delete_article(&Uuid::now_v7()).is_err());
    }

    #[test]
    fn test_add_missing_item_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let article = db.create_article("Campari").unwrap();

        let first = db.add_missing_item(&article).unwrap();
        let second = db.add_missing_item(&article).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.count_missing_items().unwrap(), 1);
    }

    #[test]
    fn test_remove_missing_item() {
        let db = Database::open_in_memory().unwrap();
        let article = db.create_article("Campari").unwrap();
        let item = db.add_missing_item(&article).unwrap();

        db.remove_missing_item(&item.id).unwrap();
        assert_eq!(db.count_missing_items().unwrap(), 0);
        assert!(!db.is_article_missing(&article.id).unwrap());

        assert!(db.remove_missing_item(&item.id).is_err());
    }

    #[test]
    fn test_reassign_missing_items_repoints_and_renames() {
        let db = Database::open_in_memory().unwrap();
        let loser = db.create_article("vodka smirnoff 1l").unwrap();
        let master = db.create_article("Vodka Smirnoff").unwrap();
        db.add_missing_item(&loser).unwrap();

        let touched = db
            .reassign_missing_items(&loser.id, &master.id, "Vodka Smirnoff")
            .unwrap();
        assert_eq!(touched, 1);

        let items = db.list_missing_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].article_id, master.id);
        assert_eq!(items[0].article_name, "Vodka Smirnoff");
    }

    #[test]
    fn test_reassign_folds_into_existing_master_entry() {
        let db = Database::open_in_memory().unwrap();
        let loser = db.create_article("vodka smirnoff 1l").unwrap();
        let master = db.create_article("Vodka Smirnoff").unwrap();
        db.add_missing_item(&loser).unwrap();
        db.add_missing_item(&master).unwrap();

        db.reassign_missing_items(&loser.id, &master.id, "Vodka Smirnoff")
            .unwrap();

        let items = db.list_missing_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].article_id, master.id);
    }

    #[test]
    fn test_note_get_or_init_and_save() {
        let db = Database::open_in_memory().unwrap();

        let note = db.get_or_init_note("Aperol\nCampari").unwrap();
        assert_eq!(note.content, "Aperol\nCampari");

        // Second access returns the stored row, not a fresh seed.
        let again = db.get_or_init_note("something else").unwrap();
        assert_eq!(again.id, note.id);
        assert_eq!(again.content, "Aperol\nCampari");

        db.save_note(&note.id, "Aperol").unwrap();
        let saved = db.get_or_init_note("").unwrap();
        assert_eq!(saved.content, "Aperol");
    }

    #[test]
    fn test_snapshot_skips_empty_state() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.save_snapshot().unwrap().is_none());
        assert!(db.latest_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_and_restore_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let article = db.create_article("Gin Mare").unwrap();
        db.add_missing_item(&article).unwrap();

        db.save_snapshot().unwrap().unwrap();

        // Mutate the live state after the snapshot.
        let extra = db.create_article("Rum Havana").unwrap();
        db.add_missing_item(&extra).unwrap();
        db.delete_article(&article.id).unwrap();

        let stats = db.restore_latest().unwrap();
        assert_eq!(
            stats,
            RestoreStats {
                articles: 1,
                missing_items: 1
            }
        );

        let articles = db.list_articles().unwrap();
        assert_eq!(articles, vec![article.clone()]);
        let items = db.list_missing_items().unwrap();
        assert_eq!(items[0].article_id, article.id);
    }

    #[test]
    fn test_restore_without_snapshot() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.restore_latest(),
            Err(BarnodeError::BackupNotFound)
        ));
    }
}
