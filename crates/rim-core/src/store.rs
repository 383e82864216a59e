//! Persistent redirect table (SQLite via sqlx).
//!
//! One row per mapping, unique by (site_id, old_path). Row operations take
//! the caller's transaction so a whole import commits or rolls back as one.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite, Transaction};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// One persisted redirect mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRecord {
    pub id: i64,
    pub site_id: i64,
    pub old_path: String,
    pub new_path: String,
}

/// Error surfaced by row-level store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mapping for this (site_id, old_path) already exists, e.g. a
    /// concurrent insert won the race. The unique constraint guarantees
    /// this is never a silent duplicate.
    #[error("redirect for site {site_id} with old_path {old_path} already exists")]
    AlreadyExists { site_id: i64, old_path: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Handle to the SQLite-backed redirect table.
///
/// The default database file is stored under the XDG state directory:
/// `~/.local/state/rim/redirects.db` on Debian.
#[derive(Clone)]
pub struct RedirectDb {
    pool: Pool<Sqlite>,
}

impl RedirectDb {
    /// Open (or create) the default database and run migrations.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("rim")?;
        let state_dir = xdg_dirs.get_state_home();
        tokio::fs::create_dir_all(&state_dir).await?;
        Self::open_at(&state_dir.join("redirects.db")).await
    }

    /// Open (or create) the database at an explicit path (used by tests and
    /// the `database_path` config override).
    pub async fn open_at(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = RedirectDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS redirects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                old_path TEXT NOT NULL,
                new_path TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (site_id, old_path)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Begin the transaction that spans one whole import run.
    pub async fn begin(&self) -> Result<Transaction<'_, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Look up the mapping for (site_id, old_path), if any.
    pub async fn find(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        site_id: i64,
        old_path: &str,
    ) -> Result<Option<RedirectRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, site_id, old_path, new_path
            FROM redirects
            WHERE site_id = ?1 AND old_path = ?2
            "#,
        )
        .bind(site_id)
        .bind(old_path)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|row| RedirectRecord {
            id: row.get("id"),
            site_id: row.get("site_id"),
            old_path: row.get("old_path"),
            new_path: row.get("new_path"),
        }))
    }

    /// Insert a new mapping. A concurrent insert for the same key surfaces
    /// as [`StoreError::AlreadyExists`].
    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        site_id: i64,
        old_path: &str,
        new_path: &str,
    ) -> Result<RedirectRecord, StoreError> {
        let now = unix_timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO redirects (site_id, old_path, new_path, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(site_id)
        .bind(old_path)
        .bind(new_path)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await;

        match result {
            Ok(done) => Ok(RedirectRecord {
                id: done.last_insert_rowid(),
                site_id,
                old_path: old_path.to_string(),
                new_path: new_path.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::AlreadyExists {
                site_id,
                old_path: old_path.to_string(),
            }),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Point an existing mapping at a new target.
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record: &RedirectRecord,
        new_path: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE redirects
            SET new_path = ?1,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(new_path)
        .bind(unix_timestamp())
        .bind(record.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Number of stored mappings for a site.
    pub async fn count(&self, site_id: i64) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM redirects WHERE site_id = ?1")
            .bind(site_id)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Open an in-memory database for tests (no disk I/O).
    async fn open_memory() -> Result<RedirectDb> {
        // Single connection to avoid in-memory pool handing back a different empty DB.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = RedirectDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    #[tokio::test]
    async fn create_and_find_roundtrip() {
        let db = open_memory().await.unwrap();
        let mut tx = db.begin().await.unwrap();

        assert!(db.find(&mut tx, 1, "/old").await.unwrap().is_none());

        let created = db.create(&mut tx, 1, "/old", "/new").await.unwrap();
        assert_eq!(created.old_path, "/old");
        assert_eq!(created.new_path, "/new");

        let found = db.find(&mut tx, 1, "/old").await.unwrap().unwrap();
        assert_eq!(found, created);
        tx.commit().await.unwrap();

        assert_eq!(db.count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_create_surfaces_already_exists() {
        let db = open_memory().await.unwrap();
        let mut tx = db.begin().await.unwrap();

        db.create(&mut tx, 1, "/old", "/new").await.unwrap();
        let err = db.create(&mut tx, 1, "/old", "/other").await.unwrap_err();
        match err {
            StoreError::AlreadyExists { site_id, old_path } => {
                assert_eq!(site_id, 1);
                assert_eq!(old_path, "/old");
            }
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn same_old_path_on_another_site_is_allowed() {
        let db = open_memory().await.unwrap();
        let mut tx = db.begin().await.unwrap();

        db.create(&mut tx, 1, "/old", "/new").await.unwrap();
        db.create(&mut tx, 2, "/old", "/elsewhere").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(db.count(1).await.unwrap(), 1);
        assert_eq!(db.count(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_changes_target() {
        let db = open_memory().await.unwrap();
        let mut tx = db.begin().await.unwrap();

        let record = db.create(&mut tx, 1, "/a", "/b").await.unwrap();
        db.update(&mut tx, &record, "/c").await.unwrap();

        let found = db.find(&mut tx, 1, "/a").await.unwrap().unwrap();
        assert_eq!(found.new_path, "/c");
    }

    #[tokio::test]
    async fn uncommitted_rows_roll_back() {
        let db = open_memory().await.unwrap();
        {
            let mut tx = db.begin().await.unwrap();
            db.create(&mut tx, 1, "/a", "/b").await.unwrap();
            // Dropped without commit.
        }
        let mut tx = db.begin().await.unwrap();
        assert!(db.find(&mut tx, 1, "/a").await.unwrap().is_none());
    }
}
