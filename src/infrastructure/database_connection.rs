//! SQLite connection pool management and schema migration.

use std::path::Path;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Open (creating file and parent directories if needed) the SQLite
    /// database. Total inability to open the backend is fatal here;
    /// callers are expected to propagate it.
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        if !Path::new(db_path).exists() {
            std::fs::File::create(db_path)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        // WAL keeps readers unblocked while the single writer commits;
        // the busy timeout covers the rare overlap with the direct path.
        sqlx::query("PRAGMA journal_mode=WAL;").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout=30000;").execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_products_sql = r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                price INTEGER NOT NULL,
                original_price INTEGER NOT NULL,
                discount TEXT NOT NULL,
                seller TEXT NOT NULL,
                rating REAL NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                sold_count TEXT,
                url TEXT NOT NULL UNIQUE,
                image TEXT,
                platform TEXT NOT NULL,
                metadata TEXT,
                created_at TEXT NOT NULL
            )
        "#;

        sqlx::query(create_products_sql).execute(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_platform ON products (platform)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_created_at ON products (created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
