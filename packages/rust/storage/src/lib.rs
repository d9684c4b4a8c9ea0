//! Turso Embedded / libSQL storage layer.
//!
//! The [`Storage`] struct wraps a libSQL database holding the blog post
//! collection and a small keyed store of system documents (run summaries).
//!
//! **Access rules:**
//! - server and CLI batch commands: read-write via [`Storage::open`]
//! - reporting commands (`audit`, `blogs list`): read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use soulseed_shared::{BlogPost, BlogStats, Result, SoulseedError};

/// Key of the document written after each full rewrite run.
pub const REWRITE_SUMMARY_DOC: &str = "blog-rewrite-summary";

const BLOG_COLUMNS: &str = "id, slug, title, category, status, content, word_count, reading_time, names_count, created_at, updated_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SoulseedError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    SoulseedError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(SoulseedError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Blog operations
    // -----------------------------------------------------------------------

    /// Insert a post, or replace every field of an existing post with the same id.
    pub async fn upsert_blog(&self, post: &BlogPost) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO blogs (id, slug, title, category, status, content, word_count, reading_time, names_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                   slug = excluded.slug,
                   title = excluded.title,
                   category = excluded.category,
                   status = excluded.status,
                   content = excluded.content,
                   word_count = excluded.word_count,
                   reading_time = excluded.reading_time,
                   names_count = excluded.names_count,
                   updated_at = excluded.updated_at",
                params![
                    post.id.as_str(),
                    post.slug.as_str(),
                    post.title.as_str(),
                    post.category.as_str(),
                    post.status.as_str(),
                    post.content.as_str(),
                    post.stats.word_count as i64,
                    post.stats.reading_time as i64,
                    post.stats.names_count as i64,
                    post.created_at.to_rfc3339(),
                    post.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a post by id.
    pub async fn get_blog(&self, id: &str) -> Result<Option<BlogPost>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_blog(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(SoulseedError::Storage(e.to_string())),
        }
    }

    /// List posts with the given status, oldest first.
    pub async fn list_blogs_by_status(&self, status: &str) -> Result<Vec<BlogPost>> {
        self.query_blogs(
            &format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE status = ?1 ORDER BY created_at, id"),
            params![status],
        )
        .await
    }

    /// List every post regardless of status.
    pub async fn list_blogs(&self) -> Result<Vec<BlogPost>> {
        self.query_blogs(
            &format!("SELECT {BLOG_COLUMNS} FROM blogs ORDER BY created_at, id"),
            params![],
        )
        .await
    }

    async fn query_blogs(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<BlogPost>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?
        {
            results.push(row_to_blog(&row)?);
        }
        Ok(results)
    }

    /// Replace a post's content and stats in a single statement.
    ///
    /// Returns [`SoulseedError::NotFound`] if no post has this id.
    pub async fn update_blog_content(
        &self,
        id: &str,
        content: &str,
        stats: &BlogStats,
    ) -> Result<DateTime<Utc>> {
        self.check_writable()?;
        let now = Utc::now();
        let changed = self
            .conn
            .execute(
                "UPDATE blogs SET content = ?1, word_count = ?2, reading_time = ?3, names_count = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    content,
                    stats.word_count as i64,
                    stats.reading_time as i64,
                    stats.names_count as i64,
                    now.to_rfc3339(),
                    id,
                ],
            )
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        if changed == 0 {
            return Err(SoulseedError::NotFound(format!("blog post {id}")));
        }
        Ok(now)
    }

    /// Count posts with `status` whose stored `names_count` is below `threshold`.
    pub async fn count_blogs_below(&self, status: &str, threshold: usize) -> Result<u64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM blogs WHERE status = ?1 AND names_count < ?2",
                params![status, threshold as i64],
            )
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map(|n| n.max(0) as u64)
                .map_err(|e| SoulseedError::Storage(e.to_string())),
            Ok(None) => Ok(0),
            Err(e) => Err(SoulseedError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // System documents
    // -----------------------------------------------------------------------

    /// Write (or overwrite) a JSON document under `id`.
    pub async fn put_system_doc(&self, id: &str, body: &serde_json::Value) -> Result<()> {
        self.check_writable()?;
        let json = serde_json::to_string(body)?;
        self.conn
            .execute(
                "INSERT INTO system_docs (id, body_json, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET body_json = excluded.body_json, updated_at = excluded.updated_at",
                params![id, json, Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Read the JSON document stored under `id`.
    pub async fn get_system_doc(&self, id: &str) -> Result<Option<serde_json::Value>> {
        let mut rows = self
            .conn
            .query(
                "SELECT body_json FROM system_docs WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(|e| SoulseedError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let json: String = row
                    .get(0)
                    .map_err(|e| SoulseedError::Storage(e.to_string()))?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(SoulseedError::Storage(e.to_string())),
        }
    }
}

/// Convert a database row to a [`BlogPost`].
fn row_to_blog(row: &libsql::Row) -> Result<BlogPost> {
    let text = |idx: i32| {
        row.get::<String>(idx)
            .map_err(|e| SoulseedError::Storage(e.to_string()))
    };
    let count = |idx: i32| {
        row.get::<i64>(idx)
            .map(|v| v.max(0) as usize)
            .map_err(|e| SoulseedError::Storage(e.to_string()))
    };
    let timestamp = |idx: i32| -> Result<DateTime<Utc>> {
        let s = text(idx)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| SoulseedError::Storage(format!("invalid date: {e}")))
    };

    Ok(BlogPost {
        id: text(0)?,
        slug: text(1)?,
        title: text(2)?,
        category: text(3)?,
        status: text(4)?,
        content: text(5)?,
        stats: BlogStats {
            word_count: count(6)?,
            reading_time: count(7)?,
            names_count: count(8)?,
        },
        created_at: timestamp(9)?,
        updated_at: timestamp(10)?,
    })
}
