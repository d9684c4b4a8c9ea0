//! SQL migration definitions for the SoulSeed database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as one batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: blogs, system_docs",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Blog posts
CREATE TABLE IF NOT EXISTS blogs (
    id           TEXT PRIMARY KEY,
    slug         TEXT NOT NULL,
    title        TEXT NOT NULL,
    category     TEXT NOT NULL DEFAULT '',
    status       TEXT NOT NULL,
    content      TEXT NOT NULL,
    word_count   INTEGER NOT NULL DEFAULT 0,
    reading_time INTEGER NOT NULL DEFAULT 0,
    names_count  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_blogs_status ON blogs(status);

-- Singleton documents (run summaries and similar)
CREATE TABLE IF NOT EXISTS system_docs (
    id         TEXT PRIMARY KEY,
    body_json  TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Unique blog slugs",
            sql: r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_blogs_slug ON blogs(slug) WHERE slug <> '';

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
