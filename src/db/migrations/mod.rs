//! Database migration system using rusqlite_migration.
//!
//! Migrations are embedded SQL files run in order to bring the database up
//! to the current schema version; the `user_version` pragma tracks which
//! have been applied.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

const MIGRATION_COUNT: usize = 2;

/// All migrations, in order. Each migration brings the schema from version N
/// to N+1.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(include_str!("v001_initial_schema.sql")),
        M::up(include_str!("v002_analysis_views.sql")),
    ])
}

/// Open the database, running any pending migrations.
/// Backs up the database before applying migrations if it already exists.
pub fn open_and_migrate(db_path: &Path) -> Result<Connection> {
    let db_exists = db_path.exists();

    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    // Collection writes one row at a time while readers may be polling job
    // logs; WAL keeps those from blocking each other.
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("Failed to enable WAL mode")?;

    let m = migrations();

    let current_version = m
        .current_version(&conn)
        .context("Failed to check current schema version")?;

    let needs_migration = match current_version {
        rusqlite_migration::SchemaVersion::NoneSet => true,
        rusqlite_migration::SchemaVersion::Inside(v) => v.get() < MIGRATION_COUNT,
        rusqlite_migration::SchemaVersion::Outside(_) => false,
    };

    if needs_migration
        && db_exists
        && !matches!(current_version, rusqlite_migration::SchemaVersion::NoneSet)
    {
        backup_database(db_path)?;
        eprintln!("[solodex] Applying database migration(s)...");
    } else if needs_migration && !db_exists {
        eprintln!("[solodex] Creating new database at {}", db_path.display());
    }

    m.to_latest(&mut conn)
        .context("Failed to apply database migrations")?;

    Ok(conn)
}

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> Result<usize> {
    let m = migrations();
    let version = m.current_version(conn).context("Failed to get schema version")?;

    Ok(match version {
        rusqlite_migration::SchemaVersion::NoneSet => 0,
        rusqlite_migration::SchemaVersion::Inside(v) => v.get(),
        rusqlite_migration::SchemaVersion::Outside(v) => v.get(),
    })
}

/// Create a backup of the database file before migrations.
fn backup_database(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Ok(());
    }

    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
    let backup_path = db_path.with_extension(format!("db.backup.{}", timestamp));

    std::fs::copy(db_path, &backup_path)
        .with_context(|| format!("Failed to backup database to {}", backup_path.display()))?;

    eprintln!("[solodex] Backed up database to {}", backup_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn fresh_database_has_all_tables() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        let conn = open_and_migrate(&db_path).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"videos".to_string()));
        assert!(tables.contains(&"jobs".to_string()));
        assert!(tables.contains(&"job_logs".to_string()));
        assert!(tables.contains(&"analysis_views".to_string()));
        assert!(tables.contains(&"analysis_view_items".to_string()));
    }

    #[test]
    fn migration_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        let conn = open_and_migrate(&db_path).unwrap();
        drop(conn);

        let conn = open_and_migrate(&db_path).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='videos'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn schema_version_tracked() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        let conn = open_and_migrate(&db_path).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), MIGRATION_COUNT);
    }

    #[test]
    fn season_episode_index_exists() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        let conn = open_and_migrate(&db_path).unwrap();
        let idx_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_videos_season_episode'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(idx_count, 1);
    }
}
