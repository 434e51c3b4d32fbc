//! Versioned schema changes, recorded in `_migrations`.
//!
//! A version is applied together with its bookkeeping row in one
//! transaction, so a failed script leaves no trace.

use rusqlite::{params, Connection};

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// Ordered by version; never edit an entry once released.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_trd_production_table",
        sql: include_str!("sql/001_create_trd_production.sql"),
    },
    Migration {
        version: 2,
        description: "create_sts_status_table",
        sql: include_str!("sql/002_create_sts_status.sql"),
    },
];

/// Brings the schema up to the newest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )?;

    let applied: u32 =
        conn.query_row("SELECT IFNULL(MAX(version), 0) FROM _migrations", [], |r| {
            r.get(0)
        })?;

    let pending = MIGRATIONS.iter().filter(|m| m.version > applied);
    for migration in pending {
        log::info!(
            "Applying schema v{} ({})",
            migration.version,
            migration.description
        );
        apply(conn, migration).map_err(|e| DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        })?;
    }

    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<(), rusqlite::Error> {
    conn.execute_batch("BEGIN")?;
    let result = conn.execute_batch(migration.sql).and_then(|_| {
        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            params![migration.version, migration.description],
        )
    });

    match result {
        Ok(_) => conn.execute_batch("COMMIT"),
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        conn
    }

    fn versions(conn: &Connection) -> Vec<u32> {
        let mut stmt = conn
            .prepare("SELECT version FROM _migrations ORDER BY version")
            .unwrap();
        stmt.query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn has_unique_timestamp(conn: &Connection, table: &str) -> bool {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({})", table))
            .unwrap();
        let unique: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, bool>(2)?)))
            .unwrap()
            .filter_map(Result::ok)
            .filter_map(|(name, is_unique)| is_unique.then_some(name))
            .collect();

        unique.iter().any(|index| {
            let mut stmt = conn
                .prepare(&format!("PRAGMA index_info({})", index))
                .unwrap();
            let columns: Vec<String> = stmt
                .query_map([], |row| row.get(2))
                .unwrap()
                .filter_map(Result::ok)
                .collect();
            columns == ["timestamp"]
        })
    }

    #[test]
    fn test_all_versions_recorded() {
        let conn = fresh();
        assert_eq!(versions(&conn), vec![1, 2]);
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let conn = fresh();
        run_all(&conn).unwrap();
        assert_eq!(versions(&conn), vec![1, 2]);
    }

    #[test]
    fn test_timestamp_is_unique_in_both_tables() {
        let conn = fresh();
        assert!(has_unique_timestamp(&conn, "trd_production"));
        assert!(has_unique_timestamp(&conn, "sts_status"));
    }

    #[test]
    fn test_failed_script_is_rolled_back() {
        let conn = fresh();
        let broken = Migration {
            version: 9,
            description: "broken",
            sql: "CREATE TABLE scratch (id INTEGER); SELECT * FROM no_such_table;",
        };

        assert!(apply(&conn, &broken).is_err());

        let scratch: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'scratch'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(scratch, 0);
        assert_eq!(versions(&conn), vec![1, 2]);
    }
}
