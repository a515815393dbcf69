//! Database schema migrations for thrive.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> SqliteResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get::<_, i32>(0),
    )
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: records and the event log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS check_ins (
            id            TEXT PRIMARY KEY,
            date          TEXT NOT NULL UNIQUE,
            mood          TEXT NOT NULL,
            happy_thing   TEXT NOT NULL DEFAULT '',
            improve_thing TEXT NOT NULL DEFAULT '',
            energy        TEXT,
            sleep         TEXT,
            social        TEXT,
            ai_response   TEXT,
            submitted_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS goals (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT,
            category    TEXT NOT NULL,
            created_on  TEXT NOT NULL,
            target_date TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'active',
            progress    REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS sprints (
            id          TEXT PRIMARY KEY,
            goal_id     TEXT REFERENCES goals(id),
            title       TEXT NOT NULL,
            week_number INTEGER NOT NULL,
            start_date  TEXT NOT NULL,
            end_date    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS milestones (
            id           TEXT PRIMARY KEY,
            goal_id      TEXT REFERENCES goals(id),
            sprint_id    TEXT REFERENCES sprints(id),
            title        TEXT NOT NULL,
            target_date  TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id           TEXT PRIMARY KEY,
            title        TEXT NOT NULL,
            priority     TEXT NOT NULL,
            category     TEXT NOT NULL,
            due_date     TEXT,
            completed_at TEXT,
            source       TEXT NOT NULL,
            sprint_id    TEXT REFERENCES sprints(id),
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habits (
            id         TEXT PRIMARY KEY,
            title      TEXT NOT NULL,
            goal_id    TEXT REFERENCES goals(id),
            created_on TEXT NOT NULL,
            archived   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS habit_logs (
            habit_id TEXT NOT NULL REFERENCES habits(id),
            date     TEXT NOT NULL,
            PRIMARY KEY (habit_id, date)
        );

        CREATE TABLE IF NOT EXISTS brain_dumps (
            date           TEXT PRIMARY KEY,
            text           TEXT NOT NULL DEFAULT '',
            goal_ids       TEXT NOT NULL DEFAULT '[]',
            finalized      INTEGER NOT NULL DEFAULT 0,
            updated_at     TEXT
        );

        CREATE TABLE IF NOT EXISTS event_log (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            kind        TEXT NOT NULL,
            payload     TEXT NOT NULL,
            material    INTEGER NOT NULL DEFAULT 0,
            recorded_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS insight_cache (
            id        INTEGER PRIMARY KEY CHECK (id = 1),
            revision  INTEGER NOT NULL,
            day       TEXT NOT NULL,
            insights  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_sprint ON tasks(sprint_id);
        CREATE INDEX IF NOT EXISTS idx_milestones_goal ON milestones(goal_id);
        CREATE INDEX IF NOT EXISTS idx_milestones_sprint ON milestones(sprint_id);
        CREATE INDEX IF NOT EXISTS idx_sprints_goal ON sprints(goal_id);
        CREATE INDEX IF NOT EXISTS idx_event_log_material ON event_log(material, id);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: activity tags on check-ins.
///
/// Stored as a JSON array of lowercased tags.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    let has_activities: bool = tx.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('check_ins') WHERE name = 'activities'",
        [],
        |row| row.get::<_, i32>(0),
    )? > 0;

    if !has_activities {
        tx.execute_batch(
            "ALTER TABLE check_ins ADD COLUMN activities TEXT NOT NULL DEFAULT '[]';",
        )?;
    }

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
