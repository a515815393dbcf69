//! SQLite-backed record store.
//!
//! Provides persistent storage for:
//! - Check-ins (one per calendar day)
//! - Goals, sprints, milestones, tasks
//! - Habits and their daily logs
//! - Daily reflection drafts
//! - The event log and the insight cache
//!
//! All writes go through this type. Analytics read snapshots from it and
//! never write back except through the insight cache.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result};
use crate::events::Event;
use crate::model::{
    Category, CheckIn, DailyBrainDump, Goal, GoalStatus, Habit, Insight, Level, Milestone,
    MoodLabel, Priority, Sprint, StructuredFields, Task, TaskSource,
};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Insights computed for one data revision on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightCacheEntry {
    pub revision: i64,
    pub day: NaiveDate,
    pub insights: Vec<Insight>,
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn day_at(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DAY_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn opt_day_at(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| NaiveDate::parse_from_str(&s, DAY_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<FixedOffset>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s).map_err(|e| conversion_error(idx, e))
}

fn opt_timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<FixedOffset>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| DateTime::parse_from_rfc3339(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn json_at<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(idx, e))
}

fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn parse_level(value: Option<String>) -> Option<Level> {
    value.as_deref().and_then(Level::parse)
}

fn format_level(level: Option<Level>) -> Option<&'static str> {
    level.map(Level::as_str)
}

const CHECK_IN_COLUMNS: &str = "id, date, mood, happy_thing, improve_thing, energy, sleep, social,
     activities, ai_response, submitted_at";

fn row_to_check_in(row: &Row) -> rusqlite::Result<CheckIn> {
    let mood: String = row.get(2)?;
    Ok(CheckIn {
        id: row.get(0)?,
        date: day_at(row, 1)?,
        mood: MoodLabel::parse(&mood),
        happy_thing: row.get(3)?,
        improve_thing: row.get(4)?,
        fields: StructuredFields {
            energy: parse_level(row.get(5)?),
            sleep: parse_level(row.get(6)?),
            social: parse_level(row.get(7)?),
        },
        activities: json_at(row, 8)?,
        ai_response: row.get(9)?,
        submitted_at: timestamp_at(row, 10)?,
    })
}

const GOAL_COLUMNS: &str =
    "id, title, description, category, created_on, target_date, status, progress";

fn row_to_goal(row: &Row) -> rusqlite::Result<Goal> {
    let category: String = row.get(3)?;
    let status: String = row.get(6)?;
    Ok(Goal {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: Category::parse(&category),
        created_on: day_at(row, 4)?,
        target_date: day_at(row, 5)?,
        status: GoalStatus::parse(&status),
        milestones: Vec::new(),
        progress: row.get(7)?,
    })
}

const MILESTONE_COLUMNS: &str = "id, goal_id, sprint_id, title, target_date, completed_at";

fn row_to_milestone(row: &Row) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        sprint_id: row.get(2)?,
        title: row.get(3)?,
        target_date: day_at(row, 4)?,
        completed_at: opt_timestamp_at(row, 5)?,
    })
}

const SPRINT_COLUMNS: &str = "id, goal_id, title, week_number, start_date, end_date";

fn row_to_sprint(row: &Row) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        title: row.get(2)?,
        week_number: row.get(3)?,
        start_date: day_at(row, 4)?,
        end_date: day_at(row, 5)?,
        tasks: Vec::new(),
        milestones: Vec::new(),
    })
}

const TASK_COLUMNS: &str =
    "id, title, priority, category, due_date, completed_at, source, sprint_id, created_at";

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let priority: String = row.get(2)?;
    let category: String = row.get(3)?;
    let source: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        priority: Priority::parse(&priority),
        category: Category::parse(&category),
        due_date: opt_day_at(row, 4)?,
        completed_at: opt_timestamp_at(row, 5)?,
        source: TaskSource::parse(&source),
        sprint_id: row.get(7)?,
        created_at: timestamp_at(row, 8)?,
    })
}

fn row_to_habit(row: &Row) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: row.get(0)?,
        title: row.get(1)?,
        goal_id: row.get(2)?,
        created_on: day_at(row, 3)?,
        archived: row.get(4)?,
        completions: Vec::new(),
    })
}

fn row_to_brain_dump(row: &Row) -> rusqlite::Result<DailyBrainDump> {
    let mut dump = DailyBrainDump::new(day_at(row, 0)?);
    dump.text = row.get(1)?;
    dump.goal_ids = json_at::<BTreeSet<String>>(row, 2)?;
    dump.finalized = row.get(3)?;
    dump.updated_at = opt_timestamp_at(row, 4)?;
    dump.refresh();
    Ok(dump)
}

/// SQLite store for every persisted record.
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    /// Open the store at `<data_dir>/thrive.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("thrive.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory store.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` inside one transaction; rolled back if `f` fails.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ── Check-ins ───────────────────────────────────────────────────

    /// Insert a check-in.
    ///
    /// # Errors
    /// `DuplicateDate` if the day already has one.
    pub fn insert_check_in(&self, c: &CheckIn) -> Result<()> {
        let activities = serde_json::to_string(&c.activities)?;
        let result = self.conn.execute(
            "INSERT INTO check_ins (id, date, mood, happy_thing, improve_thing, energy, sleep,
                                    social, activities, ai_response, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                c.id,
                format_day(c.date),
                c.mood.as_str(),
                c.happy_thing,
                c.improve_thing,
                format_level(c.fields.energy),
                format_level(c.fields.sleep),
                format_level(c.fields.social),
                activities,
                c.ai_response,
                c.submitted_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(CoreError::DuplicateDate { date: c.date })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn check_in_on(&self, date: NaiveDate) -> Result<Option<CheckIn>> {
        let sql = format!("SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE date = ?1");
        Ok(self
            .conn
            .query_row(&sql, [format_day(date)], row_to_check_in)
            .optional()?)
    }

    /// All check-ins, oldest first.
    pub fn list_check_ins(&self) -> Result<Vec<CheckIn>> {
        let sql = format!("SELECT {CHECK_IN_COLUMNS} FROM check_ins ORDER BY date");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_check_in)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Check-ins with `start <= date <= end`, oldest first.
    pub fn check_ins_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CheckIn>> {
        let sql = format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE date >= ?1 AND date <= ?2 ORDER BY date"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([format_day(start), format_day(end)], row_to_check_in)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn check_in_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare("SELECT date FROM check_ins ORDER BY date")?;
        let rows = stmt.query_map([], |row| day_at(row, 0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Store the coach reply on a day's check-in. Returns false when the
    /// day has no check-in.
    pub fn set_ai_response(&self, date: NaiveDate, text: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE check_ins SET ai_response = ?1 WHERE date = ?2",
            params![text, format_day(date)],
        )?;
        Ok(changed > 0)
    }

    // ── Goals ───────────────────────────────────────────────────────

    pub fn insert_goal(&self, g: &Goal) -> Result<()> {
        self.conn.execute(
            "INSERT INTO goals (id, title, description, category, created_on,
             target_date, status, progress)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                g.id,
                g.title,
                g.description,
                g.category.as_str(),
                format_day(g.created_on),
                format_day(g.target_date),
                g.status.as_str(),
                g.progress,
            ],
        )?;
        Ok(())
    }

    /// Goal with its milestones.
    pub fn get_goal(&self, id: &str) -> Result<Option<Goal>> {
        let sql = format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1");
        let goal = self.conn.query_row(&sql, [id], row_to_goal).optional()?;
        match goal {
            Some(mut g) => {
                g.milestones = self.milestones_for_goal(&g.id)?;
                Ok(Some(g))
            }
            None => Ok(None),
        }
    }

    /// Goals with milestones, oldest first. Archived goals only when asked.
    pub fn list_goals(&self, include_archived: bool) -> Result<Vec<Goal>> {
        let sql = if include_archived {
            format!("SELECT {GOAL_COLUMNS} FROM goals ORDER BY created_on, id")
        } else {
            format!(
                "SELECT {GOAL_COLUMNS} FROM goals WHERE status != 'archived' \
                 ORDER BY created_on, id"
            )
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let mut goals = stmt
            .query_map([], row_to_goal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for g in &mut goals {
            g.milestones = self.milestones_for_goal(&g.id)?;
        }
        Ok(goals)
    }

    pub fn set_goal_status(&self, id: &str, status: GoalStatus) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE goals SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    /// Refresh the cached progress percentage.
    pub fn set_goal_progress(&self, id: &str, progress: f64) -> Result<()> {
        self.conn.execute(
            "UPDATE goals SET progress = ?1 WHERE id = ?2",
            params![progress, id],
        )?;
        Ok(())
    }

    /// Delete a goal and the milestones attached to it.
    pub fn delete_goal(&self, id: &str) -> Result<bool> {
        self.conn.execute("DELETE FROM milestones WHERE goal_id = ?1", [id])?;
        self.conn.execute("UPDATE habits SET goal_id = NULL WHERE goal_id = ?1", [id])?;
        let changed = self.conn.execute("DELETE FROM goals WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    pub fn count_sprints_for_goal(&self, goal_id: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sprints WHERE goal_id = ?1",
            [goal_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    // ── Milestones ──────────────────────────────────────────────────

    pub fn insert_milestone(&self, m: &Milestone) -> Result<()> {
        self.conn.execute(
            "INSERT INTO milestones (id, goal_id, sprint_id, title, target_date, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                m.id,
                m.goal_id,
                m.sprint_id,
                m.title,
                format_day(m.target_date),
                m.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_milestone(&self, id: &str) -> Result<Option<Milestone>> {
        let sql = format!("SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], row_to_milestone).optional()?)
    }

    /// Persist a completion timestamp. Only ever sets it once.
    pub fn mark_milestone_completed(&self, id: &str, at: DateTime<FixedOffset>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE milestones SET completed_at = ?1 WHERE id = ?2 AND completed_at IS NULL",
            params![at.to_rfc3339(), id],
        )?;
        Ok(changed > 0)
    }

    pub fn milestones_for_goal(&self, goal_id: &str) -> Result<Vec<Milestone>> {
        self.milestones_where("goal_id", goal_id)
    }

    pub fn milestones_for_sprint(&self, sprint_id: &str) -> Result<Vec<Milestone>> {
        self.milestones_where("sprint_id", sprint_id)
    }

    fn milestones_where(&self, column: &str, value: &str) -> Result<Vec<Milestone>> {
        let sql = format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE {column} = ?1 ORDER BY \
             target_date, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([value], row_to_milestone)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Sprints ─────────────────────────────────────────────────────

    pub fn insert_sprint(&self, s: &Sprint) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sprints (id, goal_id, title, week_number, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                s.id,
                s.goal_id,
                s.title,
                s.week_number,
                format_day(s.start_date),
                format_day(s.end_date),
            ],
        )?;
        Ok(())
    }

    /// Sprint with its tasks and milestones.
    pub fn get_sprint(&self, id: &str) -> Result<Option<Sprint>> {
        let sql = format!("SELECT {SPRINT_COLUMNS} FROM sprints WHERE id = ?1");
        let sprint = self.conn.query_row(&sql, [id], row_to_sprint).optional()?;
        sprint.map(|s| self.hydrate_sprint(s)).transpose()
    }

    /// Sprints ordered by start date, optionally only those of one goal.
    pub fn list_sprints(&self, goal_id: Option<&str>) -> Result<Vec<Sprint>> {
        let sprints = match goal_id {
            Some(goal_id) => {
                let sql = format!(
                    "SELECT {SPRINT_COLUMNS} FROM sprints WHERE goal_id = ?1 ORDER BY \
                     start_date, week_number"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([goal_id], row_to_sprint)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {SPRINT_COLUMNS} FROM sprints ORDER BY start_date, \
                     week_number"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt.query_map([], row_to_sprint)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        sprints.into_iter().map(|s| self.hydrate_sprint(s)).collect()
    }

    fn hydrate_sprint(&self, mut sprint: Sprint) -> Result<Sprint> {
        sprint.tasks = self.tasks_for_sprint(&sprint.id)?;
        sprint.milestones = self.milestones_for_sprint(&sprint.id)?;
        Ok(sprint)
    }

    // ── Tasks ───────────────────────────────────────────────────────

    pub fn insert_task(&self, t: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, priority, category, due_date, completed_at,
             source, sprint_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                t.id,
                t.title,
                t.priority.as_str(),
                t.category.as_str(),
                t.due_date.map(format_day),
                t.completed_at.map(|at| at.to_rfc3339()),
                t.source.as_str(),
                t.sprint_id,
                t.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], row_to_task).optional()?)
    }

    /// Set or clear the completion timestamp.
    pub fn set_task_completion(&self, id: &str, at: Option<DateTime<FixedOffset>>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks SET completed_at = ?1 WHERE id = ?2",
            params![at.map(|t| t.to_rfc3339()), id],
        )?;
        Ok(changed > 0)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn tasks_for_sprint(&self, sprint_id: &str) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE sprint_id = ?1 ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([sprint_id], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Tasks in any sprint linked to the goal.
    pub fn tasks_for_goal(&self, goal_id: &str) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks t JOIN sprints s ON s.id = t.sprint_id
             WHERE s.goal_id = ?1 ORDER BY t.created_at, t.id",
            TASK_COLUMNS
                .split(',')
                .map(|c| format!("t.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([goal_id], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Habits ──────────────────────────────────────────────────────

    pub fn insert_habit(&self, h: &Habit) -> Result<()> {
        self.conn.execute(
            "INSERT INTO habits (id, title, goal_id, created_on, archived)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![h.id, h.title, h.goal_id, format_day(h.created_on), h.archived],
        )?;
        Ok(())
    }

    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
        let habit = self
            .conn
            .query_row(
                "SELECT id, title, goal_id, created_on, archived FROM habits WHERE id = ?1",
                [id],
                row_to_habit,
            )
            .optional()?;
        match habit {
            Some(mut h) => {
                h.completions = self.habit_days(&h.id)?;
                Ok(Some(h))
            }
            None => Ok(None),
        }
    }

    /// Unarchived habits with their completion days.
    pub fn list_habits(&self) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, goal_id, created_on, archived FROM habits
             WHERE archived = 0 ORDER BY created_on, id",
        )?;
        let mut habits = stmt
            .query_map([], row_to_habit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for h in &mut habits {
            h.completions = self.habit_days(&h.id)?;
        }
        Ok(habits)
    }

    /// Record a completion day. Returns false if it was already logged.
    pub fn log_habit(&self, habit_id: &str, day: NaiveDate) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO habit_logs (habit_id, date) VALUES (?1, ?2)",
            params![habit_id, format_day(day)],
        )?;
        Ok(changed > 0)
    }

    fn habit_days(&self, habit_id: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date FROM habit_logs WHERE habit_id = ?1 ORDER BY date")?;
        let rows = stmt.query_map([habit_id], |row| day_at(row, 0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Drafts ──────────────────────────────────────────────────────

    /// The draft for a day, with derived fields recomputed.
    pub fn get_brain_dump(&self, date: NaiveDate) -> Result<Option<DailyBrainDump>> {
        Ok(self
            .conn
            .query_row(
                "SELECT date, text, goal_ids, finalized, updated_at FROM brain_dumps \
                 WHERE date = ?1",
                [format_day(date)],
                row_to_brain_dump,
            )
            .optional()?)
    }

    pub fn upsert_brain_dump(&self, dump: &DailyBrainDump) -> Result<()> {
        let goal_ids = serde_json::to_string(&dump.goal_ids)?;
        self.conn.execute(
            "INSERT INTO brain_dumps (date, text, goal_ids, finalized, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(date) DO UPDATE SET
                text = excluded.text,
                goal_ids = excluded.goal_ids,
                finalized = excluded.finalized,
                updated_at = excluded.updated_at",
            params![
                format_day(dump.date),
                dump.text,
                goal_ids,
                dump.finalized,
                dump.updated_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    // ── Event log ───────────────────────────────────────────────────

    /// Append an event. Returns its sequence number.
    ///
    /// Draft edits keep a single row per day: a later `DraftUpdated` for
    /// the same date rewrites that row and keeps its sequence number.
    pub fn append_event(&self, event: &Event) -> Result<i64> {
        let payload = serde_json::to_string(event)?;
        let recorded_at = event.at().to_rfc3339();
        if let Event::DraftUpdated { date, .. } = event {
            let existing: Option<i64> = self
                .conn
                .query_row(
                    "SELECT id FROM event_log
                     WHERE kind = ?1 AND json_extract(payload, '$.date') = ?2",
                    params![event.kind(), format_day(*date)],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(seq) = existing {
                self.conn.execute(
                    "UPDATE event_log SET payload = ?1, recorded_at = ?2 WHERE id = ?3",
                    params![payload, recorded_at, seq],
                )?;
                return Ok(seq);
            }
        }
        self.conn.execute(
            "INSERT INTO event_log (kind, payload, material, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            params![event.kind(), payload, event.is_material(), recorded_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Sequence number of the latest material event, 0 if none.
    pub fn data_revision(&self) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM event_log WHERE material = 1",
            [],
            |row| row.get(0),
        )?)
    }

    // ── Insight cache ───────────────────────────────────────────────

    pub fn cached_insights(&self) -> Result<Option<InsightCacheEntry>> {
        Ok(self
            .conn
            .query_row(
                "SELECT revision, day, insights FROM insight_cache WHERE id = 1",
                [],
                |row| {
                    Ok(InsightCacheEntry {
                        revision: row.get(0)?,
                        day: day_at(row, 1)?,
                        insights: json_at(row, 2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn store_insights(&self, entry: &InsightCacheEntry) -> Result<()> {
        let insights = serde_json::to_string(&entry.insights)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO insight_cache (id, revision, day, insights)
             VALUES (1, ?1, ?2, ?3)",
            params![entry.revision, format_day(entry.day), insights],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn check_in(id: &str, date: NaiveDate) -> CheckIn {
        CheckIn {
            id: id.into(),
            date,
            mood: MoodLabel::Good,
            happy_thing: "Walked the dog".into(),
            improve_thing: String::new(),
            fields: StructuredFields {
                sleep: Some(Level::High),
                ..Default::default()
            },
            activities: vec!["walk".into()],
            ai_response: None,
            submitted_at: at(&format!("{date}T21:00:00-05:00")),
        }
    }

    fn goal(id: &str) -> Goal {
        let created_on = d(2026, 1, 1);
        Goal {
            id: id.into(),
            title: "Run a 10k".into(),
            description: None,
            category: Category::Health,
            created_on,
            target_date: Goal::target_for(created_on),
            status: GoalStatus::Active,
            milestones: Vec::new(),
            progress: 0.0,
        }
    }

    fn sprint(id: &str, goal_id: &str) -> Sprint {
        let start = d(2026, 1, 1);
        Sprint {
            id: id.into(),
            goal_id: Some(goal_id.into()),
            title: "Base building".into(),
            week_number: 1,
            start_date: start,
            end_date: Sprint::end_for(start),
            tasks: Vec::new(),
            milestones: Vec::new(),
        }
    }

    fn task(id: &str, sprint_id: Option<&str>) -> Task {
        Task {
            id: id.into(),
            title: "Buy shoes".into(),
            priority: Priority::High,
            category: Category::Health,
            due_date: Some(d(2026, 1, 5)),
            completed_at: None,
            source: TaskSource::Manual,
            sprint_id: sprint_id.map(str::to_string),
            created_at: at("2026-01-01T09:00:00+00:00"),
        }
    }

    #[test]
    fn check_in_roundtrip_keeps_offset_and_fields() {
        let store = EventStore::open_memory().unwrap();
        let c = check_in("c1", d(2026, 3, 7));
        store.insert_check_in(&c).unwrap();
        let loaded = store.check_in_on(c.date).unwrap().unwrap();
        assert_eq!(loaded, c);
        assert_eq!(loaded.submitted_at.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn duplicate_day_is_rejected() {
        let store = EventStore::open_memory().unwrap();
        store.insert_check_in(&check_in("c1", d(2026, 3, 7))).unwrap();
        let err = store.insert_check_in(&check_in("c2", d(2026, 3, 7))).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateDate { date } if date == d(2026, 3, 7)));
        assert_eq!(store.list_check_ins().unwrap().len(), 1);
    }

    #[test]
    fn check_ins_between_is_inclusive_and_ordered() {
        let store = EventStore::open_memory().unwrap();
        for (i, day) in [5, 1, 3, 9].iter().enumerate() {
            store.insert_check_in(&check_in(&format!("c{i}"), d(2026, 3, *day))).unwrap();
        }
        let between = store.check_ins_between(d(2026, 3, 1), d(2026, 3, 5)).unwrap();
        let days: Vec<u32> = between.iter().map(|c| chrono::Datelike::day(&c.date)).collect();
        assert_eq!(days, vec![1, 3, 5]);
        assert_eq!(store.check_in_dates().unwrap().len(), 4);
    }

    #[test]
    fn ai_response_is_stored_on_existing_day_only() {
        let store = EventStore::open_memory().unwrap();
        store.insert_check_in(&check_in("c1", d(2026, 3, 7))).unwrap();
        assert!(store.set_ai_response(d(2026, 3, 7), "Nice work").unwrap());
        assert!(!store.set_ai_response(d(2026, 3, 8), "Nobody home").unwrap());
        let c = store.check_in_on(d(2026, 3, 7)).unwrap().unwrap();
        assert_eq!(c.ai_response.as_deref(), Some("Nice work"));
    }

    #[test]
    fn goal_with_milestones_and_sprint_tasks() {
        let store = EventStore::open_memory().unwrap();
        store.insert_goal(&goal("g1")).unwrap();
        store.insert_sprint(&sprint("s1", "g1")).unwrap();
        store
            .insert_milestone(&Milestone {
                id: "m1".into(),
                goal_id: Some("g1".into()),
                sprint_id: Some("s1".into()),
                title: "5k without stopping".into(),
                target_date: d(2026, 1, 28),
                completed_at: None,
            })
            .unwrap();
        store.insert_task(&task("t1", Some("s1"))).unwrap();
        store.insert_task(&task("t2", None)).unwrap();

        let g = store.get_goal("g1").unwrap().unwrap();
        assert_eq!(g.milestones.len(), 1);
        assert_eq!(store.tasks_for_goal("g1").unwrap().len(), 1);
        assert_eq!(store.count_sprints_for_goal("g1").unwrap(), 1);

        let s = store.get_sprint("s1").unwrap().unwrap();
        assert_eq!(s.tasks.len(), 1);
        assert_eq!(s.milestones.len(), 1);
        assert_eq!(store.list_tasks().unwrap().len(), 2);
    }

    #[test]
    fn milestone_completion_is_set_once() {
        let store = EventStore::open_memory().unwrap();
        store
            .insert_milestone(&Milestone {
                id: "m1".into(),
                goal_id: None,
                sprint_id: None,
                title: "Standalone".into(),
                target_date: d(2026, 2, 1),
                completed_at: None,
            })
            .unwrap();
        let first = at("2026-01-10T10:00:00+00:00");
        assert!(store.mark_milestone_completed("m1", first).unwrap());
        assert!(!store
            .mark_milestone_completed("m1", at("2026-01-11T10:00:00+00:00"))
            .unwrap());
        assert_eq!(store.get_milestone("m1").unwrap().unwrap().completed_at, Some(first));
    }

    #[test]
    fn archived_goals_hidden_by_default() {
        let store = EventStore::open_memory().unwrap();
        store.insert_goal(&goal("g1")).unwrap();
        store.insert_goal(&goal("g2")).unwrap();
        store.set_goal_status("g2", GoalStatus::Archived).unwrap();
        assert_eq!(store.list_goals(false).unwrap().len(), 1);
        assert_eq!(store.list_goals(true).unwrap().len(), 2);
        assert!(store.delete_goal("g1").unwrap());
        assert!(store.get_goal("g1").unwrap().is_none());
    }

    #[test]
    fn task_completion_toggles() {
        let store = EventStore::open_memory().unwrap();
        store.insert_task(&task("t1", None)).unwrap();
        let done = at("2026-01-03T18:00:00+00:00");
        store.set_task_completion("t1", Some(done)).unwrap();
        assert!(store.get_task("t1").unwrap().unwrap().is_completed());
        store.set_task_completion("t1", None).unwrap();
        assert!(!store.get_task("t1").unwrap().unwrap().is_completed());
        assert!(!store.set_task_completion("missing", None).unwrap());
    }

    #[test]
    fn habit_logs_are_idempotent() {
        let store = EventStore::open_memory().unwrap();
        store
            .insert_habit(&Habit {
                id: "h1".into(),
                title: "Stretch".into(),
                goal_id: None,
                created_on: d(2026, 1, 1),
                archived: false,
                completions: Vec::new(),
            })
            .unwrap();
        assert!(store.log_habit("h1", d(2026, 1, 2)).unwrap());
        assert!(!store.log_habit("h1", d(2026, 1, 2)).unwrap());
        assert!(store.log_habit("h1", d(2026, 1, 1)).unwrap());
        let h = store.get_habit("h1").unwrap().unwrap();
        assert_eq!(h.completions, vec![d(2026, 1, 1), d(2026, 1, 2)]);
        assert_eq!(store.list_habits().unwrap().len(), 1);
    }

    #[test]
    fn brain_dump_upsert_recomputes_metrics() {
        let store = EventStore::open_memory().unwrap();
        let day = d(2026, 1, 2);
        let mut dump = DailyBrainDump::new(day);
        dump.edit(
            "Slept well. Went running.",
            ["g1".to_string()].into_iter().collect(),
            at("2026-01-02T08:00:00+00:00"),
        )
        .unwrap();
        store.upsert_brain_dump(&dump).unwrap();
        let loaded = store.get_brain_dump(day).unwrap().unwrap();
        assert_eq!(loaded, dump);
        assert!(loaded.is_ai_chat_unlocked);

        dump.finalized = true;
        store.upsert_brain_dump(&dump).unwrap();
        assert!(store.get_brain_dump(day).unwrap().unwrap().finalized);
    }

    #[test]
    fn data_revision_tracks_material_events_only() {
        let store = EventStore::open_memory().unwrap();
        assert_eq!(store.data_revision().unwrap(), 0);
        let now = at("2026-01-02T08:00:00+00:00");
        let seq = store
            .append_event(&Event::GoalCreated {
                goal_id: "g1".into(),
                at: now,
            })
            .unwrap();
        assert_eq!(store.data_revision().unwrap(), seq);
        store
            .append_event(&Event::DraftUpdated {
                date: now.date_naive(),
                word_count: 1,
                sentence_count: 0,
                at: now,
            })
            .unwrap();
        assert_eq!(store.data_revision().unwrap(), seq);
    }

    #[test]
    fn draft_edits_share_one_log_row_per_day() {
        let store = EventStore::open_memory().unwrap();
        let draft_rows = |store: &EventStore| -> i64 {
            store
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM event_log WHERE kind = 'DraftUpdated'",
                    [],
                    |row| row.get(0),
                )
                .unwrap()
        };
        let edit = |day: &str, words: usize| Event::DraftUpdated {
            date: NaiveDate::parse_from_str(day, DAY_FORMAT).unwrap(),
            word_count: words,
            sentence_count: 1,
            at: at(&format!("{day}T09:00:00+00:00")),
        };

        let first = store.append_event(&edit("2026-01-02", 1)).unwrap();
        assert_eq!(store.append_event(&edit("2026-01-02", 2)).unwrap(), first);
        assert_eq!(store.append_event(&edit("2026-01-02", 3)).unwrap(), first);
        assert_eq!(draft_rows(&store), 1);
        let payload: String = store
            .conn
            .query_row("SELECT payload FROM event_log WHERE id = ?1", [first], |row| row.get(0))
            .unwrap();
        assert!(payload.contains("\"word_count\":3"), "{payload}");

        assert_ne!(store.append_event(&edit("2026-01-03", 1)).unwrap(), first);
        assert_eq!(draft_rows(&store), 2);
    }

    #[test]
    fn insight_cache_replaces_previous_entry() {
        let store = EventStore::open_memory().unwrap();
        assert!(store.cached_insights().unwrap().is_none());
        let entry = InsightCacheEntry {
            revision: 3,
            day: d(2026, 1, 2),
            insights: Vec::new(),
        };
        store.store_insights(&entry).unwrap();
        store
            .store_insights(&InsightCacheEntry { revision: 4, ..entry })
            .unwrap();
        assert_eq!(store.cached_insights().unwrap().unwrap().revision, 4);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = EventStore::open_memory().unwrap();
        let result: Result<()> = store.transaction(|s| {
            s.insert_goal(&goal("g1"))?;
            Err(CoreError::not_found("goal", "boom"))
        });
        assert!(result.is_err());
        assert!(store.get_goal("g1").unwrap().is_none());
    }

    #[test]
    fn open_at_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thrive.db");
        {
            let store = EventStore::open_at(&path).unwrap();
            store.insert_goal(&goal("g1")).unwrap();
        }
        let store = EventStore::open_at(&path).unwrap();
        assert_eq!(store.list_goals(true).unwrap().len(), 1);
    }
}
