//! Goal and spark storage with SQLite
//!
//! - Goals are always read and written scoped to their owner
//! - Spark sequence numbers are allocated inside the insert transaction
//! - Completing a spark records the completion and bumps the goal counter
//!   in one transaction

mod schema;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub use schema::SCHEMA;

const GOAL_COLUMNS: &str =
    "id, user_id, title, description, status, total_sparks_completed, created_at, updated_at";

const SPARK_COLUMNS: &str = "id, goal_id, title, description, effort_minutes, resource_link, \
                             ai_generated, sequence_number, created_at";

const COMPLETION_COLUMNS: &str =
    "id, user_id, spark_id, goal_id, completed_at, session_id, notes";

pub struct SparkStore {
    conn: Mutex<Connection>,
}

impl SparkStore {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("store connection lock poisoned"))
    }

    // ============================================
    // PROFILES
    // ============================================

    /// Provision a profile row for a user the first time they show up
    pub fn ensure_profile(&self, user_id: &str) -> Result<()> {
        let now = now();
        self.conn()?.execute(
            "INSERT OR IGNORE INTO profiles (id, premium_tier, created_at, updated_at)
             VALUES (?, 'free', ?, ?)",
            params![user_id, now, now],
        )?;
        Ok(())
    }

    // ============================================
    // GOALS
    // ============================================

    /// All goals owned by `user_id`, newest first
    pub fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], goal_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn create_goal(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<Goal> {
        let id = Uuid::new_v4().to_string();
        let now = now();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO goals
               (id, user_id, title, description, status, total_sparks_completed,
                created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
            params![id, user_id, title, description, GoalStatus::Active, now, now],
        )?;

        find_goal(&conn, user_id, &id)?.ok_or_else(|| anyhow!("goal {} missing after insert", id))
    }

    /// Fetch a goal only if it belongs to `user_id`
    pub fn get_goal(&self, user_id: &str, id: &str) -> Result<Option<Goal>> {
        let conn = self.conn()?;
        find_goal(&conn, user_id, id)
    }

    /// Apply a partial update; `updated_at` is refreshed on every call
    pub fn update_goal(
        &self,
        user_id: &str,
        id: &str,
        update: &GoalUpdate,
    ) -> Result<Option<Goal>> {
        let (set_description, description) = match &update.description {
            Some(description) => (true, description.as_deref()),
            None => (false, None),
        };

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"UPDATE goals SET
                   title = COALESCE(?1, title),
                   description = CASE WHEN ?2 THEN ?3 ELSE description END,
                   status = COALESCE(?4, status),
                   updated_at = ?5
               WHERE id = ?6 AND user_id = ?7"#,
            params![
                update.title,
                set_description,
                description,
                update.status,
                now(),
                id,
                user_id,
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        find_goal(&conn, user_id, id)
    }

    /// Hard delete; sparks and completions go with it via ON DELETE CASCADE
    pub fn delete_goal(&self, user_id: &str, id: &str) -> Result<bool> {
        let changed = self.conn()?.execute(
            "DELETE FROM goals WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(changed > 0)
    }

    // ============================================
    // SPARKS
    // ============================================

    /// Sparks of a goal in sequence order
    pub fn list_sparks(&self, goal_id: &str) -> Result<Vec<Spark>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SPARK_COLUMNS} FROM sparks
             WHERE goal_id = ?
             ORDER BY sequence_number ASC"
        ))?;

        let rows = stmt.query_map(params![goal_id], spark_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_spark(&self, id: &str) -> Result<Option<Spark>> {
        let conn = self.conn()?;
        find_spark(&conn, id)
    }

    /// Persist a spark as the next one in its goal's sequence
    pub fn insert_spark(&self, goal_id: &str, spark: &NewSpark) -> Result<Spark> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sequence_number: i64 = tx.query_row(
            "SELECT COUNT(*) + 1 FROM sparks WHERE goal_id = ?",
            params![goal_id],
            |row| row.get(0),
        )?;

        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO sparks
               (id, goal_id, title, description, effort_minutes, resource_link,
                ai_generated, sequence_number, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                goal_id,
                spark.title,
                spark.description,
                spark.effort_minutes,
                spark.resource_link,
                spark.ai_generated,
                sequence_number,
                now(),
            ],
        )?;

        let inserted =
            find_spark(&tx, &id)?.ok_or_else(|| anyhow!("spark {} missing after insert", id))?;
        tx.commit()?;
        Ok(inserted)
    }

    // ============================================
    // COMPLETIONS
    // ============================================

    /// Record that `user_id` finished a spark and bump the goal counter.
    ///
    /// The duplicate check, the insert and the increment share one
    /// transaction, so the counter always matches the completion log.
    pub fn complete_spark(
        &self,
        user_id: &str,
        completion: &NewCompletion,
    ) -> Result<CompletionOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx.query_row(
            "SELECT id FROM spark_completions WHERE user_id = ? AND spark_id = ?",
            params![user_id, completion.spark_id],
            |row| row.get::<_, String>(0),
        );

        match existing {
            Ok(_) => return Ok(CompletionOutcome::AlreadyCompleted),
            Err(rusqlite::Error::QueryReturnedNoRows) => {}
            Err(e) => return Err(e.into()),
        }

        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO spark_completions
               (id, user_id, spark_id, goal_id, completed_at, session_id, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                user_id,
                completion.spark_id,
                completion.goal_id,
                now(),
                completion.session_id,
                completion.notes,
            ],
        )?;

        increment_goal_sparks(&tx, &completion.goal_id)?;

        let row = tx.query_row(
            &format!("SELECT {COMPLETION_COLUMNS} FROM spark_completions WHERE id = ?"),
            params![id],
            completion_from_row,
        )?;
        tx.commit()?;

        Ok(CompletionOutcome::Created(row))
    }

    /// Completions of a goal joined with their spark, newest first
    pub fn completed_sparks(&self, user_id: &str, goal_id: &str) -> Result<Vec<CompletedSpark>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT c.id, c.completed_at, c.notes,
                      s.id, s.title, s.description, s.effort_minutes, s.resource_link
               FROM spark_completions c
               JOIN sparks s ON s.id = c.spark_id
               WHERE c.goal_id = ?1 AND c.user_id = ?2
               ORDER BY c.completed_at DESC, c.rowid DESC"#,
        )?;

        let rows = stmt.query_map(params![goal_id, user_id], |row| {
            Ok(CompletedSpark {
                id: row.get(0)?,
                completed_at: row.get(1)?,
                notes: row.get(2)?,
                spark: SparkSummary {
                    id: row.get(3)?,
                    title: row.get(4)?,
                    description: row.get(5)?,
                    effort_minutes: row.get(6)?,
                    resource_link: row.get(7)?,
                },
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn find_goal(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Goal>> {
    let result = conn.query_row(
        &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ? AND user_id = ?"),
        params![id, user_id],
        goal_from_row,
    );

    match result {
        Ok(goal) => Ok(Some(goal)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn find_spark(conn: &Connection, id: &str) -> Result<Option<Spark>> {
    let result = conn.query_row(
        &format!("SELECT {SPARK_COLUMNS} FROM sparks WHERE id = ?"),
        params![id],
        spark_from_row,
    );

    match result {
        Ok(spark) => Ok(Some(spark)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Counter bump used by `complete_spark`; the only writer of
/// `total_sparks_completed`.
fn increment_goal_sparks(conn: &Connection, goal_id: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE goals SET total_sparks_completed = total_sparks_completed + 1 WHERE id = ?",
        params![goal_id],
    )?;
    if changed == 0 {
        return Err(anyhow!("goal {} not found while incrementing sparks", goal_id));
    }
    Ok(())
}

fn goal_from_row(row: &Row) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        total_sparks_completed: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn spark_from_row(row: &Row) -> rusqlite::Result<Spark> {
    Ok(Spark {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        effort_minutes: row.get(4)?,
        resource_link: row.get(5)?,
        ai_generated: row.get(6)?,
        sequence_number: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn completion_from_row(row: &Row) -> rusqlite::Result<SparkCompletion> {
    Ok(SparkCompletion {
        id: row.get(0)?,
        user_id: row.get(1)?,
        spark_id: row.get(2)?,
        goal_id: row.get(3)?,
        completed_at: row.get(4)?,
        session_id: row.get(5)?,
        notes: row.get(6)?,
    })
}

// ============================================
// ROW TYPES
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Paused => "paused",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown goal status '{0}' (expected active, paused, completed or archived)")]
pub struct UnknownGoalStatus(pub String);

impl FromStr for GoalStatus {
    type Err = UnknownGoalStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "paused" => Ok(GoalStatus::Paused),
            "completed" => Ok(GoalStatus::Completed),
            "archived" => Ok(GoalStatus::Archived),
            other => Err(UnknownGoalStatus(other.to_string())),
        }
    }
}

impl ToSql for GoalStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for GoalStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: GoalStatus,
    pub total_sparks_completed: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial goal edit. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spark {
    pub id: String,
    pub goal_id: String,
    pub title: String,
    pub description: Option<String>,
    pub effort_minutes: i64,
    pub resource_link: Option<String>,
    pub ai_generated: bool,
    pub sequence_number: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSpark {
    pub title: String,
    pub description: Option<String>,
    pub effort_minutes: i64,
    pub resource_link: Option<String>,
    pub ai_generated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkCompletion {
    pub id: String,
    pub user_id: String,
    pub spark_id: String,
    pub goal_id: String,
    pub completed_at: String,
    pub session_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub spark_id: String,
    pub goal_id: String,
    pub session_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub enum CompletionOutcome {
    Created(SparkCompletion),
    AlreadyCompleted,
}

/// A completion as shown on the progress view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSpark {
    pub id: String,
    pub completed_at: String,
    pub notes: Option<String>,
    pub spark: SparkSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparkSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub effort_minutes: i64,
    pub resource_link: Option<String>,
}
