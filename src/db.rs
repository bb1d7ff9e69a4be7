use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::profile::{Counter, ProfileField, UserProfile};

/// A completed consultation booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultationRequest {
    pub name: String,
    pub role: String,
    pub contact: String,
    pub date: NaiveDate,
    pub time: String,
}

/// A finished quiz attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizAttempt {
    pub score: u32,
    pub max_score: u32,
}

/// Represents a consultation row in the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredConsultation {
    pub id: i64,
    pub telegram_id: i64,
    pub request: ConsultationRequest,
    pub created_at: DateTime<Utc>,
}

/// Represents a quiz result row in the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuizAttempt {
    pub id: i64,
    pub telegram_id: i64,
    pub attempt: QuizAttempt,
    pub created_at: DateTime<Utc>,
}

/// Open a connection pool, creating the database file if needed
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {}", database_url))?
        .create_if_missing(true);

    // Every connection to an in-memory database sees its own empty database
    let in_memory = database_url.contains(":memory:");
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .idle_timeout(if in_memory { None } else { Some(std::time::Duration::from_secs(600)) })
        .max_lifetime(if in_memory { None } else { Some(std::time::Duration::from_secs(1800)) })
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_profiles (
            telegram_id INTEGER PRIMARY KEY,
            name TEXT,
            business_type TEXT,
            files_uploaded INTEGER NOT NULL DEFAULT 0,
            materials_downloaded INTEGER NOT NULL DEFAULT 0,
            consultations_requested INTEGER NOT NULL DEFAULT 0,
            quizzes_completed INTEGER NOT NULL DEFAULT 0,
            last_visit TEXT,
            created_at TEXT
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create user_profiles table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            action TEXT NOT NULL,
            payload TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create events table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_user_action ON events (telegram_id, action)")
        .execute(pool)
        .await
        .context("Failed to create events index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS consultations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            contact TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create consultations table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS quiz_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL,
            score INTEGER NOT NULL,
            max_score INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create quiz_results table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Record a visit, creating the profile on first contact
pub async fn touch(pool: &SqlitePool, telegram_id: i64) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO user_profiles (telegram_id, last_visit, created_at) VALUES (?, ?, ?)
         ON CONFLICT(telegram_id) DO UPDATE SET last_visit = excluded.last_visit",
    )
    .bind(telegram_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to touch user profile")?;

    debug!(user_id = %telegram_id, "Profile touched");
    Ok(())
}

/// Add one to a profile counter in a single statement
pub async fn increment(pool: &SqlitePool, telegram_id: i64, counter: Counter) -> Result<()> {
    let column = counter.column();
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO user_profiles (telegram_id, {column}, last_visit, created_at) VALUES (?, 1, ?, ?)
         ON CONFLICT(telegram_id) DO UPDATE SET {column} = {column} + 1, last_visit = excluded.last_visit"
    );
    sqlx::query(&sql)
        .bind(telegram_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to increment {}", column))?;

    debug!(user_id = %telegram_id, counter = column, "Profile counter incremented");
    Ok(())
}

/// Overwrite a free-form profile field
pub async fn set_field(
    pool: &SqlitePool,
    telegram_id: i64,
    field: ProfileField,
    value: &str,
) -> Result<()> {
    let column = field.column();
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO user_profiles (telegram_id, {column}, last_visit, created_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(telegram_id) DO UPDATE SET {column} = excluded.{column}, last_visit = excluded.last_visit"
    );
    sqlx::query(&sql)
        .bind(telegram_id)
        .bind(value)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to set {}", column))?;

    debug!(user_id = %telegram_id, field = column, "Profile field updated");
    Ok(())
}

/// Read a profile; a user that was never stored gets zero counters
pub async fn get_profile(pool: &SqlitePool, telegram_id: i64) -> Result<UserProfile> {
    let row = sqlx::query(
        "SELECT telegram_id, name, business_type, files_uploaded, materials_downloaded,
                consultations_requested, quizzes_completed, last_visit, created_at
         FROM user_profiles WHERE telegram_id = ?",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user profile")?;

    match row {
        Some(row) => profile_from_row(&row),
        None => Ok(UserProfile::new(telegram_id)),
    }
}

fn profile_from_row(row: &SqliteRow) -> Result<UserProfile> {
    Ok(UserProfile {
        telegram_id: row.try_get("telegram_id")?,
        name: row.try_get("name")?,
        business_type: row.try_get("business_type")?,
        files_uploaded: row.try_get("files_uploaded")?,
        materials_downloaded: row.try_get("materials_downloaded")?,
        consultations_requested: row.try_get("consultations_requested")?,
        quizzes_completed: row.try_get("quizzes_completed")?,
        last_visit: row.try_get("last_visit")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Append an entry to the event log
pub async fn log_event(pool: &SqlitePool, telegram_id: i64, action: &str, payload: &str) -> Result<()> {
    sqlx::query("INSERT INTO events (telegram_id, action, payload, created_at) VALUES (?, ?, ?, ?)")
        .bind(telegram_id)
        .bind(action)
        .bind(payload)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to log event")?;
    Ok(())
}

/// Number of logged events of one action for a user
pub async fn count_events(pool: &SqlitePool, telegram_id: i64, action: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE telegram_id = ? AND action = ?")
            .bind(telegram_id)
            .bind(action)
            .fetch_one(pool)
            .await
            .context("Failed to count events")?;
    Ok(count)
}

/// Store a consultation booking and return its id
pub async fn save_consultation(
    pool: &SqlitePool,
    telegram_id: i64,
    request: &ConsultationRequest,
) -> Result<i64> {
    info!(user_id = %telegram_id, date = %request.date, time = %request.time, "Saving consultation");

    let result = sqlx::query(
        "INSERT INTO consultations (telegram_id, name, role, contact, date, time, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(telegram_id)
    .bind(&request.name)
    .bind(&request.role)
    .bind(&request.contact)
    .bind(request.date)
    .bind(&request.time)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to save consultation")?;

    Ok(result.last_insert_rowid())
}

/// Store a finished quiz attempt and return its id
pub async fn save_quiz_attempt(
    pool: &SqlitePool,
    telegram_id: i64,
    attempt: &QuizAttempt,
) -> Result<i64> {
    info!(
        user_id = %telegram_id,
        score = attempt.score,
        max_score = attempt.max_score,
        "Saving quiz attempt"
    );

    let result = sqlx::query(
        "INSERT INTO quiz_results (telegram_id, score, max_score, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(telegram_id)
    .bind(attempt.score)
    .bind(attempt.max_score)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to save quiz attempt")?;

    Ok(result.last_insert_rowid())
}

/// Consultations booked by a user, oldest first
pub async fn list_consultations(pool: &SqlitePool, telegram_id: i64) -> Result<Vec<StoredConsultation>> {
    let rows = sqlx::query(
        "SELECT id, telegram_id, name, role, contact, date, time, created_at
         FROM consultations WHERE telegram_id = ? ORDER BY id",
    )
    .bind(telegram_id)
    .fetch_all(pool)
    .await
    .context("Failed to list consultations")?;

    rows.iter()
        .map(|row| -> Result<StoredConsultation> {
            Ok(StoredConsultation {
                id: row.try_get("id")?,
                telegram_id: row.try_get("telegram_id")?,
                request: ConsultationRequest {
                    name: row.try_get("name")?,
                    role: row.try_get("role")?,
                    contact: row.try_get("contact")?,
                    date: row.try_get("date")?,
                    time: row.try_get("time")?,
                },
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

/// Quiz attempts of a user, oldest first
pub async fn list_quiz_attempts(pool: &SqlitePool, telegram_id: i64) -> Result<Vec<StoredQuizAttempt>> {
    let rows = sqlx::query(
        "SELECT id, telegram_id, score, max_score, created_at
         FROM quiz_results WHERE telegram_id = ? ORDER BY id",
    )
    .bind(telegram_id)
    .fetch_all(pool)
    .await
    .context("Failed to list quiz attempts")?;

    rows.iter()
        .map(|row| -> Result<StoredQuizAttempt> {
            Ok(StoredQuizAttempt {
                id: row.try_get("id")?,
                telegram_id: row.try_get("telegram_id")?,
                attempt: QuizAttempt {
                    score: row.try_get("score")?,
                    max_score: row.try_get("max_score")?,
                },
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}
