// src/recorder.rs
//
// Attempt persistence with a durable local fallback. A finalized attempt
// is either written to the database or appended to a JSONL queue on disk;
// it is never dropped. Queued records wait for manual reconciliation.

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    sync::Mutex,
};

use sqlx::PgPool;

use crate::{
    error::{AppError, is_undefined_table},
    models::attempt::NewAttempt,
};

/// How a finalized attempt ended up stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceResult {
    /// The attempt has an identity in the database.
    Persisted { id: i64 },
    /// The database refused it; the record sits in the local queue and the
    /// leaderboard will not reflect it until reconciled.
    QueuedLocally,
}

/// Append-only JSONL queue for attempts the database would not take.
#[derive(Debug)]
pub struct AttemptFallback {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AttemptFallback {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Appends one attempt as a JSON line, creating the file (and parent
    /// directory) on first use.
    pub fn enqueue(&self, attempt: &NewAttempt) -> io::Result<()> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let line = serde_json::to_string(attempt).map_err(io::Error::other)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Reads back everything currently queued. Lines that fail to parse
    /// are skipped with a warning rather than poisoning the whole read.
    pub fn queued(&self) -> io::Result<Vec<NewAttempt>> {
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut attempts = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(attempt) => attempts.push(attempt),
                Err(e) => tracing::warn!("Skipping unreadable queued attempt: {}", e),
            }
        }
        Ok(attempts)
    }
}

/// Persists a finalized attempt, degrading to the local queue on failure.
///
/// The caller gets an error only when both the database and the queue
/// reject the record — a missing table or an unreachable backend comes
/// back as `QueuedLocally`, not as a failure, so the user's score is
/// never blocked on persistence.
pub async fn record_attempt(
    pool: &PgPool,
    fallback: &AttemptFallback,
    attempt: &NewAttempt,
) -> Result<PersistenceResult, AppError> {
    let inserted: Result<i64, sqlx::Error> = sqlx::query_scalar(
        r#"
        INSERT INTO attempts
        (quiz_id, user_id, correct_count, total_questions, score, time_spent_secs, answers, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(attempt.quiz_id)
    .bind(attempt.user_id)
    .bind(attempt.correct_count as i32)
    .bind(attempt.total_questions as i32)
    .bind(attempt.score as i32)
    .bind(attempt.time_spent_secs as i32)
    .bind(sqlx::types::Json(&attempt.answers))
    .bind(attempt.completed_at)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(id) => Ok(PersistenceResult::Persisted { id }),
        Err(e) => {
            if is_undefined_table(&e) {
                tracing::warn!("Attempts relation is missing, queuing locally: {}", e);
            } else {
                tracing::error!("Failed to persist attempt, queuing locally: {}", e);
            }

            fallback.enqueue(attempt).map_err(|io_err| {
                AppError::InternalServerError(format!(
                    "attempt could not be stored or queued: {}",
                    io_err
                ))
            })?;

            Ok(PersistenceResult::QueuedLocally)
        }
    }
}
