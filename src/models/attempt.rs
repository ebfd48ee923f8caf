// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// One captured answer inside an attempt.
/// `selected` is the empty string when the countdown expired unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub question_id: i64,
    pub selected: String,
    pub is_correct: bool,

    /// Seconds spent on this question, bounded by the question's budget.
    pub time_spent_secs: u32,
}

/// Represents the 'attempts' table in the database.
/// Insert-only: an attempt is written once after finalization and never
/// mutated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub correct_count: i32,
    pub total_questions: i32,

    /// Canonical score: rounded percentage, 0..=100.
    pub score: i32,

    pub time_spent_secs: i32,
    pub answers: Json<Vec<AttemptAnswer>>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// A finalized attempt before it has an identity in the store.
/// Produced by the attempt session, consumed by the recorder; also the
/// shape written to the local fallback queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttempt {
    pub quiz_id: i64,
    pub user_id: i64,
    pub correct_count: u32,
    pub total_questions: u32,
    pub score: u32,
    pub time_spent_secs: u32,
    pub answers: Vec<AttemptAnswer>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}
