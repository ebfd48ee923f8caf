// src/models/leaderboard.rs

use serde::Serialize;
use sqlx::FromRow;

/// One recorded attempt joined with its user, the raw material for
/// leaderboard aggregation.
#[derive(Debug, Clone, FromRow)]
pub struct ScoredAttempt {
    pub user_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub quiz_id: i64,

    /// Percentage score, 0..=100.
    pub score: i32,

    pub time_spent_secs: i32,
}

impl ScoredAttempt {
    /// Name shown on the board: display name when set, username otherwise.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Derived per-user standing. Never stored: recomputed on demand from the
/// attempt set so it cannot drift from the raw records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub attempts: usize,
    pub distinct_quizzes: usize,

    /// Mean percentage score across all of the user's attempts.
    pub average_score: f64,

    /// Fastest single-attempt elapsed time, in seconds.
    pub best_time_secs: i32,
}
