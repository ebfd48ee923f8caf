// src/engine/leaderboard.rs

use std::collections::{HashMap, HashSet};

use crate::models::leaderboard::{LeaderboardEntry, ScoredAttempt};

struct UserFold {
    display_name: String,
    avatar_url: Option<String>,
    attempts: usize,
    score_total: i64,
    quizzes: HashSet<i64>,
    best_time_secs: i32,
}

/// Folds the full attempt set into ordered standings and truncates for
/// display. Pass `usize::MAX` for the untruncated sequence.
pub fn aggregate(attempts: &[ScoredAttempt], top_n: usize) -> Vec<LeaderboardEntry> {
    standings(attempts).into_iter().take(top_n).collect()
}

/// 1-based rank of `user_id` in the full (untruncated) standings.
/// `None` means the user has no recorded attempts.
pub fn rank_of(attempts: &[ScoredAttempt], user_id: i64) -> Option<usize> {
    standings(attempts)
        .iter()
        .position(|e| e.user_id == user_id)
        .map(|p| p + 1)
}

fn standings(attempts: &[ScoredAttempt]) -> Vec<LeaderboardEntry> {
    let mut folds: HashMap<i64, UserFold> = HashMap::new();

    for attempt in attempts {
        let fold = folds.entry(attempt.user_id).or_insert_with(|| UserFold {
            display_name: attempt.shown_name().to_string(),
            avatar_url: attempt.avatar_url.clone(),
            attempts: 0,
            score_total: 0,
            quizzes: HashSet::new(),
            best_time_secs: i32::MAX,
        });
        fold.attempts += 1;
        fold.score_total += attempt.score as i64;
        fold.quizzes.insert(attempt.quiz_id);
        fold.best_time_secs = fold.best_time_secs.min(attempt.time_spent_secs);
    }

    let mut entries: Vec<LeaderboardEntry> = folds
        .into_iter()
        .map(|(user_id, fold)| LeaderboardEntry {
            user_id,
            display_name: fold.display_name,
            avatar_url: fold.avatar_url,
            attempts: fold.attempts,
            distinct_quizzes: fold.quizzes.len(),
            average_score: fold.score_total as f64 / fold.attempts as f64,
            best_time_secs: fold.best_time_secs,
        })
        .collect();

    // Average score desc, then distinct-quiz count desc, then best time
    // asc (faster wins). User id last so equal records order stably.
    entries.sort_by(|a, b| {
        b.average_score
            .total_cmp(&a.average_score)
            .then_with(|| b.distinct_quizzes.cmp(&a.distinct_quizzes))
            .then_with(|| a.best_time_secs.cmp(&b.best_time_secs))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    entries
}
