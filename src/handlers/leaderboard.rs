// src/handlers/leaderboard.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    config::Config,
    engine::leaderboard::{aggregate, rank_of},
    error::{AppError, is_undefined_table},
    models::leaderboard::ScoredAttempt,
    utils::jwt::Claims,
};

/// Query parameters for the leaderboard listing.
#[derive(Debug, Deserialize)]
pub struct BoardParams {
    pub limit: Option<usize>,
}

/// Returns the top entries, recomputed on demand from the attempt set.
/// Degrades to an empty board ("no data yet") instead of erroring.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Query(params): Query<BoardParams>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = fetch_scored_attempts(&pool).await;
    let limit = params.limit.unwrap_or(config.leaderboard_size).clamp(1, 100);

    Ok(Json(aggregate(&attempts, limit)))
}

/// The authenticated caller's standing: 1-based rank over the full
/// (untruncated) board, 0 when the user has no recorded attempts.
pub async fn my_rank(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let attempts = fetch_scored_attempts(&pool).await;

    let rank = rank_of(&attempts, user_id).unwrap_or(0);
    let entry = aggregate(&attempts, usize::MAX)
        .into_iter()
        .find(|e| e.user_id == user_id);

    Ok(Json(json!({
        "rank": rank,
        "entry": entry,
    })))
}

/// All recorded attempts joined with their users. Errors degrade to an
/// empty set; the board renders as "no data yet" rather than failing.
async fn fetch_scored_attempts(pool: &PgPool) -> Vec<ScoredAttempt> {
    let result = sqlx::query_as::<_, ScoredAttempt>(
        r#"
        SELECT a.user_id, u.username, u.display_name, u.avatar_url,
               a.quiz_id, a.score, a.time_spent_secs
        FROM attempts a
        JOIN users u ON a.user_id = u.id
        "#,
    )
    .fetch_all(pool)
    .await;

    match result {
        Ok(attempts) => attempts,
        Err(e) => {
            if is_undefined_table(&e) {
                tracing::warn!("Attempts relation is missing, leaderboard is empty: {}", e);
            } else {
                tracing::warn!("Leaderboard fetch failed, serving empty board: {}", e);
            }
            Vec::new()
        }
    }
}
