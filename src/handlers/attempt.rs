// src/handlers/attempt.rs
//
// Server-authoritative attempt flow. A user has at most one live session;
// the session state machine lives in `engine::session` and every
// transition goes through the `LiveSessions` mutex. Database writes
// always happen after the lock is released.

use std::{collections::HashMap, sync::MutexGuard, time::Duration};

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::time::MissedTickBehavior;

use crate::{
    engine::session::{AttemptSession, Progress, SessionError},
    error::{AppError, is_undefined_table},
    handlers::quiz::load_quiz,
    models::{
        attempt::{Attempt, NewAttempt},
        quiz::PublicQuestion,
    },
    recorder::{self, PersistenceResult},
    state::{AppState, LiveSessions},
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct StartAttemptRequest {
    pub quiz_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub selected: String,
}

/// Snapshot of a live session for the client.
#[derive(Debug, Serialize)]
pub struct LiveAttemptView {
    pub quiz_id: i64,
    pub question_index: usize,
    pub total_questions: usize,
    pub remaining_secs: u32,
    pub selected: Option<String>,
    pub question: Option<PublicQuestion>,
}

impl LiveAttemptView {
    fn of(session: &AttemptSession) -> Self {
        Self {
            quiz_id: session.quiz_id(),
            question_index: session.current_index(),
            total_questions: session.question_count(),
            remaining_secs: session.remaining_secs(),
            selected: session.pending_answer().map(str::to_string),
            question: session.current_question().map(PublicQuestion::from),
        }
    }
}

/// Response for an advance that finished the quiz. The score is computed
/// locally before any persistence happens, so it is present even when the
/// attempt could only be queued.
#[derive(Debug, Serialize)]
pub struct CompletedAttemptResponse {
    pub state: &'static str,
    pub correct_count: u32,
    pub total_questions: u32,
    pub score: u32,
    pub time_spent_secs: u32,
    pub recorded: &'static str,
    pub attempt_id: Option<i64>,
}

fn lock_sessions(sessions: &LiveSessions) -> MutexGuard<'_, HashMap<i64, AttemptSession>> {
    sessions
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Starts an attempt for the authenticated user.
///
/// Identity is re-validated against the users table here and only here;
/// later transitions trust the session's captured user id. A second start
/// while a session is live is a conflict, not a replacement.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    State(sessions): State<LiveSessions>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let known_user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;
    if known_user.is_none() {
        return Err(AppError::AuthError("Unknown user".to_string()));
    }

    let quiz = load_quiz(&pool, payload.quiz_id)
        .await
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let session = AttemptSession::start(quiz, user_id)?;

    let mut sessions = lock_sessions(&sessions);
    if sessions.contains_key(&user_id) {
        return Err(AppError::Conflict(
            "An attempt is already in progress".to_string(),
        ));
    }
    let view = LiveAttemptView::of(&session);
    sessions.insert(user_id, session);

    Ok((StatusCode::CREATED, Json(view)))
}

/// Records (or overwrites) the answer for the current question.
pub async fn select_answer(
    State(sessions): State<LiveSessions>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = lock_sessions(&sessions);
    let session = sessions
        .get_mut(&claims.user_id())
        .ok_or(AppError::NotFound("No attempt in progress".to_string()))?;

    session.select_answer(&payload.selected)?;

    Ok(Json(LiveAttemptView::of(session)))
}

/// Advances past the current question. On the last question this
/// finalizes the attempt, records it (degrading to the local queue if
/// necessary) and returns the score.
pub async fn advance_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    enum Advanced {
        Next(LiveAttemptView),
        Done(NewAttempt),
    }

    // Transition under the lock; persist after releasing it.
    let outcome = {
        let mut sessions = lock_sessions(&state.sessions);
        let session = sessions
            .get_mut(&user_id)
            .ok_or(AppError::NotFound("No attempt in progress".to_string()))?;

        match session.advance() {
            Ok(Progress::Next { .. }) => Advanced::Next(LiveAttemptView::of(session)),
            Ok(Progress::Completed(attempt)) => {
                sessions.remove(&user_id);
                Advanced::Done(attempt)
            }
            Err(e) => {
                // A session that can no longer advance is dead weight.
                if matches!(e, SessionError::Score(_)) {
                    sessions.remove(&user_id);
                }
                return Err(e.into());
            }
        }
    };

    match outcome {
        Advanced::Next(view) => Ok(Json(serde_json::json!({
            "state": "in_progress",
            "attempt": view,
        }))
        .into_response()),
        Advanced::Done(attempt) => {
            let response = persist_completed(&state, attempt).await?;
            Ok(Json(response).into_response())
        }
    }
}

/// Live view of the caller's current session.
pub async fn current_attempt(
    State(sessions): State<LiveSessions>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = lock_sessions(&sessions);
    let session = sessions
        .get(&claims.user_id())
        .ok_or(AppError::NotFound("No attempt in progress".to_string()))?;

    Ok(Json(LiveAttemptView::of(session)))
}

/// Abandons the live session. Removing it from the map is what cancels
/// its countdown; no attempt record is produced.
pub async fn abandon_attempt(
    State(sessions): State<LiveSessions>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = lock_sessions(&sessions);
    match sessions.remove(&claims.user_id()) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(AppError::NotFound("No attempt in progress".to_string())),
    }
}

/// The caller's recorded attempt history, most recent first.
/// Degrades to an empty list when the attempts relation is missing.
pub async fn my_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, quiz_id, user_id, correct_count, total_questions, score,
               time_spent_secs, answers, completed_at
        FROM attempts
        WHERE user_id = $1
        ORDER BY completed_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await;

    match attempts {
        Ok(attempts) => Ok(Json(attempts)),
        Err(e) if is_undefined_table(&e) => {
            tracing::warn!("Attempts relation is missing, returning empty history: {}", e);
            Ok(Json(Vec::<Attempt>::new()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn persist_completed(
    state: &AppState,
    attempt: NewAttempt,
) -> Result<CompletedAttemptResponse, AppError> {
    let result = recorder::record_attempt(&state.pool, &state.fallback, &attempt).await?;

    let (recorded, attempt_id) = match result {
        PersistenceResult::Persisted { id } => ("persisted", Some(id)),
        PersistenceResult::QueuedLocally => ("queued_locally", None),
    };

    Ok(CompletedAttemptResponse {
        state: "completed",
        correct_count: attempt.correct_count,
        total_questions: attempt.total_questions,
        score: attempt.score,
        time_spent_secs: attempt.time_spent_secs,
        recorded,
        attempt_id,
    })
}

/// Spawns the one-second countdown driver for all live sessions.
///
/// Each tick decrements every live session's countdown; sessions whose
/// last question expires are finalized and recorded exactly as a manual
/// advance would have done. Sessions are ticked under the lock; the
/// recording happens after it is released.
pub fn spawn_countdown(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let finished: Vec<(i64, Result<NewAttempt, SessionError>)> = {
                let mut sessions = lock_sessions(&state.sessions);
                let mut finished = Vec::new();

                for (user_id, session) in sessions.iter_mut() {
                    match session.tick() {
                        Ok(Some(Progress::Completed(attempt))) => {
                            finished.push((*user_id, Ok(attempt)));
                        }
                        Ok(Some(Progress::Next { .. })) | Ok(None) => {}
                        Err(e) => finished.push((*user_id, Err(e))),
                    }
                }

                for (user_id, _) in &finished {
                    sessions.remove(user_id);
                }

                finished
            };

            for (user_id, outcome) in finished {
                match outcome {
                    Ok(attempt) => {
                        match recorder::record_attempt(&state.pool, &state.fallback, &attempt).await
                        {
                            Ok(PersistenceResult::Persisted { id }) => {
                                tracing::debug!(
                                    "Expired attempt for user {} recorded as {}",
                                    user_id,
                                    id
                                );
                            }
                            Ok(PersistenceResult::QueuedLocally) => {}
                            Err(e) => {
                                tracing::error!(
                                    "Failed to store expired attempt for user {}: {}",
                                    user_id,
                                    e
                                );
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Dropping broken session for user {}: {}", user_id, e);
                    }
                }
            }
        }
    });
}
