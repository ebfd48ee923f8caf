use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{config::Config, engine::session::AttemptSession, recorder::AttemptFallback};

/// All live attempt sessions, keyed by user id.
///
/// One mutex serializes every state transition (answer, advance, tick,
/// teardown), so a countdown expiry and a concurrent manual advance
/// cannot race: whichever lands first wins and the other finds the
/// session already gone. Never held across an await.
pub type LiveSessions = Arc<Mutex<HashMap<i64, AttemptSession>>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub sessions: LiveSessions,
    pub fallback: Arc<AttemptFallback>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let fallback = Arc::new(AttemptFallback::new(&config.attempt_queue_path));
        Self {
            pool,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            fallback,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for LiveSessions {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<AttemptFallback> {
    fn from_ref(state: &AppState) -> Self {
        state.fallback.clone()
    }
}
