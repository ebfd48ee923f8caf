// src/engine/session.rs

use chrono::Utc;
use std::fmt;

use crate::models::{
    attempt::{AttemptAnswer, NewAttempt},
    quiz::{Question, QuizWithQuestions},
};

use super::scorer::{self, ScoreError};

/// Errors a live session can report to its driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `start` refuses a quiz with zero questions outright; completing
    /// such a quiz with a vacuous result would poison the leaderboard.
    EmptyQuiz,
    AlreadyCompleted,
    /// The selected value is not one of the current question's options.
    UnknownOption(String),
    /// Finalization produced an answer list the scorer rejects. A bug.
    Score(ScoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuiz => write!(f, "quiz has no questions"),
            SessionError::AlreadyCompleted => write!(f, "attempt is already completed"),
            SessionError::UnknownOption(opt) => {
                write!(f, "'{}' is not an option for the current question", opt)
            }
            SessionError::Score(e) => write!(f, "scoring failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ScoreError> for SessionError {
    fn from(err: ScoreError) -> Self {
        SessionError::Score(err)
    }
}

/// What an `advance` (explicit or countdown-driven) led to.
#[derive(Debug)]
pub enum Progress {
    /// Moved to the next question; countdown reset to its budget.
    Next { index: usize, remaining_secs: u32 },
    /// The last question was captured; here is the finalized record.
    Completed(NewAttempt),
}

/// The state machine for a single live quiz attempt.
///
/// Conceptually `NotStarted -> InProgress -> Completed`; `start` is the
/// only way in, so a constructed session is always `InProgress` until it
/// completes. Drivers must stop ticking a session once it reports
/// `Progress::Completed` — dropping it from the live set is the
/// cancellation point for its countdown.
#[derive(Debug)]
pub struct AttemptSession {
    quiz: QuizWithQuestions,
    user_id: i64,
    current: usize,
    /// The in-progress answer for the current question, if any.
    pending: Option<String>,
    /// Seconds left on the current question's countdown.
    remaining_secs: u32,
    answers: Vec<AttemptAnswer>,
    started_at: chrono::DateTime<chrono::Utc>,
    completed: bool,
}

impl AttemptSession {
    /// Starts an attempt: question index 0, empty answer list, countdown
    /// set to the first question's budget.
    pub fn start(quiz: QuizWithQuestions, user_id: i64) -> Result<Self, SessionError> {
        let first_budget = match quiz.questions.first() {
            Some(q) => q.time_limit_secs.max(0) as u32,
            None => return Err(SessionError::EmptyQuiz),
        };

        Ok(Self {
            quiz,
            user_id,
            current: 0,
            pending: None,
            remaining_secs: first_budget,
            answers: Vec::new(),
            started_at: Utc::now(),
            completed: false,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn quiz_id(&self) -> i64 {
        self.quiz.quiz.id
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn pending_answer(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.completed {
            None
        } else {
            self.quiz.questions.get(self.current)
        }
    }

    /// Records (or overwrites) the answer for the current question.
    /// Does not advance; may be called repeatedly.
    pub fn select_answer(&mut self, option: &str) -> Result<(), SessionError> {
        if self.completed {
            return Err(SessionError::AlreadyCompleted);
        }
        let question = &self.quiz.questions[self.current];
        if !question.options.0.iter().any(|o| o == option) {
            return Err(SessionError::UnknownOption(option.to_string()));
        }
        self.pending = Some(option.to_string());
        Ok(())
    }

    /// Captures the current question's answer (empty if none was selected)
    /// and moves on; after the last question the finalized record comes
    /// back.
    pub fn advance(&mut self) -> Result<Progress, SessionError> {
        if self.completed {
            return Err(SessionError::AlreadyCompleted);
        }
        self.capture_and_advance()
    }

    /// One second of countdown. Returns `None` while the question still
    /// has time left; expiry behaves exactly like an explicit `advance`
    /// with whatever answer (possibly none) was pending. Ticking a
    /// completed session is a no-op.
    pub fn tick(&mut self) -> Result<Option<Progress>, SessionError> {
        if self.completed {
            return Ok(None);
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return Ok(None);
        }
        self.capture_and_advance().map(Some)
    }

    fn capture_and_advance(&mut self) -> Result<Progress, SessionError> {
        let question = &self.quiz.questions[self.current];
        let budget = question.time_limit_secs.max(0) as u32;
        let selected = self.pending.take().unwrap_or_default();

        self.answers.push(AttemptAnswer {
            question_id: question.id,
            is_correct: !selected.is_empty() && selected == question.answer,
            selected,
            time_spent_secs: budget.saturating_sub(self.remaining_secs),
        });

        if self.current + 1 < self.quiz.questions.len() {
            self.current += 1;
            self.remaining_secs = self.quiz.questions[self.current].time_limit_secs.max(0) as u32;
            Ok(Progress::Next {
                index: self.current,
                remaining_secs: self.remaining_secs,
            })
        } else {
            self.completed = true;
            self.finalize().map(Progress::Completed)
        }
    }

    fn finalize(&mut self) -> Result<NewAttempt, SessionError> {
        let answers = std::mem::take(&mut self.answers);
        let summary = scorer::score(&answers, &self.quiz)?;
        let time_spent_secs = answers.iter().map(|a| a.time_spent_secs).sum();

        Ok(NewAttempt {
            quiz_id: self.quiz.quiz.id,
            user_id: self.user_id,
            correct_count: summary.correct_count,
            total_questions: summary.total_questions,
            score: summary.percentage,
            time_spent_secs,
            answers,
            completed_at: Utc::now(),
        })
    }
}
