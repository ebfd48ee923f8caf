// src/engine/scorer.rs

use serde::Serialize;
use std::fmt;

use crate::models::{attempt::AttemptAnswer, quiz::QuizWithQuestions};

/// The result of scoring one finalized attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub correct_count: u32,
    pub total_questions: u32,

    /// round(100 * correct_count / total_questions)
    pub percentage: u32,
}

/// Scoring is only defined for an answer list that matches the quiz's
/// question list one-to-one, in order. Anything else is a bug upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreError {
    NoQuestions,
    AnswerCountMismatch { expected: usize, got: usize },
    QuestionMismatch { index: usize, expected: i64, got: i64 },
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::NoQuestions => write!(f, "cannot score a quiz with no questions"),
            ScoreError::AnswerCountMismatch { expected, got } => write!(
                f,
                "answer count {} does not match question count {}",
                got, expected
            ),
            ScoreError::QuestionMismatch {
                index,
                expected,
                got,
            } => write!(
                f,
                "answer {} references question {} but the quiz has question {} there",
                index, got, expected
            ),
        }
    }
}

impl std::error::Error for ScoreError {}

/// Scores a finalized answer list against the quiz's answer key.
///
/// Pure and idempotent: identical inputs always yield identical results.
/// Correctness is recomputed from the key, so the summary is authoritative
/// even if a stored `is_correct` flag were ever wrong.
pub fn score(
    answers: &[AttemptAnswer],
    quiz: &QuizWithQuestions,
) -> Result<ScoreSummary, ScoreError> {
    let total = quiz.questions.len();
    if total == 0 {
        return Err(ScoreError::NoQuestions);
    }
    if answers.len() != total {
        return Err(ScoreError::AnswerCountMismatch {
            expected: total,
            got: answers.len(),
        });
    }

    let mut correct = 0u32;
    for (index, (answer, question)) in answers.iter().zip(&quiz.questions).enumerate() {
        if answer.question_id != question.id {
            return Err(ScoreError::QuestionMismatch {
                index,
                expected: question.id,
                got: answer.question_id,
            });
        }
        // An empty selection (countdown expired unanswered) never matches.
        if !answer.selected.is_empty() && answer.selected == question.answer {
            correct += 1;
        }
    }

    let percentage = ((correct as f64 / total as f64) * 100.0).round() as u32;

    Ok(ScoreSummary {
        correct_count: correct,
        total_questions: total as u32,
        percentage,
    })
}
