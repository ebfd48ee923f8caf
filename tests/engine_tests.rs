// tests/engine_tests.rs
//
// Pure engine coverage: attempt session transitions, scoring, leaderboard
// ordering. No database, no timers; countdown expiry is driven by calling
// tick() directly.

use persona_quiz::engine::{
    leaderboard,
    scorer::{self, ScoreError},
    session::{AttemptSession, Progress, SessionError},
};
use persona_quiz::models::{
    attempt::AttemptAnswer,
    leaderboard::ScoredAttempt,
    quiz::{Difficulty, Question, QuestionType, Quiz, QuizWithQuestions},
};
use sqlx::types::Json;

fn question(id: i64, position: i32, options: &[&str], answer: &str, budget: i32) -> Question {
    Question {
        id,
        quiz_id: 1,
        position,
        prompt: format!("Question {}", id),
        options: Json(options.iter().map(|o| o.to_string()).collect()),
        answer: answer.to_string(),
        question_type: QuestionType::Mcq,
        time_limit_secs: budget,
    }
}

fn quiz(questions: Vec<Question>) -> QuizWithQuestions {
    QuizWithQuestions {
        quiz: Quiz {
            id: 1,
            title: "Test quiz".to_string(),
            description: "A quiz for tests".to_string(),
            category: "Testing".to_string(),
            difficulty: Difficulty::Easy,
            time_limit_secs: 300,
            image_url: None,
            created_by: "system".to_string(),
            created_at: None,
        },
        questions,
    }
}

fn scored(user_id: i64, quiz_id: i64, score: i32, time_spent_secs: i32) -> ScoredAttempt {
    ScoredAttempt {
        user_id,
        username: format!("user{}", user_id),
        display_name: None,
        avatar_url: None,
        quiz_id,
        score,
        time_spent_secs,
    }
}

#[test]
fn completed_session_covers_every_question_in_order() {
    let q = quiz(vec![
        question(11, 0, &["A", "B"], "A", 30),
        question(12, 1, &["A", "B"], "B", 30),
        question(13, 2, &["A", "B"], "A", 30),
    ]);

    let mut session = AttemptSession::start(q, 7).expect("start must succeed");

    session.select_answer("A").unwrap();
    assert!(matches!(session.advance().unwrap(), Progress::Next { .. }));
    session.select_answer("B").unwrap();
    assert!(matches!(session.advance().unwrap(), Progress::Next { .. }));
    session.select_answer("B").unwrap();

    let attempt = match session.advance().unwrap() {
        Progress::Completed(attempt) => attempt,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(attempt.answers.len(), 3);
    let ids: Vec<i64> = attempt.answers.iter().map(|a| a.question_id).collect();
    assert_eq!(ids, vec![11, 12, 13]);
    assert_eq!(attempt.total_questions, 3);
    assert_eq!(attempt.correct_count, 2);
    assert_eq!(attempt.user_id, 7);
}

#[test]
fn starting_with_zero_questions_is_rejected() {
    let err = AttemptSession::start(quiz(vec![]), 1).unwrap_err();
    assert_eq!(err, SessionError::EmptyQuiz);
}

#[test]
fn selecting_an_unknown_option_is_rejected() {
    let mut session =
        AttemptSession::start(quiz(vec![question(1, 0, &["A", "B"], "A", 30)]), 1).unwrap();

    let err = session.select_answer("Z").unwrap_err();
    assert_eq!(err, SessionError::UnknownOption("Z".to_string()));
}

#[test]
fn reselecting_overwrites_the_pending_answer() {
    let mut session =
        AttemptSession::start(quiz(vec![question(1, 0, &["A", "B"], "B", 30)]), 1).unwrap();

    session.select_answer("A").unwrap();
    session.select_answer("B").unwrap();
    assert_eq!(session.pending_answer(), Some("B"));

    let attempt = match session.advance().unwrap() {
        Progress::Completed(attempt) => attempt,
        other => panic!("expected completion, got {:?}", other),
    };
    assert_eq!(attempt.answers[0].selected, "B");
    assert!(attempt.answers[0].is_correct);
}

#[test]
fn countdown_expiry_without_answer_advances_as_incorrect() {
    let mut session = AttemptSession::start(
        quiz(vec![
            question(1, 0, &["A", "B"], "A", 3),
            question(2, 1, &["A", "B"], "B", 30),
        ]),
        1,
    )
    .unwrap();

    assert!(session.tick().unwrap().is_none());
    assert!(session.tick().unwrap().is_none());
    let progress = session.tick().unwrap().expect("third tick must expire");

    match progress {
        Progress::Next {
            index,
            remaining_secs,
        } => {
            assert_eq!(index, 1);
            assert_eq!(remaining_secs, 30);
        }
        other => panic!("expected Next, got {:?}", other),
    }

    // Session moved on; nothing is pending for the new question.
    assert_eq!(session.current_index(), 1);
    assert_eq!(session.pending_answer(), None);
}

#[test]
fn advance_counts_seconds_spent_against_the_budget() {
    let mut session = AttemptSession::start(
        quiz(vec![
            question(1, 0, &["A", "B"], "A", 10),
            question(2, 1, &["A", "B"], "B", 10),
        ]),
        1,
    )
    .unwrap();

    // Four seconds of deliberation on the first question.
    for _ in 0..4 {
        assert!(session.tick().unwrap().is_none());
    }
    session.select_answer("A").unwrap();
    session.advance().unwrap();

    // Let the second question expire untouched.
    let attempt = loop {
        if let Some(Progress::Completed(attempt)) = session.tick().unwrap() {
            break attempt;
        }
    };

    assert_eq!(attempt.answers[0].time_spent_secs, 4);
    assert_eq!(attempt.answers[1].time_spent_secs, 10);
    assert_eq!(attempt.time_spent_secs, 14);
}

#[test]
fn expired_last_question_still_produces_a_scored_attempt() {
    // Options ["A","B","C","D"], correct "B"; user answers question 1
    // correctly, lets question 2 expire unanswered.
    let mut session = AttemptSession::start(
        quiz(vec![
            question(1, 0, &["A", "B", "C", "D"], "B", 30),
            question(2, 1, &["A", "B", "C", "D"], "C", 2),
        ]),
        1,
    )
    .unwrap();

    session.select_answer("B").unwrap();
    session.advance().unwrap();

    assert!(session.tick().unwrap().is_none());
    let attempt = match session.tick().unwrap().expect("countdown must expire") {
        Progress::Completed(attempt) => attempt,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(attempt.correct_count, 1);
    assert_eq!(attempt.total_questions, 2);
    assert_eq!(attempt.score, 50);
    assert_eq!(attempt.answers[1].selected, "");
    assert!(!attempt.answers[1].is_correct);
}

#[test]
fn finished_sessions_refuse_further_transitions() {
    let mut session =
        AttemptSession::start(quiz(vec![question(1, 0, &["A", "B"], "A", 30)]), 1).unwrap();

    session.select_answer("A").unwrap();
    assert!(matches!(
        session.advance().unwrap(),
        Progress::Completed(_)
    ));

    assert_eq!(
        session.advance().unwrap_err(),
        SessionError::AlreadyCompleted
    );
    assert_eq!(
        session.select_answer("A").unwrap_err(),
        SessionError::AlreadyCompleted
    );
    // Ticking a completed session is a no-op, not an error.
    assert!(session.tick().unwrap().is_none());
}

#[test]
fn scorer_is_idempotent() {
    let q = quiz(vec![
        question(1, 0, &["A", "B"], "A", 30),
        question(2, 1, &["A", "B"], "B", 30),
    ]);
    let answers = vec![
        AttemptAnswer {
            question_id: 1,
            selected: "A".to_string(),
            is_correct: true,
            time_spent_secs: 3,
        },
        AttemptAnswer {
            question_id: 2,
            selected: "A".to_string(),
            is_correct: false,
            time_spent_secs: 5,
        },
    ];

    let first = scorer::score(&answers, &q).unwrap();
    let second = scorer::score(&answers, &q).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.correct_count, 1);
}

#[test]
fn percentage_is_rounded() {
    let q = quiz((0..5).map(|i| question(i, i as i32, &["A", "B"], "A", 30)).collect());
    let answers: Vec<AttemptAnswer> = (0..5)
        .map(|i| AttemptAnswer {
            question_id: i,
            selected: (if i < 3 { "A" } else { "B" }).to_string(),
            is_correct: i < 3,
            time_spent_secs: 1,
        })
        .collect();

    let summary = scorer::score(&answers, &q).unwrap();
    assert_eq!(summary.correct_count, 3);
    assert_eq!(summary.total_questions, 5);
    assert_eq!(summary.percentage, 60);

    // A third is rounded, not truncated.
    let q = quiz((0..3).map(|i| question(i, i as i32, &["A", "B"], "A", 30)).collect());
    let answers: Vec<AttemptAnswer> = (0..3)
        .map(|i| AttemptAnswer {
            question_id: i,
            selected: (if i < 1 { "A" } else { "B" }).to_string(),
            is_correct: i < 1,
            time_spent_secs: 1,
        })
        .collect();
    assert_eq!(scorer::score(&answers, &q).unwrap().percentage, 33);
}

#[test]
fn scorer_fails_loudly_on_count_mismatch() {
    let q = quiz(vec![
        question(1, 0, &["A", "B"], "A", 30),
        question(2, 1, &["A", "B"], "B", 30),
    ]);
    let answers = vec![AttemptAnswer {
        question_id: 1,
        selected: "A".to_string(),
        is_correct: true,
        time_spent_secs: 3,
    }];

    assert_eq!(
        scorer::score(&answers, &q).unwrap_err(),
        ScoreError::AnswerCountMismatch {
            expected: 2,
            got: 1
        }
    );
}

#[test]
fn leaderboard_orders_by_score_then_quiz_count() {
    // A: avg 90 over 2 quizzes; B: avg 90 over 3; C: avg 80 over 5.
    let mut attempts = Vec::new();
    attempts.push(scored(1, 1, 90, 60));
    attempts.push(scored(1, 2, 90, 60));
    for quiz_id in 1..=3 {
        attempts.push(scored(2, quiz_id, 90, 60));
    }
    for quiz_id in 1..=5 {
        attempts.push(scored(3, quiz_id, 80, 60));
    }

    let board = leaderboard::aggregate(&attempts, 10);
    let order: Vec<i64> = board.iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![2, 1, 3]);
    assert_eq!(board[0].distinct_quizzes, 3);
    assert!((board[0].average_score - 90.0).abs() < f64::EPSILON);
}

#[test]
fn leaderboard_breaks_full_ties_by_best_time() {
    let attempts = vec![scored(1, 1, 90, 45), scored(2, 1, 90, 30)];

    let board = leaderboard::aggregate(&attempts, 10);
    let order: Vec<i64> = board.iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![2, 1]);
}

#[test]
fn leaderboard_truncates_but_rank_does_not() {
    let attempts: Vec<ScoredAttempt> = (1..=6)
        .map(|user| scored(user, 1, 100 - user as i32 * 10, 60))
        .collect();

    let board = leaderboard::aggregate(&attempts, 3);
    assert_eq!(board.len(), 3);

    assert_eq!(leaderboard::rank_of(&attempts, 6), Some(6));
    assert_eq!(leaderboard::rank_of(&attempts, 42), None);
}

#[test]
fn display_name_falls_back_to_username() {
    let mut named = scored(1, 1, 90, 60);
    named.display_name = Some("The Champ".to_string());
    let unnamed = scored(2, 1, 80, 60);

    let board = leaderboard::aggregate(&[named, unnamed], 10);
    assert_eq!(board[0].display_name, "The Champ");
    assert_eq!(board[1].display_name, "user2");
}
