// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

/// Quiz difficulty, mapped to the 'difficulty' enum type in Postgres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "difficulty", rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Question kind, mapped to the 'question_type' enum type in Postgres.
/// True/false is multiple choice constrained to exactly two options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
}

/// Represents the 'quizzes' table in the database.
/// Rows are created by seeding or by admins and never mutated afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,

    /// Overall time budget for the whole quiz, in seconds.
    pub time_limit_secs: i32,

    pub image_url: Option<String>,
    pub created_by: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'questions' table in the database.
/// Owned by its parent quiz; option order is meaningful and stable.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub position: i32,
    pub prompt: String,

    /// Ordered list of answer options, stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// The correct option. Must be one of `options`.
    /// Never serialized: clients only ever see `PublicQuestion`.
    #[serde(skip_serializing)]
    pub answer: String,

    pub question_type: QuestionType,

    /// Per-question countdown budget, in seconds.
    pub time_limit_secs: i32,
}

/// A quiz together with its ordered questions, as the engine consumes it.
#[derive(Debug, Clone, Serialize)]
pub struct QuizWithQuestions {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

impl QuizWithQuestions {
    /// Checks the structural invariants a catalog entry must satisfy.
    /// Returns the first problem found, or `None` for a well-formed quiz.
    pub fn shape_error(&self) -> Option<String> {
        if self.quiz.title.trim().is_empty() {
            return Some("empty title".to_string());
        }
        if self.quiz.description.trim().is_empty() {
            return Some("empty description".to_string());
        }
        if self.questions.is_empty() {
            return Some("no questions".to_string());
        }
        for q in &self.questions {
            if q.options.0.is_empty() {
                return Some(format!("question {} has no options", q.id));
            }
            if q.options.0.iter().any(|o| o.trim().is_empty()) {
                return Some(format!("question {} has a blank option", q.id));
            }
            if !q.options.0.contains(&q.answer) {
                return Some(format!("question {} answer is not among its options", q.id));
            }
            if q.question_type == QuestionType::TrueFalse && q.options.0.len() != 2 {
                return Some(format!(
                    "true/false question {} must have exactly two options",
                    q.id
                ));
            }
            if q.time_limit_secs <= 0 {
                return Some(format!("question {} has a non-positive time budget", q.id));
            }
        }
        None
    }
}

/// DTO for sending a question to the client (excludes the answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub position: i32,
    pub prompt: String,
    pub options: Vec<String>,
    pub question_type: QuestionType,
    pub time_limit_secs: i32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            position: q.position,
            prompt: q.prompt.clone(),
            options: q.options.0.clone(),
            question_type: q.question_type,
            time_limit_secs: q.time_limit_secs,
        }
    }
}

/// DTO for the catalog listing: quiz metadata plus answer-free questions.
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub time_limit_secs: i32,
    pub image_url: Option<String>,
    pub questions: Vec<PublicQuestion>,
}

impl From<&QuizWithQuestions> for PublicQuiz {
    fn from(q: &QuizWithQuestions) -> Self {
        Self {
            id: q.quiz.id,
            title: q.quiz.title.clone(),
            description: q.quiz.description.clone(),
            category: q.quiz.category.clone(),
            difficulty: q.quiz.difficulty,
            time_limit_secs: q.quiz.time_limit_secs,
            image_url: q.quiz.image_url.clone(),
            questions: q.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// DTO for creating a new quiz with its questions. Admin only.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub difficulty: Difficulty,
    #[validate(range(min = 30, max = 7200))]
    pub time_limit_secs: i32,
    #[validate(custom(function = validate_image_url))]
    pub image_url: Option<String>,
    #[validate(length(min = 1), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// DTO for one question inside a `CreateQuizRequest`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    pub question_type: QuestionType,
    #[validate(range(min = 5, max = 600))]
    pub time_limit_secs: i32,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_blank"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

fn validate_image_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.len() > 2000 {
        return Err(validator::ValidationError::new("url_too_long"));
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
