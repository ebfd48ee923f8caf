// src/seed.rs
//
// Built-in quiz catalog. Serves two purposes: seeding an empty database at
// startup, and standing in for the catalog when the database cannot
// provide one, so the client is never shown an empty quiz list.

use sqlx::PgPool;

use crate::models::quiz::{Difficulty, Question, Quiz, QuestionType, QuizWithQuestions};

struct SeedQuestion {
    prompt: &'static str,
    options: &'static [&'static str],
    answer: &'static str,
}

struct SeedQuiz {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    difficulty: Difficulty,
    time_limit_secs: i32,
    questions: &'static [SeedQuestion],
}

const QUESTION_TIME_LIMIT_SECS: i32 = 30;

const SEED_QUIZZES: &[SeedQuiz] = &[
    SeedQuiz {
        title: "Personal Growth Fundamentals",
        description: "Test your knowledge about personal development concepts and strategies.",
        category: "Personal Development",
        difficulty: Difficulty::Easy,
        time_limit_secs: 300,
        questions: &[
            SeedQuestion {
                prompt: "What is the primary purpose of setting SMART goals?",
                options: &[
                    "To impress others with ambitious targets",
                    "To create specific, measurable, achievable, relevant, and time-bound objectives",
                    "To avoid planning for the future",
                    "To focus only on short-term achievements",
                ],
                answer: "To create specific, measurable, achievable, relevant, and time-bound objectives",
            },
            SeedQuestion {
                prompt: "Which of the following is NOT typically considered a component of emotional intelligence?",
                options: &[
                    "Self-awareness",
                    "Social skills",
                    "Technical expertise",
                    "Empathy",
                ],
                answer: "Technical expertise",
            },
            SeedQuestion {
                prompt: "What is the 'growth mindset' concept developed by Carol Dweck?",
                options: &[
                    "The belief that intelligence and abilities are fixed traits",
                    "The belief that intelligence and abilities can be developed through dedication and hard work",
                    "The idea that growth is only possible during childhood",
                    "The concept that personal growth requires external validation",
                ],
                answer: "The belief that intelligence and abilities can be developed through dedication and hard work",
            },
            SeedQuestion {
                prompt: "Which practice is most associated with mindfulness?",
                options: &[
                    "Multitasking",
                    "Present moment awareness",
                    "Future planning",
                    "Competitive analysis",
                ],
                answer: "Present moment awareness",
            },
            SeedQuestion {
                prompt: "What is the Pomodoro Technique used for?",
                options: &[
                    "Cooking Italian food",
                    "Time management and productivity",
                    "Physical exercise",
                    "Relationship building",
                ],
                answer: "Time management and productivity",
            },
        ],
    },
    SeedQuiz {
        title: "Professional Communication Skills",
        description: "Evaluate your understanding of effective workplace communication.",
        category: "Communication",
        difficulty: Difficulty::Medium,
        time_limit_secs: 360,
        questions: &[
            SeedQuestion {
                prompt: "What is active listening?",
                options: &[
                    "Interrupting to show engagement",
                    "Fully concentrating, understanding, responding, and remembering what is being said",
                    "Listening only to information relevant to your interests",
                    "Multitasking while someone is speaking",
                ],
                answer: "Fully concentrating, understanding, responding, and remembering what is being said",
            },
            SeedQuestion {
                prompt: "Which of the following is an example of non-verbal communication?",
                options: &["Email", "Phone call", "Eye contact", "Text message"],
                answer: "Eye contact",
            },
            SeedQuestion {
                prompt: "What is the primary purpose of constructive feedback?",
                options: &[
                    "To criticize someone's performance",
                    "To help someone improve their performance",
                    "To demonstrate authority",
                    "To document performance issues",
                ],
                answer: "To help someone improve their performance",
            },
            SeedQuestion {
                prompt: "Which communication channel is most appropriate for delivering complex, sensitive information?",
                options: &[
                    "Email",
                    "Text message",
                    "Face-to-face conversation",
                    "Group chat",
                ],
                answer: "Face-to-face conversation",
            },
            SeedQuestion {
                prompt: "What is the 'sandwich method' in feedback?",
                options: &[
                    "Providing feedback during lunch",
                    "Starting and ending with positive comments, with constructive criticism in the middle",
                    "Giving feedback to multiple people at once",
                    "Alternating between positive and negative feedback points",
                ],
                answer: "Starting and ending with positive comments, with constructive criticism in the middle",
            },
            SeedQuestion {
                prompt: "Which of the following is a barrier to effective communication?",
                options: &[
                    "Active listening",
                    "Clear messaging",
                    "Emotional intelligence",
                    "Making assumptions",
                ],
                answer: "Making assumptions",
            },
        ],
    },
    SeedQuiz {
        title: "Leadership Principles",
        description: "Test your knowledge of effective leadership concepts and practices.",
        category: "Leadership",
        difficulty: Difficulty::Hard,
        time_limit_secs: 420,
        questions: &[
            SeedQuestion {
                prompt: "What is transformational leadership?",
                options: &[
                    "Leadership focused on maintaining the status quo",
                    "Leadership that motivates followers to exceed their own self-interests for the good of the group",
                    "Leadership based solely on rewards and punishments",
                    "Leadership that avoids making decisions",
                ],
                answer: "Leadership that motivates followers to exceed their own self-interests for the good of the group",
            },
            SeedQuestion {
                prompt: "Which of the following is NOT one of Daniel Goleman's six leadership styles?",
                options: &["Coercive", "Authoritative", "Transformational", "Democratic"],
                answer: "Transformational",
            },
            SeedQuestion {
                prompt: "What is servant leadership?",
                options: &[
                    "A leadership philosophy where the leader's main goal is to serve others",
                    "A leadership style where employees serve the leader",
                    "A leadership approach focused on short-term results",
                    "A leadership style that emphasizes strict hierarchy",
                ],
                answer: "A leadership philosophy where the leader's main goal is to serve others",
            },
            SeedQuestion {
                prompt: "Which leadership quality is most associated with building trust?",
                options: &[
                    "Technical expertise",
                    "Consistency and integrity",
                    "Charisma",
                    "Decisiveness",
                ],
                answer: "Consistency and integrity",
            },
            SeedQuestion {
                prompt: "What is psychological safety in a team context?",
                options: &[
                    "Protecting team members from physical harm",
                    "Ensuring team members feel comfortable taking risks without fear of negative consequences",
                    "Providing therapy for team members",
                    "Avoiding all forms of conflict",
                ],
                answer: "Ensuring team members feel comfortable taking risks without fear of negative consequences",
            },
            SeedQuestion {
                prompt: "Which leadership approach is best suited for crisis situations?",
                options: &[
                    "Laissez-faire leadership",
                    "Democratic leadership",
                    "Directive leadership",
                    "Affiliative leadership",
                ],
                answer: "Directive leadership",
            },
            SeedQuestion {
                prompt: "What is the primary focus of situational leadership?",
                options: &[
                    "Adapting leadership style based on the situation and followers' needs",
                    "Maintaining a consistent leadership approach regardless of circumstances",
                    "Focusing exclusively on task completion",
                    "Emphasizing relationship building over results",
                ],
                answer: "Adapting leadership style based on the situation and followers' needs",
            },
        ],
    },
];

/// Materializes the built-in catalog with deterministic ids (1..=N in seed
/// order, which is also what the startup seeder produces on a fresh
/// database). Used when the store cannot provide a catalog.
pub fn fallback_catalog() -> Vec<QuizWithQuestions> {
    let mut question_id = 0i64;

    SEED_QUIZZES
        .iter()
        .enumerate()
        .map(|(quiz_idx, seed)| {
            let quiz_id = quiz_idx as i64 + 1;
            let questions = seed
                .questions
                .iter()
                .enumerate()
                .map(|(pos, q)| {
                    question_id += 1;
                    Question {
                        id: question_id,
                        quiz_id,
                        position: pos as i32,
                        prompt: q.prompt.to_string(),
                        options: sqlx::types::Json(
                            q.options.iter().map(|o| o.to_string()).collect(),
                        ),
                        answer: q.answer.to_string(),
                        question_type: QuestionType::Mcq,
                        time_limit_secs: QUESTION_TIME_LIMIT_SECS,
                    }
                })
                .collect();

            QuizWithQuestions {
                quiz: Quiz {
                    id: quiz_id,
                    title: seed.title.to_string(),
                    description: seed.description.to_string(),
                    category: seed.category.to_string(),
                    difficulty: seed.difficulty,
                    time_limit_secs: seed.time_limit_secs,
                    image_url: None,
                    created_by: "system".to_string(),
                    created_at: None,
                },
                questions,
            }
        })
        .collect()
}

/// Inserts the built-in quizzes when the quizzes table is empty.
/// Skipped entirely when any quiz already exists, to avoid duplicates.
pub async fn seed_quizzes(pool: &PgPool) -> Result<(), sqlx::Error> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        tracing::debug!("Quizzes already present, skipping seed");
        return Ok(());
    }

    tracing::info!("Seeding {} built-in quizzes", SEED_QUIZZES.len());

    let mut tx = pool.begin().await?;

    for seed in SEED_QUIZZES {
        let quiz_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (title, description, category, difficulty, time_limit_secs, created_by)
            VALUES ($1, $2, $3, $4, $5, 'system')
            RETURNING id
            "#,
        )
        .bind(seed.title)
        .bind(seed.description)
        .bind(seed.category)
        .bind(seed.difficulty)
        .bind(seed.time_limit_secs)
        .fetch_one(&mut *tx)
        .await?;

        for (pos, question) in seed.questions.iter().enumerate() {
            let options: Vec<&str> = question.options.to_vec();
            sqlx::query(
                r#"
                INSERT INTO questions (quiz_id, position, prompt, options, answer, question_type, time_limit_secs)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(quiz_id)
            .bind(pos as i32)
            .bind(question.prompt)
            .bind(serde_json::json!(options))
            .bind(question.answer)
            .bind(QuestionType::Mcq)
            .bind(QUESTION_TIME_LIMIT_SECS)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    tracing::info!("Seed quizzes inserted");
    Ok(())
}
