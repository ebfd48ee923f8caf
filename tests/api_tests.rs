// tests/api_tests.rs

use persona_quiz::{config::Config, handlers::attempt::spawn_countdown, routes, seed, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and the pool.
async fn spawn_app() -> (String, PgPool) {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        leaderboard_size: 10,
        attempt_queue_path: std::env::temp_dir()
            .join(format!("api-test-queue-{}.jsonl", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState::new(pool.clone(), config);

    // 4. Drive countdowns exactly like production does
    spawn_countdown(state.clone());

    // 5. Create the router with the app state
    let app = routes::create_router(state);

    // 6. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 7. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Registers and logs in a fresh user, returning (token, username).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, String) {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    let login_resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    let token = login_resp["token"].as_str().expect("Token not found");
    (token.to_string(), username)
}

/// Seeds a small quiz directly and returns its id. Both questions use
/// option "A" as the correct answer.
async fn seed_quiz(pool: &PgPool) -> i64 {
    let quiz_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (title, description, category, difficulty, time_limit_secs)
        VALUES ('Flow quiz', 'Integration test quiz', 'Testing', 'easy', 300)
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed quiz");

    for position in 0..2i32 {
        sqlx::query(
            r#"
            INSERT INTO questions (quiz_id, position, prompt, options, answer, question_type, time_limit_secs)
            VALUES ($1, $2, $3, $4, 'A', 'mcq', 30)
            "#,
        )
        .bind(quiz_id)
        .bind(position)
        .bind(format!("Question {}", position))
        .bind(serde_json::json!(["A", "B", "C", "D"]))
        .execute(pool)
        .await
        .expect("Failed to seed question");
    }

    quiz_id
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: Send a username that is too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn catalog_is_never_empty_and_hides_answers() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    seed::seed_quizzes(&pool).await.expect("Seeding failed");

    // Act
    let response = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .expect("Failed to fetch catalog");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let quizzes: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(!quizzes.is_empty());

    let first_question = &quizzes[0]["questions"][0];
    assert!(first_question["prompt"].is_string());
    assert!(first_question.get("answer").is_none(), "answers must stay server-side");
}

#[tokio::test]
async fn attempt_flow_requires_authentication() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/attempts/start", address))
        .json(&serde_json::json!({"quiz_id": 1}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn full_attempt_flow_scores_and_ranks() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&pool).await;
    let (token, username) = register_and_login(&client, &address).await;

    // 1. Start
    let start_resp = client
        .post(format!("{}/api/attempts/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quiz_id": quiz_id}))
        .send()
        .await
        .expect("Start failed");
    assert_eq!(start_resp.status().as_u16(), 201);

    let view: serde_json::Value = start_resp.json().await.unwrap();
    assert_eq!(view["question_index"], 0);
    assert_eq!(view["total_questions"], 2);
    assert_eq!(view["remaining_secs"], 30);

    // 2. A second start while one is live must conflict
    let conflict = client
        .post(format!("{}/api/attempts/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quiz_id": quiz_id}))
        .send()
        .await
        .expect("Second start failed");
    assert_eq!(conflict.status().as_u16(), 409);

    // 3. Answer question 1 correctly and advance
    let answer_resp = client
        .post(format!("{}/api/attempts/answer", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"selected": "A"}))
        .send()
        .await
        .expect("Answer failed");
    assert_eq!(answer_resp.status().as_u16(), 200);

    let advance_resp: serde_json::Value = client
        .post(format!("{}/api/attempts/advance", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Advance failed")
        .json()
        .await
        .unwrap();
    assert_eq!(advance_resp["state"], "in_progress");
    assert_eq!(advance_resp["attempt"]["question_index"], 1);

    // 4. Answer question 2 wrong and finish
    client
        .post(format!("{}/api/attempts/answer", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"selected": "B"}))
        .send()
        .await
        .expect("Answer failed");

    let completed: serde_json::Value = client
        .post(format!("{}/api/attempts/advance", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Final advance failed")
        .json()
        .await
        .unwrap();

    assert_eq!(completed["state"], "completed");
    assert_eq!(completed["correct_count"], 1);
    assert_eq!(completed["total_questions"], 2);
    assert_eq!(completed["score"], 50);
    assert_eq!(completed["recorded"], "persisted");

    // 5. No live session remains
    let current = client
        .get(format!("{}/api/attempts/current", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Current failed");
    assert_eq!(current.status().as_u16(), 404);

    // 6. History shows the attempt
    let mine: Vec<serde_json::Value> = client
        .get(format!("{}/api/attempts/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("History failed")
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["score"], 50);

    // 7. The user is ranked
    let rank: serde_json::Value = client
        .get(format!("{}/api/leaderboard/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Rank failed")
        .json()
        .await
        .unwrap();
    assert!(rank["rank"].as_u64().unwrap() >= 1);
    assert_eq!(rank["entry"]["display_name"], username);
}

#[tokio::test]
async fn abandoning_an_attempt_frees_the_session() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let quiz_id = seed_quiz(&pool).await;
    let (token, _) = register_and_login(&client, &address).await;

    let start = client
        .post(format!("{}/api/attempts/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quiz_id": quiz_id}))
        .send()
        .await
        .expect("Start failed");
    assert_eq!(start.status().as_u16(), 201);

    let abandon = client
        .delete(format!("{}/api/attempts/current", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Abandon failed");
    assert_eq!(abandon.status().as_u16(), 204);

    // A fresh start is allowed again, and no attempt was recorded
    let restart = client
        .post(format!("{}/api/attempts/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quiz_id": quiz_id}))
        .send()
        .await
        .expect("Restart failed");
    assert_eq!(restart.status().as_u16(), 201);

    let mine: Vec<serde_json::Value> = client
        .get(format!("{}/api/attempts/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("History failed")
        .json()
        .await
        .unwrap();
    assert!(mine.is_empty());
}

#[tokio::test]
async fn newsletter_subscription_rejects_duplicates() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = format!("{}@example.com", uuid::Uuid::new_v4());

    let first = client
        .post(format!("{}/api/newsletter", address))
        .json(&serde_json::json!({"email": email}))
        .send()
        .await
        .expect("Subscribe failed");
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/newsletter", address))
        .json(&serde_json::json!({"email": email}))
        .send()
        .await
        .expect("Second subscribe failed");
    assert_eq!(second.status().as_u16(), 400);
}

#[tokio::test]
async fn contact_form_validates_email() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/contact", address))
        .json(&serde_json::json!({
            "name": "Visitor",
            "email": "not-an-email",
            "message": "Hello there"
        }))
        .send()
        .await
        .expect("Contact failed");

    assert_eq!(response.status().as_u16(), 400);
}
