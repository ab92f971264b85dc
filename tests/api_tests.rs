// tests/api_tests.rs

use serde_json::{Value, json};
use skillhub::{config::Config, routes, seed, state::AppState};

const ADMIN_USERNAME: &str = "root_admin";
const ADMIN_PASSWORD: &str = "admin_pass";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let config = Config {
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: Some(ADMIN_USERNAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        bind_addr: "127.0.0.1:0".to_string(),
        log_dir: "logs".to_string(),
        seed_demo_data: true,
        starter_credits: 500,
    };

    let state = AppState::new(config);
    seed::load_demo_catalog(&state).expect("Failed to load demo catalog");
    seed::seed_admin_user(&state).expect("Failed to seed admin");

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_name(prefix: &str) -> String {
    // Truncate UUID to keep username length <= 20
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

async fn login(client: &reqwest::Client, address: &str, username: &str, password: &str) -> String {
    let body = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({"username": username, "password": password}))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();
    body["token"].as_str().expect("login returned no token").to_string()
}

async fn register_and_login(client: &reqwest::Client, address: &str) -> String {
    let username = unique_name("u");
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({"username": username, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    login(client, address, &username, "password123").await
}

#[tokio::test]
async fn health_check_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({"username": username, "password": "password123"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], username.as_str());
    assert_eq!(body["role"], "candidate");
    assert!(body.get("password").is_none());

    // Same name again
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({"username": username, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({"username": "yo", "password": "password123"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_rejects_bad_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");

    client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({"username": username, "password": "password123"}))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({"username": username, "password": "wrong_pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/attempts", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(format!("{}/api/wallet", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn assessment_catalog_hides_answer_keys() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let catalog: Vec<Value> = client
        .get(format!("{}/api/assessments", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0]["total_points"], 60);

    let detail: Value = client
        .get(format!("{}/api/assessments/1", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let text = detail.to_string();
    assert!(!text.contains("is_correct"));
    assert!(!text.contains("[-5, 5, 10]"), "hidden test case leaked");
    assert_eq!(detail["questions"][2]["hidden_test_count"], 1);

    let response = client
        .get(format!("{}/api/assessments/999", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_attempt_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address).await;
    let auth = format!("Bearer {}", token);

    // 1. Open an attempt
    let response = client
        .post(format!("{}/api/assessments/1/attempts", address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let attempt: Value = response.json().await.unwrap();
    assert_eq!(attempt["status"], "not_started");
    assert_eq!(attempt["time_remaining"], 1200);
    assert_eq!(attempt["current_question"]["id"], 1);
    let id = attempt["id"].as_str().unwrap().to_string();
    let url = |path: &str| format!("{}/api/attempts/{}{}", address, id, path);

    // 2. Answers are refused before the clock starts
    let response = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({"question_id": 1, "type": "choice", "selected_option_ids": ["a"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 3. Start
    let attempt: Value = client
        .post(url("/start"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attempt["status"], "in_progress");

    let response = client
        .post(url("/start"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 4. Correct single choice
    let answered: Value = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({"question_id": 1, "type": "choice", "selected_option_ids": ["a"]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answered["feedback"]["is_correct"], true);
    assert_eq!(answered["feedback"]["points_earned"], 10);
    assert_eq!(answered["attempt"]["points_earned"], 10);

    // 5. Partial multi-select earns nothing
    let answered: Value = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({"question_id": 2, "type": "choice", "selected_option_ids": ["a"]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answered["feedback"]["is_correct"], false);
    assert_eq!(answered["attempt"]["incorrect_count"], 1);

    // 6. Unknown option and unknown question are rejected
    let response = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({"question_id": 1, "type": "choice", "selected_option_ids": ["z"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({"question_id": 42, "type": "choice", "selected_option_ids": ["a"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // 7. Coding answer with every test case passing
    let answered: Value = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({
            "question_id": 3,
            "type": "coding",
            "code": "fn sum(values: &[i32]) -> i32 { values.iter().sum() }",
            "test_results": [
                {"test_case_id": "t1", "passed": true},
                {"test_case_id": "t2", "passed": true},
                {"test_case_id": "t3", "passed": true}
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answered["feedback"]["points_earned"], 30);

    // 8. Navigation clamps
    let view: Value = client
        .post(url("/navigate"))
        .header("Authorization", &auth)
        .json(&json!({"action": "go_to", "index": 99}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["current_question_index"], 2);

    let view: Value = client
        .post(url("/navigate"))
        .header("Authorization", &auth)
        .json(&json!({"action": "go_to", "index": -5}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["current_question_index"], 0);
    assert_eq!(view["points_earned"], 40);

    // 9. Result is unavailable until submission
    let response = client
        .get(url("/result"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 10. Submit: 40 of 60 points rounds to 67
    let result: Value = client
        .post(url("/submit"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["score"], 67);
    assert_eq!(result["passed"], false);
    assert_eq!(result["correct_count"], 2);
    assert_eq!(result["incorrect_count"], 1);
    assert_eq!(result["submission_reason"], "manual");

    let response = client
        .post(url("/submit"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({"question_id": 2, "type": "choice", "selected_option_ids": ["a", "c"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 11. Leaderboard shows the submission
    let board: Vec<Value> = client
        .get(format!("{}/api/assessments/1/leaderboard", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0]["score"], 67);

    // 12. Another user cannot touch the attempt
    let other = register_and_login(&client, &address).await;
    let response = client
        .get(url(""))
        .header("Authorization", format!("Bearer {}", other))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn test_pause_and_resume() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let auth = format!("Bearer {}", register_and_login(&client, &address).await);

    let attempt: Value = client
        .post(format!("{}/api/assessments/2/attempts", address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = attempt["id"].as_str().unwrap().to_string();
    let url = |path: &str| format!("{}/api/attempts/{}{}", address, id, path);

    client
        .post(url("/start"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();

    let paused: Value = client
        .post(url("/pause"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(paused["is_paused"], true);

    // Answers are still accepted while paused
    let response = client
        .post(url("/answers"))
        .header("Authorization", &auth)
        .json(&json!({"question_id": 1, "type": "choice", "selected_option_ids": ["b"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let resumed: Value = client
        .post(url("/resume"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resumed["is_paused"], false);
    assert_eq!(resumed["status"], "in_progress");
}

#[tokio::test]
async fn test_admin_routes() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Candidates are forbidden
    let candidate = register_and_login(&client, &address).await;
    let response = client
        .get(format!("{}/api/admin/users", address))
        .header("Authorization", format!("Bearer {}", candidate))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let admin = format!("Bearer {}", login(&client, &address, ADMIN_USERNAME, ADMIN_PASSWORD).await);

    // Declared total must match the question points
    let definition = json!({
        "title": "Git Essentials",
        "skill": "git",
        "time_limit_minutes": 5,
        "total_points": 99,
        "questions": [{
            "id": 1,
            "prompt": "Which command creates a branch?",
            "points": 10,
            "difficulty": "easy",
            "type": "choice",
            "options": [
                {"id": "a", "text": "git branch", "is_correct": true},
                {"id": "b", "text": "git fetch", "is_correct": false}
            ]
        }]
    });
    let response = client
        .post(format!("{}/api/admin/assessments", address))
        .header("Authorization", &admin)
        .json(&definition)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Point values that would overflow the total
    let mut oversized = definition.clone();
    oversized["total_points"] = json!(null);
    oversized["questions"][0]["points"] = json!(u32::MAX);
    let mut second = oversized["questions"][0].clone();
    second["id"] = json!(2);
    second["points"] = json!(1);
    oversized["questions"].as_array_mut().unwrap().push(second);
    let response = client
        .post(format!("{}/api/admin/assessments", address))
        .header("Authorization", &admin)
        .json(&oversized)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let mut definition = definition;
    definition["total_points"] = json!(10);
    let response = client
        .post(format!("{}/api/admin/assessments", address))
        .header("Authorization", &admin)
        .json(&definition)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["passing_score"], 70);
    let assessment_id = created["id"].as_i64().unwrap();

    let catalog: Vec<Value> = client
        .get(format!("{}/api/assessments", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(catalog.len(), 3);

    let response = client
        .delete(format!("{}/api/admin/assessments/{}", address, assessment_id))
        .header("Authorization", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // Deleting a user removes them from the listing
    let users: Vec<Value> = client
        .get(format!("{}/api/admin/users", address))
        .header("Authorization", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let candidate_id = users
        .iter()
        .find(|u| u["role"] == "candidate")
        .and_then(|u| u["id"].as_i64())
        .unwrap();

    let response = client
        .delete(format!("{}/api/admin/users/{}", address, candidate_id))
        .header("Authorization", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let users: Vec<Value> = client
        .get(format!("{}/api/admin/users", address))
        .header("Authorization", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
}
