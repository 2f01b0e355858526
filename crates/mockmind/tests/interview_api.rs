//! End-to-end tests of the HTTP API against a scripted LLM provider

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use mockmind::config::{MockMindConfig, SessionConfig};
use mockmind::providers::{ConnectionStatus, GenerateOptions, LlmProvider};
use mockmind::server::{state::AppState, MockMindServer};
use mockmind::{Error, Result};

/// Answers prompts by task, the way a well-behaved model would
#[derive(Default)]
struct FakeInterviewer {
    questions_asked: AtomicUsize,
    evaluations: AtomicUsize,
    fail_evaluations: AtomicBool,
    evaluation_delay_ms: AtomicU64,
}

#[async_trait]
impl LlmProvider for FakeInterviewer {
    async fn complete(&self, prompt: &str, _options: &GenerateOptions) -> Result<String> {
        if prompt.starts_with("You are evaluating an answer") {
            if self.fail_evaluations.load(Ordering::SeqCst) {
                return Err(Error::ProviderUnreachable("Cannot connect to fake".into()));
            }
            let delay = self.evaluation_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
            self.evaluations.fetch_add(1, Ordering::SeqCst);
            let score = if prompt.contains("Answer: \"I don't know\"") { 10 } else { 75 };
            return Ok(json!({
                "score": score,
                "feedback": "Scripted feedback",
                "strengths": ["structure"],
                "improvements": ["depth"],
                "keyPointsCovered": []
            })
            .to_string());
        }

        if prompt.starts_with("Generate a comprehensive interview performance report") {
            return Ok(format!(
                "```json\n{}\n```",
                json!({
                    "overallScore": 68,
                    "summary": "Consistent answers with room to grow.",
                    "categoryScores": {"technical": 70, "communication": 72, "problemSolving": 61},
                    "strengths": ["a", "b", "c"],
                    "improvements": ["d", "e", "f"],
                    "recommendations": ["g", "h", "i"]
                })
            ));
        }

        let n = self.questions_asked.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({
            "question": format!("Scripted question {}?", n),
            "type": "REST API Design",
            "difficulty": 3,
            "expectedKeyPoints": ["resources", "statelessness"]
        })
        .to_string())
    }

    async fn test_connection(&self) -> ConnectionStatus {
        ConnectionStatus::connected("fake-model", true)
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    llm: Arc<FakeInterviewer>,
    dir: TempDir,
}

fn config_for(data_dir: &Path) -> MockMindConfig {
    MockMindConfig {
        sessions: SessionConfig {
            data_dir: data_dir.to_path_buf(),
            ..SessionConfig::default()
        },
        ..MockMindConfig::default()
    }
}

fn build_app(data_dir: &Path, llm: Arc<FakeInterviewer>) -> (Router, AppState) {
    let state = AppState::with_provider(config_for(data_dir), llm);
    let router = MockMindServer::with_state(state.clone()).build_router();
    (router, state)
}

fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let llm = Arc::new(FakeInterviewer::default());
    let (router, state) = build_app(&dir.path().join("sessions"), Arc::clone(&llm));
    TestApp {
        router,
        state,
        llm,
        dir,
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn start(router: &Router) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/api/interviews/start",
        Some(json!({
            "role": "Backend Developer",
            "level": "Senior",
            "topics": ["REST API Design"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["sessionId"].as_str().unwrap().to_string()
}

async fn answer(router: &Router, session_id: &str, text: &str) -> (StatusCode, Value) {
    send(
        router,
        Method::POST,
        &format!("/api/interviews/{}/answer", session_id),
        Some(json!({ "answer": text })),
    )
    .await
}

async fn status_of(router: &Router, session_id: &str) -> Value {
    let (status, body) = send(
        router,
        Method::GET,
        &format!("/api/interviews/{}/status", session_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"].clone()
}

#[tokio::test]
async fn test_start_returns_session_and_question() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/interviews/start",
        Some(json!({
            "role": "Backend Developer",
            "level": "Senior",
            "topics": ["REST API Design"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["data"]["sessionId"].as_str().is_some());
    let question = &body["data"]["question"];
    assert!(!question["question"].as_str().unwrap().is_empty());
    assert!(question["questionId"].is_string());
    assert_eq!(question["difficulty"], 3);

    let session_id = body["data"]["sessionId"].as_str().unwrap();
    let status = status_of(&app.router, session_id).await;
    assert_eq!(status["status"], "active");
    assert_eq!(status["totalQuestions"], 1);
    assert_eq!(status["totalAnswers"], 0);
    assert_eq!(status["config"]["level"], "Senior");
}

#[tokio::test]
async fn test_non_responsive_answer_scores_low() {
    let app = test_app();
    let session_id = start(&app.router).await;

    let (status, body) = answer(&app.router, &session_id, "I don't know").await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let data = &body["data"];
    assert!(data["evaluation"]["score"].as_u64().unwrap() <= 25);
    assert_eq!(data["shouldContinue"], true);
    assert!(data["nextQuestion"]["question"].is_string());

    let status = status_of(&app.router, &session_id).await;
    assert_eq!(status["currentQuestionIndex"], 1);
    assert_eq!(status["totalAnswers"], 1);
    assert_eq!(status["totalQuestions"], 2);
}

#[tokio::test]
async fn test_ten_answers_end_interview_and_report() {
    let app = test_app();
    let session_id = start(&app.router).await;

    for turn in 1..=10 {
        let (status, body) = answer(
            &app.router,
            &session_id,
            &format!("Answer number {} about resources and verbs", turn),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "turn {}: {}", turn, body);

        let data = &body["data"];
        if turn < 10 {
            assert_eq!(data["shouldContinue"], true, "turn {}", turn);
            assert!(data["nextQuestion"].is_object());
        } else {
            assert_eq!(data["shouldContinue"], false);
            assert!(data["nextQuestion"].is_null());
        }

        // Questions never run more than one ahead of answers
        let status = status_of(&app.router, &session_id).await;
        let questions = status["totalQuestions"].as_u64().unwrap();
        let answers = status["totalAnswers"].as_u64().unwrap();
        assert!(answers <= questions && questions <= answers + 1);
    }

    // No outstanding question after the cap
    let (status, _) = answer(&app.router, &session_id, "One more answer past the cap").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = send(
        &app.router,
        Method::POST,
        &format!("/api/interviews/{}/end", session_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let report = &body["data"]["report"];
    assert_eq!(report["qaPairs"].as_array().unwrap().len(), 10);
    assert_eq!(report["overallScore"], 68);
    assert_eq!(report["sessionId"], session_id.as_str());

    let report_id = body["data"]["reportId"].as_str().unwrap();
    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/reports/{}", report_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reportId"], report_id);
    assert_eq!(body["data"]["session"]["role"], "Backend Developer");
    assert!(body["data"]["session"]["duration"].is_u64());

    let status = status_of(&app.router, &session_id).await;
    assert_eq!(status["status"], "completed");

    // Ending twice is rejected
    let (status, _) = send(
        &app.router,
        Method::POST,
        &format!("/api/interviews/{}/end", session_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_report_is_not_found() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/reports/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, body) = send(&app.router, Method::GET, "/api/reports/never-created", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_persistence_failure_on_end_yields_no_report() {
    let app = test_app();
    let session_id = start(&app.router).await;
    let (status, _) = answer(&app.router, &session_id, "REST uses resources and verbs").await;
    assert_eq!(status, StatusCode::OK);

    // Replace the sessions directory with a plain file
    let data_dir = app.dir.path().join("sessions");
    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, "blocked").unwrap();

    let (status, body) = send(
        &app.router,
        Method::POST,
        &format!("/api/interviews/{}/end", session_id),
        None,
    )
    .await;
    assert!(status.is_server_error(), "{}", status);
    assert_eq!(body["success"], false);

    let (_, stats) = send(&app.router, Method::GET, "/api/stats", None).await;
    assert_eq!(stats["data"]["reportsStored"], 0);

    let status = status_of(&app.router, &session_id).await;
    assert_eq!(status["status"], "active");
}

#[tokio::test]
async fn test_failed_evaluation_leaves_session_unchanged() {
    let app = test_app();
    let session_id = start(&app.router).await;

    app.llm.fail_evaluations.store(true, Ordering::SeqCst);
    let (status, body) = answer(&app.router, &session_id, "A perfectly valid answer").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unreachable"));

    let status = status_of(&app.router, &session_id).await;
    assert_eq!(status["currentQuestionIndex"], 0);
    assert_eq!(status["totalAnswers"], 0);

    // Resubmission succeeds once the provider is back
    app.llm.fail_evaluations.store(false, Ordering::SeqCst);
    let (status, _) = answer(&app.router, &session_id, "A perfectly valid answer").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.llm.evaluations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let app = test_app();
    let session_id = start(&app.router).await;
    let (status, _) = answer(&app.router, &session_id, "Statelessness and uniform interface").await;
    assert_eq!(status, StatusCode::OK);

    // Fresh state over the same directory
    let (router, state) = build_app(&app.dir.path().join("sessions"), Arc::clone(&app.llm));
    assert_eq!(state.store().stats().active_sessions, 0);

    let status = status_of(&router, &session_id).await;
    assert_eq!(status["currentQuestionIndex"], 1);
    assert_eq!(status["totalQuestions"], 2);

    let (status, _) = answer(&router, &session_id, "Caching with ETags and max-age").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state.store().stats().active_sessions, 1);
}

#[tokio::test]
async fn test_validation_errors() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/interviews/start",
        Some(json!({"role": "B", "level": "Intern", "topics": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["role", "level", "topics"]);

    let session_id = start(&app.router).await;
    let (status, body) = answer(&app.router, &session_id, "too short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "answer");

    let (status, _) = send(&app.router, Method::POST, "/api/interviews/start", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No LLM calls for rejected input
    assert_eq!(app.llm.questions_asked.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/interviews/{}/status", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, _) = answer(&app.router, "not-a-session", "A perfectly valid answer").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_stats_and_fallback() {
    let app = test_app();

    let (status, body) = send(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].is_string());

    let (status, body) = send(&app.router, Method::GET, "/api/health/ollama", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["connected"], true);
    assert_eq!(body["data"]["available"], true);
    assert_eq!(body["data"]["model"], "fake-model");

    start(&app.router).await;
    let (_, body) = send(&app.router, Method::GET, "/api/stats", None).await;
    assert_eq!(body["data"]["activeSessions"], 1);
    assert_eq!(body["data"]["reportsStored"], 0);

    let (status, body) = send(&app.router, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn test_concurrent_answers_are_serialized() {
    let app = test_app();
    let session_id = start(&app.router).await;
    app.llm.evaluation_delay_ms.store(50, Ordering::SeqCst);

    let (first, second) = tokio::join!(
        answer(&app.router, &session_id, "First concurrent answer about caching"),
        answer(&app.router, &session_id, "Second concurrent answer about caching"),
    );
    assert_eq!(first.0, StatusCode::OK, "{}", first.1);
    assert_eq!(second.0, StatusCode::OK, "{}", second.1);

    let status = status_of(&app.router, &session_id).await;
    assert_eq!(status["currentQuestionIndex"], 2);
    assert_eq!(status["totalAnswers"], 2);
    assert_eq!(status["totalQuestions"], 3);

    // Each answer is bound to a different question
    let id = session_id.parse().unwrap();
    let session = app.state.store().get_session(id).await.unwrap();
    assert_ne!(session.answers[0].question_id, session.answers[1].question_id);
    assert_eq!(session.answers[0].question_id, session.questions[0].question_id);
    assert_eq!(session.answers[1].question_id, session.questions[1].question_id);
    assert_eq!(app.llm.evaluations.load(Ordering::SeqCst), 2);
    assert_eq!(app.state.engine().active_turns(), 0);
}

#[tokio::test]
async fn test_unknown_sessions_leave_no_turn_state() {
    let app = test_app();

    for _ in 0..50 {
        let id = uuid::Uuid::new_v4();
        let (status, _) = answer(&app.router, &id.to_string(), "An answer for nobody at all").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &app.router,
            Method::POST,
            &format!("/api/interviews/{}/end", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    assert_eq!(app.state.engine().active_turns(), 0);

    // Failed turns on a real session release their lock as well
    let session_id = start(&app.router).await;
    app.llm.fail_evaluations.store(true, Ordering::SeqCst);
    let (status, _) = answer(&app.router, &session_id, "This evaluation will fail").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.state.engine().active_turns(), 0);
}
