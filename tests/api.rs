use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use spark::generator::{GenerationRequest, SparkGenerator, SparkSuggestion, Suggestion};
use spark::{router, AppState, SparkService, SparkStore, TokenAuthenticator};

struct CannedGenerator;

#[async_trait]
impl SparkGenerator for CannedGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Suggestion {
        Suggestion::from_model(SparkSuggestion {
            title: format!(
                "Step {} toward {}",
                request.previous_sparks.len() + 1,
                request.goal_title
            ),
            description: "Keep it tiny".to_string(),
            effort: "2-5 min".to_string(),
            resource_link: None,
        })
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let store = Arc::new(SparkStore::open_in_memory().unwrap());
        let service = SparkService::new(store, Arc::new(CannedGenerator));
        let authenticator = TokenAuthenticator::new(HashMap::from([
            ("alice-token".to_string(), "alice".to_string()),
            ("bob-token".to_string(), "bob".to_string()),
        ]));
        let app = router(AppState::new(service, Arc::new(authenticator)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.get(format!("{}{}", self.base, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base, path))
            .json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, Some(token), body).await
    }

    async fn create_goal(&self, token: &str, title: &str) -> Value {
        let (status, body) = self.post("/goals", token, json!({ "title": title })).await;
        assert_eq!(status, StatusCode::CREATED);
        body["goal"].clone()
    }
}

async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_needs_no_token() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected_without_writes() {
    let server = TestServer::start().await;

    let (status, body) = server
        .send(reqwest::Method::POST, "/goals", None, json!({ "title": "Sneaky" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = server
        .send(
            reqwest::Method::POST,
            "/goals",
            Some("not-a-token"),
            json!({ "title": "Sneaky" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = server.get("/goals", Some("alice-token")).await;
    assert_eq!(body["goals"], json!([]));
}

#[tokio::test]
async fn unauthenticated_spark_requests_leave_the_goal_untouched() {
    let server = TestServer::start().await;
    let goal = server.create_goal("alice-token", "Learn piano").await;
    let goal_id = goal["id"].as_str().unwrap();
    let (_, spark) = server
        .post(
            "/sparks/generate",
            "alice-token",
            json!({ "goalId": goal_id, "goalTitle": "Learn piano" }),
        )
        .await;
    let spark_id = spark["spark"]["id"].as_str().unwrap();

    let generate = json!({ "goalId": goal_id, "goalTitle": "Learn piano" });
    let complete = json!({ "sparkId": spark_id, "goalId": goal_id, "sessionId": "s-1" });
    for token in [None, Some("not-a-token")] {
        let (status, _) = server
            .send(reqwest::Method::POST, "/sparks/generate", token, generate.clone())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = server
            .send(reqwest::Method::POST, "/sparks/complete", token, complete.clone())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (_, listed) = server.get(&format!("/sparks/{}", goal_id), Some("alice-token")).await;
    assert_eq!(listed["sparks"].as_array().unwrap().len(), 1);

    let (_, body) = server.get(&format!("/goals/{}", goal_id), Some("alice-token")).await;
    assert_eq!(body["goal"]["total_sparks_completed"], 0);

    let (_, body) = server
        .get(&format!("/goals/{}/completed-sparks", goal_id), Some("alice-token"))
        .await;
    assert_eq!(body["completedSparks"], json!([]));
}

#[tokio::test]
async fn updating_a_foreign_goal_is_not_found() {
    let server = TestServer::start().await;
    let goal = server.create_goal("alice-token", "Learn piano").await;
    let id = goal["id"].as_str().unwrap();

    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/goals/{}", id),
            Some("bob-token"),
            json!({ "status": "done" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Goal not found");
}

#[tokio::test]
async fn create_and_update_goal() {
    let server = TestServer::start().await;

    let goal = server.create_goal("alice-token", "  Write a blog post ").await;
    assert_eq!(goal["title"], "Write a blog post");
    assert_eq!(goal["status"], "active");
    assert_eq!(goal["total_sparks_completed"], 0);
    assert_eq!(goal["description"], Value::Null);

    let id = goal["id"].as_str().unwrap();
    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/goals/{}", id),
            Some("alice-token"),
            json!({ "status": "paused", "description": "about Rust" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["goal"]["status"], "paused");
    assert_eq!(body["goal"]["description"], "about Rust");

    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/goals/{}", id),
            Some("alice-token"),
            json!({ "status": "done" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let server = TestServer::start().await;

    let (status, body) = server.post("/goals", "alice-token", json!({ "title": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");

    let (status, body) = server
        .post("/sparks/generate", "alice-token", json!({ "goalId": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Goal ID and title are required");
}

#[tokio::test]
async fn goals_are_private_to_their_owner() {
    let server = TestServer::start().await;
    let goal = server.create_goal("alice-token", "Learn piano").await;
    let id = goal["id"].as_str().unwrap();

    let (status, body) = server.get(&format!("/goals/{}", id), Some("bob-token")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Goal not found");

    let (status, _) = server.get(&format!("/sparks/{}", id), Some("bob-token")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .send(reqwest::Method::DELETE, &format!("/goals/{}", id), Some("bob-token"), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get(&format!("/goals/{}", id), Some("alice-token")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn spark_generation_and_completion_flow() {
    let server = TestServer::start().await;
    let goal = server.create_goal("alice-token", "Learn piano").await;
    let goal_id = goal["id"].as_str().unwrap();
    let generate = json!({ "goalId": goal_id, "goalTitle": "Learn piano" });

    let (status, first) = server.post("/sparks/generate", "alice-token", generate.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["spark"]["sequence_number"], 1);
    assert_eq!(first["spark"]["effort_minutes"], 2);
    assert_eq!(first["spark"]["ai_generated"], true);

    let (_, second) = server.post("/sparks/generate", "alice-token", generate).await;
    assert_eq!(second["spark"]["sequence_number"], 2);
    assert_eq!(second["spark"]["title"], "Step 2 toward Learn piano");

    let (_, listed) = server.get(&format!("/sparks/{}", goal_id), Some("alice-token")).await;
    assert_eq!(listed["sparks"].as_array().unwrap().len(), 2);

    let spark_id = first["spark"]["id"].as_str().unwrap();
    let complete = json!({
        "sparkId": spark_id,
        "goalId": goal_id,
        "sessionId": "session-1",
        "notes": "easy"
    });
    let (status, body) = server.post("/sparks/complete", "alice-token", complete.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completion"]["spark_id"], spark_id);
    assert_eq!(body["completion"]["session_id"], "session-1");

    let (status, body) = server.post("/sparks/complete", "alice-token", complete).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Spark already completed");

    let (status, body) = server
        .get(&format!("/goals/{}/completed-sparks", goal_id), Some("alice-token"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["goal"]["total_sparks_completed"], 1);
    let completed = body["completedSparks"].as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["notes"], "easy");
    assert_eq!(completed[0]["spark"]["id"], spark_id);
    assert_eq!(completed[0]["spark"]["title"], "Step 1 toward Learn piano");
}

#[tokio::test]
async fn deleting_a_goal_removes_its_sparks() {
    let server = TestServer::start().await;
    let goal = server.create_goal("alice-token", "Temporary").await;
    let goal_id = goal["id"].as_str().unwrap();
    server
        .post(
            "/sparks/generate",
            "alice-token",
            json!({ "goalId": goal_id, "goalTitle": "Temporary" }),
        )
        .await;

    let (status, body) = server
        .send(
            reqwest::Method::DELETE,
            &format!("/goals/{}", goal_id),
            Some("alice-token"),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = server.get(&format!("/sparks/{}", goal_id), Some("alice-token")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
