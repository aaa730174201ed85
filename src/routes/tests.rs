use super::*;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::model::NewUser;
use crate::token::TokenKeys;

struct TestApp {
    app: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::in_memory(TokenKeys::new("test-secret", 1));
        Self { app: routes(state.clone()), state }
    }

    /// A stored user and a valid token for them, without going through argon2.
    async fn user(&self, email: &str) -> String {
        let user = self
            .state
            .users
            .create_user(NewUser {
                name: "Test".to_string(),
                email: email.to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .expect("user");
        self.state.tokens.issue(user.id).expect("token")
    }

    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.app.clone().oneshot(request).await.expect("response")
    }

    async fn create(&self, token: &str, title: &str) -> Value {
        let response = self.send("POST", "/todos", Some(token), Some(json!({ "title": title }))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["todo"].clone()
    }

    async fn list(&self, token: &str) -> Vec<Value> {
        let response = self.send("GET", "/todos", Some(token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["todos"].as_array().expect("todos array").clone()
    }
}

async fn body_bytes(response: Response) -> Vec<u8> {
    body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

async fn json_body(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json")
}

#[tokio::test]
async fn health_reports_ok() {
    let t = TestApp::new();
    let response = t.send("GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], 200);
}

#[tokio::test]
async fn todo_routes_require_a_token() {
    let t = TestApp::new();

    let response = t.send("GET", "/todos", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Unauthenticated.");

    let response = t.send("GET", "/todos", Some("garbage"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_path_is_not_found_without_a_token() {
    let t = TestApp::new();

    let response = t.send("GET", "/nope", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t.send("GET", "/todos/a/b", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_list_toggle_delete_round_trip() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;

    let response = t
        .send("POST", "/todos", Some(&token), Some(json!({ "title": "Buy milk" })))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Todo created successfully");
    assert_eq!(body["todo"]["is_done"], false);
    assert_eq!(body["todo"]["descriptions"], Value::Null);
    let id = body["todo"]["id"].as_str().expect("id").to_string();

    let todos = t.list(&token).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["title"], "Buy milk");
    assert_eq!(todos[0]["is_done"], false);

    let response = t
        .send("PUT", &format!("/todos/{id}"), Some(&token), Some(json!({ "is_done": true })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Todo updated successfully");
    assert_eq!(body["todo"]["is_done"], true);

    let todos = t.list(&token).await;
    assert_eq!(todos[0]["is_done"], true);

    let response = t.send("DELETE", &format!("/todos/{id}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "message": "Todo deleted successfully" }));

    assert!(t.list(&token).await.is_empty());
}

#[tokio::test]
async fn lists_newest_first() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;
    for title in ["T1", "T2", "T3"] {
        t.create(&token, title).await;
    }

    let titles: Vec<Value> = t.list(&token).await.into_iter().map(|todo| todo["title"].clone()).collect();
    assert_eq!(titles, [json!("T3"), json!("T2"), json!("T1")]);
}

#[tokio::test]
async fn other_users_never_see_my_todos() {
    let t = TestApp::new();
    let ann = t.user("ann@example.com").await;
    let bob = t.user("bob@example.com").await;

    t.create(&ann, "ann's secret").await;
    t.create(&bob, "bob's errand").await;

    let bobs = t.list(&bob).await;
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0]["title"], "bob's errand");
}

#[tokio::test]
async fn title_length_is_checked_on_create() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;

    let ok = t
        .send("POST", "/todos", Some(&token), Some(json!({ "title": "x".repeat(255) })))
        .await;
    assert_eq!(ok.status(), StatusCode::CREATED);

    let too_long = t
        .send("POST", "/todos", Some(&token), Some(json!({ "title": "x".repeat(256) })))
        .await;
    assert_eq!(too_long.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(too_long).await;
    assert!(body["errors"]["title"].is_array());

    let empty = t.send("POST", "/todos", Some(&token), Some(json!({ "title": "" }))).await;
    assert_eq!(empty.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(empty).await["message"], "The title field is required.");
}

#[tokio::test]
async fn missing_and_foreign_todos_look_the_same() {
    let t = TestApp::new();
    let ann = t.user("ann@example.com").await;
    let bob = t.user("bob@example.com").await;
    let anns_id = t.create(&ann, "ann's").await["id"].as_str().unwrap().to_string();
    let missing_id = Uuid::new_v4().to_string();

    for (method, body) in [("PUT", Some(json!({ "is_done": true }))), ("DELETE", None)] {
        let foreign = t
            .send(method, &format!("/todos/{anns_id}"), Some(&bob), body.clone())
            .await;
        let missing = t
            .send(method, &format!("/todos/{missing_id}"), Some(&bob), body)
            .await;

        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(foreign).await, body_bytes(missing).await);
    }

    // Ann's todo survived Bob's attempts.
    let todos = t.list(&ann).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["is_done"], false);
}

#[tokio::test]
async fn malformed_id_is_not_found() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;

    let response = t.send("DELETE", "/todos/42", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["message"], "Todo not found or unauthorized");
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;

    let response = t
        .send(
            "POST",
            "/todos",
            Some(&token),
            Some(json!({ "title": "Buy milk", "descriptions": "2 litres" })),
        )
        .await;
    let id = json_body(response).await["todo"]["id"].as_str().unwrap().to_string();

    let response = t
        .send("PUT", &format!("/todos/{id}"), Some(&token), Some(json!({ "is_done": true })))
        .await;
    let todo = json_body(response).await["todo"].clone();
    assert_eq!(todo["title"], "Buy milk");
    assert_eq!(todo["descriptions"], "2 litres");
    assert_eq!(todo["is_done"], true);

    let response = t
        .send("PUT", &format!("/todos/{id}"), Some(&token), Some(json!({ "descriptions": null })))
        .await;
    let todo = json_body(response).await["todo"].clone();
    assert_eq!(todo["descriptions"], Value::Null);
    assert_eq!(todo["is_done"], true);
}

#[tokio::test]
async fn invalid_update_is_422_for_owner_and_404_for_others() {
    let t = TestApp::new();
    let ann = t.user("ann@example.com").await;
    let bob = t.user("bob@example.com").await;
    let id = t.create(&ann, "ann's").await["id"].as_str().unwrap().to_string();
    let bad = json!({ "is_done": "yes" });

    let own = t.send("PUT", &format!("/todos/{id}"), Some(&ann), Some(bad.clone())).await;
    assert_eq!(own.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(own).await["errors"]["is_done"].is_array());

    let foreign = t.send("PUT", &format!("/todos/{id}"), Some(&bob), Some(bad)).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_accepts_numeric_done_flag() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;
    let id = t.create(&token, "Buy milk").await["id"].as_str().unwrap().to_string();

    let response = t
        .send("PUT", &format!("/todos/{id}"), Some(&token), Some(json!({ "is_done": 1 })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["todo"]["is_done"], true);

    let response = t
        .send("PUT", &format!("/todos/{id}"), Some(&token), Some(json!({ "is_done": "0" })))
        .await;
    assert_eq!(json_body(response).await["todo"]["is_done"], false);
}

#[tokio::test]
async fn input_strings_are_trimmed_and_blank_description_is_null() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;

    let response = t
        .send(
            "POST",
            "/todos",
            Some(&token),
            Some(json!({ "title": "  Buy milk  ", "descriptions": "  " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let todo = json_body(response).await["todo"].clone();
    assert_eq!(todo["title"], "Buy milk");
    assert_eq!(todo["descriptions"], Value::Null);
}

#[tokio::test]
async fn both_description_keys_is_422() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;

    let response = t
        .send(
            "POST",
            "/todos",
            Some(&token),
            Some(json!({ "title": "Buy milk", "descriptions": "a", "description": "b" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["errors"]["descriptions"].is_array());
    assert!(t.list(&token).await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let t = TestApp::new();
    let token = t.user("ann@example.com").await;

    let request = Request::post("/todos")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .expect("request");
    let response = t.app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_login_logout_flow() {
    let t = TestApp::new();

    let response = t
        .send(
            "POST",
            "/register",
            None,
            Some(json!({ "name": "Ann", "email": "ann@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["user"]["name"], "Ann");

    let duplicate = t
        .send(
            "POST",
            "/register",
            None,
            Some(json!({ "name": "Ann", "email": "ann@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let wrong = t
        .send(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let response = t
        .send(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "ann@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login: LoginResponse = serde_json::from_value(json_body(response).await).expect("login");
    assert_eq!(login.user.email, "ann@example.com");

    let me = t.send("GET", "/user", Some(&login.token), None).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(json_body(me).await["user"]["id"], json!(login.user.id));

    let logout = t.send("POST", "/logout", Some(&login.token), None).await;
    assert_eq!(logout.status(), StatusCode::OK);

    let after = t.send("GET", "/todos", Some(&login.token), None).await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}
