use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use sqlpilot_core::{
  query::{QueryFailure, QueryResult},
  store::WorkspaceStore,
  user::User,
};
use sqlpilot_store_sqlite::SqliteStore;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
  AppState, router,
  testing::{BROKER_SECRET, StubEngine, make_state, make_state_with, seed_user},
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct Harness {
  state: AppState<SqliteStore>,
  app:   Router,
}

impl Harness {
  async fn new() -> Self { Self::from_state(make_state().await) }

  fn from_state(state: AppState<SqliteStore>) -> Self {
    Self { app: router(state.clone()), state }
  }

  async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      req = req.header(header::COOKIE, format!("authToken={t}"));
    }
    let req = match body {
      Some(b) => req
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(b.to_string()))
        .unwrap(),
      None => req.body(Body::empty()).unwrap(),
    };
    self.app.clone().oneshot(req).await.unwrap()
  }

  async fn user(&self, email: &str) -> (User, String) {
    let user = seed_user(&self.state, email, "password").await;
    let token = self.state.session.issue(&user);
    (user, token)
  }

  async fn project(&self, token: &str) -> Uuid {
    let resp = self
      .send(Method::POST, "/api/projects", Some(token), Some(json!({ "title": "Sales" })))
      .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    body["id"].as_str().unwrap().parse().unwrap()
  }

  async fn schema(&self, token: &str, project: Uuid) -> Uuid {
    let resp = self
      .send(
        Method::POST,
        &format!("/api/projects/{project}/schemas"),
        Some(token),
        Some(json!({ "name": "retail", "ddl": "CREATE TABLE a (x INT)\n\nCREATE TABLE b (y INT)", "diagram": "erDiagram" })),
      )
      .await;
    let body = json_body(resp).await;
    body["schema"]["id"].as_str().unwrap().parse().unwrap()
  }
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(resp: &Response) -> String {
  resp
    .headers()
    .get(header::SET_COOKIE)
    .and_then(|v| v.to_str().ok())
    .unwrap()
    .to_owned()
}

fn token_of(cookie: &str) -> &str {
  cookie
    .split(';')
    .next()
    .and_then(|kv| kv.strip_prefix("authToken="))
    .unwrap()
}

// ─── Session gate ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn unauthenticated_list_is_rejected_without_mutation() {
  let h = Harness::new().await;
  let resp = h.send(Method::GET, "/api/projects", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(json_body(resp).await, json!({ "error": "User not found" }));

  let resp = h
    .send(Method::POST, "/api/projects", None, Some(json!({ "title": "Sneaky" })))
    .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let anyone = seed_user(&h.state, "late@example.com", "pw").await;
  let projects = h.state.store.list_projects_by_owner(anyone.id, None).await.unwrap();
  assert!(projects.is_empty());
}

#[tokio::test]
async fn tampered_token_is_rejected() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let mut forged = token.clone();
  forged.push('0');
  let resp = h.send(Method::GET, "/api/projects", Some(&forged), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_then_login_issues_usable_cookie() {
  let h = Harness::new().await;
  let resp = h
    .send(
      Method::POST,
      "/api/register",
      None,
      Some(json!({ "name": "Grace Hopper", "email": "grace@example.com", "password": "cobol" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert!(set_cookie(&resp).contains("HttpOnly"));
  assert_eq!(json_body(resp).await, json!({ "message": "User registered successfully" }));

  let again = h
    .send(
      Method::POST,
      "/api/register",
      None,
      Some(json!({ "name": "Grace Hopper", "email": "grace@example.com", "password": "cobol" })),
    )
    .await;
  assert_eq!(again.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(again).await, json!({ "error": "User already exists" }));

  let bad = h
    .send(Method::POST, "/api/login", None, Some(json!({ "email": "grace@example.com", "password": "nope" })))
    .await;
  assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(json_body(bad).await, json!({ "error": "Invalid email or password" }));

  let ok = h
    .send(Method::POST, "/api/login", None, Some(json!({ "email": "grace@example.com", "password": "cobol" })))
    .await;
  assert_eq!(ok.status(), StatusCode::OK);
  let cookie = set_cookie(&ok);

  let profile = h.send(Method::GET, "/api/profile", Some(token_of(&cookie)), None).await;
  assert_eq!(profile.status(), StatusCode::OK);
  let body = json_body(profile).await;
  assert_eq!(body["email"], "grace@example.com");
  assert_eq!(
    body["image"],
    "https://ui-avatars.com/api/?name=Grace%20Hopper&background=random"
  );
  assert_eq!(body["populatedConnections"], json!([]));
}

#[tokio::test]
async fn oauth_provisions_once_and_requires_broker_secret() {
  let h = Harness::new().await;
  let body = json!({ "email": "linus@example.com", "name": "Linus", "image": "https://img/l.png" });

  let anon = h.send(Method::POST, "/api/auth/oauth", None, Some(body.clone())).await;
  assert_eq!(anon.status(), StatusCode::UNAUTHORIZED);

  let call = || {
    Request::builder()
      .method(Method::POST)
      .uri("/api/auth/oauth")
      .header(header::AUTHORIZATION, format!("Bearer {BROKER_SECRET}"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  };
  let first = h.app.clone().oneshot(call()).await.unwrap();
  assert_eq!(first.status(), StatusCode::CREATED);
  let second = h.app.clone().oneshot(call()).await.unwrap();
  assert_eq!(second.status(), StatusCode::OK);

  let creds = h.state.store.find_user_by_email("linus@example.com").await.unwrap().unwrap();
  assert!(creds.password_hash.is_none());
  assert_eq!(creds.user.image, "https://img/l.png");
}

#[tokio::test]
async fn logout_clears_cookie() {
  let h = Harness::new().await;
  let resp = h.send(Method::POST, "/api/logout", None, None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  assert!(set_cookie(&resp).contains("Max-Age=0"));
}

// ─── Projects ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_project_is_owned_by_caller() {
  let h = Harness::new().await;
  let (user, token) = h.user("ada@example.com").await;
  let id = h.project(&token).await;

  let stored = h.state.store.get_project(id).await.unwrap().unwrap();
  assert_eq!(stored.created_by, user.id);

  let resp = h.send(Method::GET, "/api/projects?limit=1", Some(&token), None).await;
  let list = json_body(resp).await;
  assert_eq!(list.as_array().unwrap().len(), 1);
  assert_eq!(list[0]["createdBy"], user.id.to_string());
}

#[tokio::test]
async fn zero_limit_lists_every_project() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  h.project(&token).await;
  h.project(&token).await;

  let capped = json_body(h.send(Method::GET, "/api/projects?limit=1", Some(&token), None).await).await;
  assert_eq!(capped.as_array().unwrap().len(), 1);

  let zero = json_body(h.send(Method::GET, "/api/projects?limit=0", Some(&token), None).await).await;
  assert_eq!(zero.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn other_users_project_is_not_found() {
  let h = Harness::new().await;
  let (_, owner) = h.user("owner@example.com").await;
  let (_, intruder) = h.user("intruder@example.com").await;
  let id = h.project(&owner).await;

  for uri in [format!("/api/projects/{id}"), format!("/api/projects/{id}/queries")] {
    let resp = h.send(Method::GET, &uri, Some(&intruder), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}

#[tokio::test]
async fn invalid_project_title_is_generic_action_failure() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let resp = h
    .send(Method::POST, "/api/projects", Some(&token), Some(json!({ "title": "ab" })))
    .await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(json_body(resp).await, json!({ "error": "createProject failed" }));
}

// ─── Schemas ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn saving_same_schema_twice_keeps_one_record() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;

  let first = h.schema(&token, project).await;
  let second = h.schema(&token, project).await;
  assert_eq!(first, second);

  let resp = h
    .send(Method::GET, &format!("/api/projects/{project}/schemas"), Some(&token), None)
    .await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn apply_saves_then_runs_each_statement_in_order() {
  let engine = Arc::new(StubEngine {
    execute: QueryResult::Failure(QueryFailure::new("table exists", Some("AnalysisError".into()))),
    ..StubEngine::default()
  });
  let h = Harness::from_state(make_state_with(engine.clone()).await);
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;

  let resp = h
    .send(
      Method::POST,
      &format!("/api/projects/{project}/schemas/apply"),
      Some(&token),
      Some(json!({
        "name": "retail",
        "ddl": "CREATE TABLE a (x INT)\n\nCREATE TABLE b (y INT)\n\nCREATE TABLE c (z INT)",
        "dialect": "spark",
      })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  assert_eq!(
    engine.calls.lock().unwrap().as_slice(),
    [
      "execute:CREATE TABLE a (x INT):retail",
      "execute:CREATE TABLE b (y INT):retail",
      "execute:CREATE TABLE c (z INT):retail",
    ]
  );

  // Rejected statements are reported, and the schema stays saved.
  let body = json_body(resp).await;
  assert_eq!(body["created"], true);
  let statements = body["statements"].as_array().unwrap();
  assert_eq!(statements.len(), 3);
  assert_eq!(statements[1]["statement"], "CREATE TABLE b (y INT)");
  assert_eq!(statements[1]["result"]["status"], "failure");
  assert_eq!(statements[1]["result"]["name"], "AnalysisError");

  let saved = h.state.store.list_schemas(project).await.unwrap();
  assert_eq!(saved.len(), 1);
  assert_eq!(saved[0].id.to_string(), body["schema"]["id"].as_str().unwrap());
}

#[tokio::test]
async fn generate_schema_forwards_description() {
  let engine = Arc::new(StubEngine::default());
  let h = Harness::from_state(make_state_with(engine.clone()).await);
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;

  let resp = h
    .send(
      Method::POST,
      &format!("/api/projects/{project}/schemas/generate"),
      Some(&token),
      Some(json!({ "businessDescription": "a bookshop" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["mermaid_code"], "erDiagram");
  assert_eq!(engine.calls.lock().unwrap().as_slice(), ["generate:a bookshop"]);
}

// ─── Queries ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_query_populates_exactly_one_side() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;
  let schema = h.schema(&token, project).await;
  let uri = format!("/api/projects/{project}/queries");

  let failed = h
    .send(
      Method::POST,
      &uri,
      Some(&token),
      Some(json!({
        "schemaId": schema,
        "queryText": "selec 1",
        "dialect": "spark",
        "outputColumns": ["a"],
        "errorMessage": "syntax error",
      })),
    )
    .await;
  assert_eq!(failed.status(), StatusCode::CREATED);
  let failed = json_body(failed).await;
  assert_eq!(failed["success"], "");
  assert_eq!(failed["output"], Value::Null);
  assert_eq!(failed["error"], json!({ "message": "syntax error", "name": "Error" }));

  let ok = h
    .send(
      Method::POST,
      &uri,
      Some(&token),
      Some(json!({
        "schemaId": schema,
        "queryText": "select a, b from t",
        "outputColumns": ["a", "b"],
        "outputRows": [[1, 2]],
      })),
    )
    .await;
  let ok = json_body(ok).await;
  assert_eq!(ok["error"], Value::Null);
  assert_eq!(ok["dialect"], "trino");

  // Round trip through the history listing.
  let list = json_body(h.send(Method::GET, &uri, Some(&token), None).await).await;
  let newest = &list[0];
  assert_eq!(newest["output"]["columns"], json!(["a", "b"]));
  assert_eq!(newest["output"]["rows"], json!([[1, 2]]));
  assert_eq!(newest["project"], project.to_string());
}

#[tokio::test]
async fn query_history_is_capped_and_newest_first() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;
  let schema = h.schema(&token, project).await;
  let uri = format!("/api/projects/{project}/queries");

  for i in 0..105 {
    let resp = h
      .send(
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "schemaId": schema, "queryText": format!("select {i}") })),
      )
      .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  let list = json_body(h.send(Method::GET, &uri, Some(&token), None).await).await;
  let list = list.as_array().unwrap();
  assert_eq!(list.len(), 100);
  assert_eq!(list[0]["queryText"], "select 104");
  assert_eq!(list[99]["queryText"], "select 5");
}

#[tokio::test]
async fn engine_failure_is_persisted_as_error_record() {
  let engine = Arc::new(StubEngine {
    execute: QueryResult::Failure(QueryFailure::new("syntax error", Some("ParseError".into()))),
    ..StubEngine::default()
  });
  let h = Harness::from_state(make_state_with(engine.clone()).await);
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;
  let schema = h.schema(&token, project).await;

  let resp = h
    .send(
      Method::POST,
      &format!("/api/projects/{project}/queries/execute"),
      Some(&token),
      Some(json!({ "schemaId": schema, "sql": "SELEC 1" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert_eq!(engine.calls.lock().unwrap().as_slice(), ["execute:SELEC 1:retail"]);

  let stored = h.state.store.list_recent_queries(project, 100).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(
    stored[0].result.failure(),
    Some(&QueryFailure { message: "syntax error".into(), name: "ParseError".into() })
  );

  let list = json_body(
    h.send(Method::GET, &format!("/api/projects/{project}/queries"), Some(&token), None)
      .await,
  )
  .await;
  assert_eq!(list[0]["success"], "");
  assert_eq!(list[0]["error"], json!({ "message": "syntax error", "name": "ParseError" }));
}

#[tokio::test]
async fn translate_sends_split_ddl() {
  let engine = Arc::new(StubEngine::default());
  let h = Harness::from_state(make_state_with(engine.clone()).await);
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;
  let schema = h.schema(&token, project).await;

  let resp = h
    .send(
      Method::POST,
      &format!("/api/projects/{project}/queries/translate"),
      Some(&token),
      Some(json!({ "schemaId": schema, "naturalQuery": "how many", "dialect": "Spark" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["sql"], "SELECT 1");
  assert_eq!(engine.calls.lock().unwrap().as_slice(), ["translate:how many:2"]);
}

#[tokio::test]
async fn schema_from_another_project_is_not_found() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let a = h.project(&token).await;
  let b = h.project(&token).await;
  let schema = h.schema(&token, a).await;

  let resp = h
    .send(
      Method::POST,
      &format!("/api/projects/{b}/queries"),
      Some(&token),
      Some(json!({ "schemaId": schema, "queryText": "select 1" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suggestions_degrade_to_empty_list() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;
  let resp = h
    .send(
      Method::POST,
      &format!("/api/projects/{project}/queries/suggestions"),
      Some(&token),
      Some(json!({ "query": "sel" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!({ "suggestions": [] }));
}

// ─── Files and profile ────────────────────────────────────────────────────────

#[tokio::test]
async fn files_are_listed_per_project() {
  let h = Harness::new().await;
  let (_, token) = h.user("ada@example.com").await;
  let project = h.project(&token).await;
  let uri = format!("/api/projects/{project}/files");

  let resp = h.send(Method::POST, &uri, Some(&token), Some(json!({ "name": "orders.csv" }))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let list = json_body(h.send(Method::GET, &uri, Some(&token), None).await).await;
  assert_eq!(list[0]["name"], "orders.csv");
  assert_eq!(list[0]["projectId"], project.to_string());
}

#[tokio::test]
async fn connection_is_linked_and_password_hidden() {
  let h = Harness::new().await;
  let (user, token) = h.user("ada@example.com").await;
  let resp = h
    .send(
      Method::POST,
      "/api/connections",
      Some(&token),
      Some(json!({
        "dialect": "trino",
        "host": "db.internal",
        "port": 8080,
        "database": "warehouse",
        "username": "ada",
        "password": "hunter2",
      })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_body(resp).await;
  assert!(created.get("password").is_none());

  let stored = h.state.store.get_user(user.id).await.unwrap().unwrap();
  assert_eq!(stored.connections.len(), 1);

  let resp = h
    .send(Method::PATCH, "/api/profile", Some(&token), Some(json!({ "name": "Ada King" })))
    .await;
  let profile = json_body(resp).await;
  assert_eq!(profile["name"], "Ada King");
  assert_eq!(profile["populatedConnections"][0]["database"], "warehouse");
}
