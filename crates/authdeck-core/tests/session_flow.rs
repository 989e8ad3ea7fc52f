//! End-to-end session flows against an in-process backend.

use std::sync::{Arc, Mutex};

use authdeck_core::{
    ApiClient, ApiError, AuthBackend, Credential, MemoryJar, Route, SessionController,
    SessionStore, SessionTimings, SignInData, SignUpData,
};
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

async fn sign_in(Json(body): Json<Value>) -> Response {
    if body["email"] == "a@b.com" && body["password"] == "x" {
        Json(json!({"token": "T1"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn sign_up(Json(body): Json<Value>) -> Response {
    match body["email"].as_str() {
        Some("taken@b.com") => (
            StatusCode::CONFLICT,
            Json(json!({"message": "Email already registered"})),
        )
            .into_response(),
        Some("plain@b.com") => "Check your inbox".into_response(),
        _ => Json(json!({"message": "User created"})).into_response(),
    }
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": authorization }))
}

async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": authorization, "body": body }))
}

async fn broken() -> Response {
    (StatusCode::OK, "<html>not json</html>").into_response()
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/signup", post(sign_up))
        .route("/whoami", get(whoami))
        .route("/echo", post(echo))
        .route("/broken", get(broken));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

struct Harness {
    store: SessionStore,
    api: ApiClient,
    routes: Arc<Mutex<Vec<Route>>>,
    controller: SessionController<ApiClient>,
}

fn harness(base_url: &str) -> Harness {
    let store = SessionStore::new(Arc::new(MemoryJar::new()));
    let api = ApiClient::new(base_url, None, Arc::new(store.clone())).unwrap();
    let routes = Arc::new(Mutex::new(Vec::new()));
    let navigator = {
        let routes = Arc::clone(&routes);
        move |route: Route| routes.lock().unwrap().push(route)
    };
    let controller = SessionController::new(api.clone(), store.clone(), Arc::new(navigator))
        .with_timings(SessionTimings::immediate());
    Harness {
        store,
        api,
        routes,
        controller,
    }
}

async fn whoami_header(api: &ApiClient) -> Value {
    let body: Value = api.get("/whoami").await.unwrap();
    body["authorization"].clone()
}

#[tokio::test]
async fn sign_in_attaches_bearer_to_later_requests() {
    let base = spawn_backend().await;
    let h = harness(&base);

    assert_eq!(whoami_header(&h.api).await, Value::Null);

    h.controller
        .sign_in(&SignInData::new("a@b.com", "x"))
        .await
        .unwrap();

    assert_eq!(h.store.get().unwrap(), Some(Credential::new("T1")));
    assert_eq!(h.api.authorization().as_deref(), Some("Bearer T1"));
    assert_eq!(whoami_header(&h.api).await, json!("Bearer T1"));
    assert_eq!(*h.routes.lock().unwrap(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn rejected_sign_in_is_an_authentication_error() {
    let base = spawn_backend().await;
    let h = harness(&base);

    let err = h
        .controller
        .sign_in(&SignInData::new("a@b.com", "wrong"))
        .await
        .unwrap_err();

    assert!(err.is_authentication());
    assert!(err.to_string().contains("Invalid credentials"));
    assert_eq!(h.store.get().unwrap(), None);
    assert_eq!(whoami_header(&h.api).await, Value::Null);
    assert!(h.routes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sign_out_stops_sending_bearer() {
    let base = spawn_backend().await;
    let h = harness(&base);

    h.controller
        .sign_in(&SignInData::new("a@b.com", "x"))
        .await
        .unwrap();
    h.controller.sign_out().await;

    assert_eq!(h.store.get().unwrap(), None);
    assert_eq!(whoami_header(&h.api).await, Value::Null);
    assert_eq!(
        *h.routes.lock().unwrap(),
        vec![Route::Dashboard, Route::SignIn]
    );
}

#[tokio::test]
async fn sign_up_passes_payload_through() {
    let base = spawn_backend().await;
    let h = harness(&base);

    let payload = h
        .controller
        .sign_up(&SignUpData::new("ada", "a@b.com", "pw"))
        .await
        .unwrap();
    assert_eq!(payload, json!({"message": "User created"}));

    let plain = h
        .controller
        .sign_up(&SignUpData::new("ada", "plain@b.com", "pw"))
        .await
        .unwrap();
    assert_eq!(plain, json!("Check your inbox"));

    h.controller.shutdown().await;
    assert_eq!(
        *h.routes.lock().unwrap(),
        vec![Route::SignIn, Route::SignIn]
    );
}

#[tokio::test]
async fn duplicate_sign_up_is_a_registration_error() {
    let base = spawn_backend().await;
    let h = harness(&base);

    let err = h
        .controller
        .sign_up(&SignUpData::new("ada", "taken@b.com", "pw"))
        .await
        .unwrap_err();

    assert!(err.is_registration());
    h.controller.shutdown().await;
    assert!(h.routes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Grab a free port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = harness(&format!("http://{}", addr));

    let err = h
        .controller
        .sign_in(&SignInData::new("a@b.com", "x"))
        .await
        .unwrap_err();
    assert!(err.is_transport());

    let err = h
        .controller
        .sign_up(&SignUpData::new("ada", "a@b.com", "pw"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(h.routes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_json_success_is_an_invalid_response() {
    let base = spawn_backend().await;
    let h = harness(&base);

    let err = h.api.get::<Value>("/broken").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));

    let err = h.api.get::<Value>("/missing").await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn backend_can_be_driven_directly() {
    let base = spawn_backend().await;
    let h = harness(&base);

    let response = h
        .api
        .sign_in(&SignInData::new("a@b.com", "x"))
        .await
        .unwrap();
    assert_eq!(response.token, "T1");
    // The raw backend call does not touch the session
    assert_eq!(h.store.get().unwrap(), None);
}

#[tokio::test]
async fn post_sends_body_and_bearer() {
    let base = spawn_backend().await;
    let h = harness(&base);

    let anonymous: Value = h.api.post("/echo", &json!({"n": 1})).await.unwrap();
    assert_eq!(anonymous, json!({"authorization": null, "body": {"n": 1}}));

    h.controller
        .sign_in(&SignInData::new("a@b.com", "x"))
        .await
        .unwrap();

    let signed_in: Value = h.api.post("/echo", &json!({"n": 2})).await.unwrap();
    assert_eq!(
        signed_in,
        json!({"authorization": "Bearer T1", "body": {"n": 2}})
    );
}
