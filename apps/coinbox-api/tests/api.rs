//! Router-level tests: real routes, in-memory SQLite, pinned clock.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use coinbox_api::auth::hash_password;
use coinbox_api::{router, ApiConfig, AppState};
use coinbox_core::FixedClock;
use coinbox_db::Database;

const EMAIL: &str = "admin@example.com";
const PASSWORD: &str = "admin123";

struct TestApp {
    app: Router,
    token: String,
    user_id: i64,
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

async fn setup() -> TestApp {
    let db = Database::in_memory().await.unwrap();
    let hash = hash_password(PASSWORD).unwrap();
    let user = db.users().insert(EMAIL, Some("Admin"), &hash).await.unwrap();

    let state = Arc::new(AppState::with_clock(
        db,
        &ApiConfig::default(),
        Arc::new(FixedClock(today())),
    ));
    let token = state.jwt.generate_token(user.id, EMAIL).unwrap();

    TestApp {
        app: router(state),
        token,
        user_id: user.id,
    }
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send_raw(
            &self.app,
            method,
            uri,
            Some(&self.token),
            body.map(|b| b.to_string()),
        )
        .await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn create(&self, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, "/api/collections", Some(body)).await
    }
}

fn collection(date: &str, round: i64, location: &str) -> Value {
    json!({
        "collectionDate": date,
        "roundNumber": round,
        "weekNumber": 22,
        "machineLocation": location,
        "machineCoins10baht": 400,
        "exchangeNote1000baht": 12,
        "postcardsRemaining": 50,
        "costPerPostcard": 13.766,
    })
}

fn approx(value: &Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}

// =============================================================================
// Public routes
// =============================================================================

#[tokio::test]
async fn test_health() {
    let t = setup().await;
    let (status, body) = send_raw(&t.app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_login() {
    let t = setup().await;

    let (status, bytes) = send_raw(
        &t.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": EMAIL, "password": PASSWORD }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["user"]["email"], EMAIL);
    assert!(body["user"].get("passwordHash").is_none());

    // The issued token opens protected routes
    let token = body["token"].as_str().unwrap();
    let (status, _) = send_raw(&t.app, Method::GET, "/api/week/current", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let t = setup().await;

    for body in [
        json!({ "email": EMAIL, "password": "wrong" }),
        json!({ "email": "nobody@example.com", "password": PASSWORD }),
    ] {
        let (status, bytes) =
            send_raw(&t.app, Method::POST, "/api/auth/login", None, Some(body.to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Unauthorized");
    }

    let (status, _) = send_raw(
        &t.app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": EMAIL }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let t = setup().await;

    let (status, bytes) = send_raw(&t.app, Method::GET, "/api/collections", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = send_raw(
        &t.app,
        Method::GET,
        "/api/collections",
        Some("not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_current_week_uses_clock() {
    let t = setup().await;
    let (status, body) = t.call(Method::GET, "/api/week/current", None).await;

    assert_eq!(status, StatusCode::OK);
    // 2024-06-15 is day 167 of a leap year: floor(166 / 7) + 1
    assert_eq!(body, json!({ "weekNumber": 24 }));
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_returns_record_with_metrics() {
    let t = setup().await;
    let (status, body) = t.create(collection("2024-06-01", 1, "Site A")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["createdBy"], t.user_id);
    assert_eq!(
        body["user"],
        json!({ "id": t.user_id, "name": "Admin", "email": EMAIL })
    );
    assert_eq!(body["collectionDate"], "2024-06-01");
    assert_eq!(body["exchangeCoins1baht"], 0);
    assert_eq!(body["machineTotal"], 4000);
    assert_eq!(body["exchangeTotal"], 12000);
    assert_eq!(body["postcardsSold"], 100);
    assert_eq!(body["revenue"], 4000);
    assert!(approx(&body["cost"], 1376.6));
    assert!(approx(&body["profit"], 2623.4));
    assert_eq!(body["exchangeBalanced"], true);
}

#[tokio::test]
async fn test_create_defaults_cost() {
    let t = setup().await;
    let mut body = collection("2024-06-01", 1, "Site A");
    body.as_object_mut().unwrap().remove("costPerPostcard");

    let (status, body) = t.create(body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(approx(&body["costPerPostcard"], 13.766));
}

#[tokio::test]
async fn test_create_duplicate_identity() {
    let t = setup().await;

    let (status, _) = t.create(collection("2024-06-01", 1, "Site A")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t.create(collection("2024-06-01", 1, "Site A")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "A collection already exists for this date, round, and location"
    );

    // Second round the same day is a different collection
    let (status, _) = t.create(collection("2024-06-01", 2, "Site A")).await;
    assert_eq!(status, StatusCode::CREATED);

    // Location identity is case-sensitive
    let (status, _) = t.create(collection("2024-06-01", 1, "site a")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_validation_failures() {
    let t = setup().await;

    let (status, body) = t.create(collection("2024-06-01", 3, "Site A")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"]["roundNumber"][0], "Round number must be 1 or 2");

    let (status, body) = t.create(collection("2024-06-16", 1, "Site A")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"]["collectionDate"][0],
        "Collection date cannot be in the future"
    );

    let mut odd_coins = collection("2024-06-01", 1, "Site A");
    odd_coins["machineCoins10baht"] = json!(5);
    let (status, body) = t.create(odd_coins).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["machineCoins10baht"][0]
        .as_str()
        .unwrap()
        .contains("divisible by 4"));

    // Shape errors are reported alone; the coin rule isn't reached
    let mut shape = collection("2024-06-01", 1, "Site A");
    shape["machineCoins10baht"] = json!(5);
    shape.as_object_mut().unwrap().remove("weekNumber");
    let (status, body) = t.create(shape).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].get("weekNumber").is_some());
    assert!(body["details"].get("machineCoins10baht").is_none());
}

#[tokio::test]
async fn test_create_today_accepted() {
    let t = setup().await;
    let (status, _) = t.create(collection("2024-06-15", 1, "Site A")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_malformed_json() {
    let t = setup().await;
    let (status, bytes) = send_raw(
        &t.app,
        Method::POST,
        "/api/collections",
        Some(&t.token),
        Some("{ not json".to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid JSON body");
}

// =============================================================================
// Read / Update / Delete
// =============================================================================

#[tokio::test]
async fn test_get_by_id() {
    let t = setup().await;
    let (_, created) = t.create(collection("2024-06-01", 1, "Site A")).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = t.call(Method::GET, &format!("/api/collections/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["machineLocation"], "Site A");
    assert_eq!(body["postcardsSold"], 100);
    assert_eq!(body["user"]["id"], t.user_id);
    assert_eq!(body["user"]["name"], "Admin");
    assert_eq!(body["user"]["email"], EMAIL);

    let (status, body) = t.call(Method::GET, "/api/collections/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Collection not found");

    let (status, body) = t.call(Method::GET, "/api/collections/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid collection ID");
}

#[tokio::test]
async fn test_partial_update() {
    let t = setup().await;
    let (_, created) = t.create(collection("2024-06-01", 1, "Site A")).await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/collections/{id}");

    let (status, body) = t
        .call(
            Method::PUT,
            &uri,
            Some(json!({ "notes": "jammed slot", "machineCoins10baht": 800 })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notes"], "jammed slot");
    assert_eq!(body["machineLocation"], "Site A");
    assert_eq!(body["exchangeNote1000baht"], 12);
    assert_eq!(body["postcardsSold"], 200);
    assert_eq!(body["revenue"], 8000);

    // Resubmitting its own identity is not a duplicate
    let (status, _) = t
        .call(
            Method::PUT,
            &uri,
            Some(json!({ "collectionDate": "2024-06-01", "roundNumber": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_rejections() {
    let t = setup().await;
    let (_, first) = t.create(collection("2024-06-01", 1, "Site A")).await;
    let (_, second) = t.create(collection("2024-06-01", 2, "Site A")).await;
    let second_uri = format!("/api/collections/{}", second["id"]);

    // Moving round 2 onto round 1's identity
    let (status, _) = t
        .call(Method::PUT, &second_uri, Some(json!({ "roundNumber": 1 })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .call(Method::PUT, &second_uri, Some(json!({ "machineCoins10baht": 6 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].get("machineCoins10baht").is_some());

    let (status, _) = t
        .call(Method::PUT, "/api/collections/999", Some(json!({ "notes": "x" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // An unknown id wins over an invalid body
    let (status, body) = t
        .call(
            Method::PUT,
            "/api/collections/999",
            Some(json!({ "machineCoins10baht": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Collection not found");

    // Nothing changed on the first record
    let (_, unchanged) = t
        .call(Method::GET, &format!("/api/collections/{}", first["id"]), None)
        .await;
    assert_eq!(unchanged["roundNumber"], 1);
}

#[tokio::test]
async fn test_update_rejects_null_notes() {
    let t = setup().await;
    let mut body = collection("2024-06-01", 1, "Site A");
    body["notes"] = json!("coin jam");
    let (_, created) = t.create(body).await;
    let uri = format!("/api/collections/{}", created["id"]);

    let (status, body) = t.call(Method::PUT, &uri, Some(json!({ "notes": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"].get("notes").is_some());

    let (_, stored) = t.call(Method::GET, &uri, None).await;
    assert_eq!(stored["notes"], "coin jam");

    let mut body = collection("2024-06-01", 2, "Site A");
    body["notes"] = Value::Null;
    let (status, body) = t.create(body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].get("notes").is_some());
}

#[tokio::test]
async fn test_delete() {
    let t = setup().await;
    let (_, created) = t.create(collection("2024-06-01", 1, "Site A")).await;
    let uri = format!("/api/collections/{}", created["id"]);

    let (status, body) = t.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Collection deleted successfully");

    let (status, _) = t.call(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_list_paging_and_order() {
    let t = setup().await;
    t.create(collection("2024-06-01", 1, "Siam Paragon")).await;
    t.create(collection("2024-06-03", 1, "Siam Paragon")).await;
    t.create(collection("2024-06-02", 1, "Chatuchak Market")).await;

    let (status, body) = t.call(Method::GET, "/api/collections?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["collections"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["collectionDate"], "2024-06-03");
    assert_eq!(rows[1]["collectionDate"], "2024-06-02");
    assert_eq!(rows[0]["postcardsSold"], 100);
    for row in rows {
        assert_eq!(
            row["user"],
            json!({ "id": t.user_id, "name": "Admin", "email": EMAIL })
        );
    }
    assert_eq!(
        body["pagination"],
        json!({ "page": 1, "limit": 2, "total": 3, "totalPages": 2 })
    );

    let (_, page_two) = t
        .call(Method::GET, "/api/collections?limit=2&page=2", None)
        .await;
    assert_eq!(page_two["collections"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_filters() {
    let t = setup().await;
    t.create(collection("2024-06-01", 1, "Siam Paragon")).await;
    t.create(collection("2024-06-03", 1, "Siam Paragon")).await;
    t.create(collection("2024-06-02", 1, "Chatuchak Market")).await;

    let (_, body) = t
        .call(Method::GET, "/api/collections?location=PARAGON", None)
        .await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = t
        .call(
            Method::GET,
            "/api/collections?startDate=2024-06-02&endDate=2024-06-02",
            None,
        )
        .await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["collections"][0]["machineLocation"], "Chatuchak Market");

    // Empty values count as absent
    let (status, body) = t
        .call(Method::GET, "/api/collections?location=&week=", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_list_invalid_query() {
    let t = setup().await;

    let (status, body) = t.call(Method::GET, "/api/collections?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid query parameters");
    assert!(body["details"].get("page").is_some());

    let (status, body) = t.call(Method::GET, "/api/collections?limit=101", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].get("limit").is_some());

    let (status, _) = t
        .call(Method::GET, "/api/collections?startDate=yesterday", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
