use axum::http::StatusCode;
use cueclub::api;
use cueclub::config::{Config, ShiftPolicy};
use cueclub::db::init_db;
use cueclub::domain::{Money, PermissionOverrides, Role, StaffId};
use cueclub::orchestration::RecordingNotifier;
use cueclub::Repository;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    admin: StaffId,
    cashier: StaffId,
    _temp: TempDir,
}

async fn setup_test_app(shift_policy: ShiftPolicy) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        default_rate_per_minute: Money::ZERO,
        shift_policy,
        score_rules: Default::default(),
        bootstrap_admin: "admin".to_string(),
    };

    let none = PermissionOverrides::new();
    let admin = repo.insert_staff("admin", Role::Admin, &none).await.unwrap();
    let cashier = repo.insert_staff("caja", Role::Cashier, &none).await.unwrap();

    let state = api::AppState::new(repo, config, Arc::new(RecordingNotifier::new()));
    TestApp {
        app: api::create_router(state),
        admin: admin.id,
        cashier: cashier.id,
        _temp: temp_dir,
    }
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    staff: StaffId,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("x-staff-id", staff.to_string())
        .header("content-type", "application/json");
    let req = match body {
        Some(body) => builder.body(axum::body::Body::from(body.to_string())),
        None => builder.body(axum::body::Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn cash_sale(method: &str, amount: i64) -> Value {
    json!({
        "method": method,
        "items": [{"name": "Consumo", "quantity": 1, "unitPrice": amount}]
    })
}

#[tokio::test]
async fn test_shift_summary_buckets() {
    let test_app = setup_test_app(ShiftPolicy::Required).await;
    let (status, shift) = send(
        &test_app.app,
        "POST",
        "/v1/shifts",
        test_app.cashier,
        Some(json!({"openingAmount": 20000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let shift_id = shift["id"].as_i64().unwrap();

    for (method, amount) in [("CASH", 1000), ("CARD", 500)] {
        let (status, _) = send(
            &test_app.app,
            "POST",
            "/v1/sales",
            test_app.cashier,
            Some(cash_sale(method, amount)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) = send(
        &test_app.app,
        "GET",
        &format!("/v1/shifts/{}/summary", shift_id),
        test_app.admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"].as_f64(), Some(1500.0));
    assert_eq!(summary["cash"].as_f64(), Some(1000.0));
    assert_eq!(summary["card"].as_f64(), Some(500.0));
    assert_eq!(summary["transfer"].as_f64(), Some(0.0));
    assert_eq!(summary["byType"]["CONSUMPTION"].as_f64(), Some(1500.0));
    assert_eq!(summary["salesCount"], 2);

    let (status, report) = send(
        &test_app.app,
        "POST",
        &format!("/v1/shifts/{}/close", shift_id),
        test_app.cashier,
        Some(json!({"closingAmount": 21000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", report);
    assert_eq!(report["shift"]["status"], "CLOSED");
    assert_eq!(report["shift"]["expectedCash"].as_f64(), Some(21000.0));
    assert_eq!(report["shift"]["cashVariance"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_only_one_open_shift() {
    let test_app = setup_test_app(ShiftPolicy::Required).await;
    let body = Some(json!({"openingAmount": 0}));

    let (first, _) = send(&test_app.app, "POST", "/v1/shifts", test_app.admin, body.clone()).await;
    let (second, _) = send(&test_app.app, "POST", "/v1/shifts", test_app.admin, body).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);

    let (status, active) =
        send(&test_app.app, "GET", "/v1/shifts/active", test_app.admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(active["shift"]["id"].is_i64());
}

#[tokio::test]
async fn test_summary_of_missing_shift_is_404() {
    let test_app = setup_test_app(ShiftPolicy::Required).await;
    let (status, _) =
        send(&test_app.app, "GET", "/v1/shifts/42/summary", test_app.admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_backfill_attaches_unshifted_sales() {
    let test_app = setup_test_app(ShiftPolicy::Optional).await;
    let (_, shift) = send(
        &test_app.app,
        "POST",
        "/v1/shifts",
        test_app.admin,
        Some(json!({"openingAmount": 0})),
    )
    .await;
    let shift_id = shift["id"].as_i64().unwrap();

    let (status, _) = send(
        &test_app.app,
        "POST",
        &format!("/v1/shifts/{}/backfill", shift_id),
        test_app.cashier,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &test_app.app,
        "POST",
        &format!("/v1/shifts/{}/backfill", shift_id),
        test_app.admin,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attached"], 0);
    assert_eq!(body["shiftId"], shift_id);
}
