#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use resource_payroll::{
    Client, PayrollCalculator, PayrollConfig, ProcessingRate, RateTable, ResourcePayout,
    ResourceProfile, http_api,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let rates = RateTable::new(vec![ProcessingRate::new(
        Client::Verisma,
        "LOC-1",
        Decimal::new(110, 2),
    )])
    .unwrap();
    let state = http_api::AppState::new(PayrollCalculator::new(PayrollConfig::with_rates(rates)))
        .with_profiles(vec![ResourceProfile::new("R-1", "Dana Reyes")]);
    http_api::router(state)
}

fn request_body(resource_id: &str, complete: i64) -> Value {
    json!({
        "resource_id": resource_id,
        "period": { "year": 2025, "month": 3 },
        "complete_logging": { "verisma": complete },
        "days": [
            {
                "date": "2025-03-03",
                "logging": { "verisma": 100, "mro": 44 },
                "hours": "8",
                "processing": [
                    { "client": "verisma", "location_id": "LOC-1", "location_name": "North", "cases": 10 }
                ]
            },
            { "date": "2025-03-04", "hours": "0" }
        ]
    })
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn payout_lifecycle_via_http_api() {
    let app = new_router();

    let (status, bytes) = send(&app, "POST", "/payouts/compute", Some(request_body("R-1", 10))).await;
    assert_eq!(status, StatusCode::CREATED);
    let payout: ResourcePayout = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(payout.total_logging_cases, 144);
    assert_eq!(payout.avg_cases_per_hour, Decimal::from(18));
    assert_eq!(payout.verisma_processing.amount, Decimal::new(1100, 2));
    assert_eq!(payout.display_name(), "Dana Reyes");
    assert!(payout.calculated_at.is_some());

    let (status, bytes) = send(&app, "GET", "/payouts/R-1/2025/3", None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: ResourcePayout = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fetched, payout);

    let (status, bytes) = send(&app, "GET", "/payouts?year=2025&month=3", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<ResourcePayout> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listed.len(), 1);

    let (status, _) = send(
        &app,
        "PUT",
        "/payouts/R-1/2025/3/status",
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, bytes) = send(&app, "POST", "/payouts/compute", Some(request_body("R-1", 0))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["error"], "locked");

    let (status, bytes) = send(&app, "GET", "/payouts/export?year=2025&month=3", None).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.lines().nth(1).unwrap().starts_with("R-1,Dana Reyes,1,"));
    assert!(csv.lines().nth(2).unwrap().starts_with("TOTAL,"));
}

#[tokio::test]
async fn calculation_errors_map_to_unprocessable() {
    let app = new_router();

    let (status, bytes) = send(&app, "POST", "/payouts/compute", Some(request_body("R-2", 500))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["error"], "invariant_violation");

    let mut unrated = request_body("R-2", 0);
    unrated["days"][0]["processing"][0]["location_id"] = json!("LOC-404");
    let (status, bytes) = send(&app, "POST", "/payouts/compute", Some(unrated)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["error"], "missing_rate");

    let mut empty = request_body("R-2", 0);
    empty["days"] = json!([]);
    let (status, bytes) = send(&app, "POST", "/payouts/compute", Some(empty)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["error"], "empty_period");
}

#[tokio::test]
async fn lookups_and_transitions_are_checked() {
    let app = new_router();

    let (status, bytes) = send(&app, "GET", "/payouts/R-9/2025/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["error"], "not_found");

    let (status, _) = send(&app, "GET", "/payouts?year=2025&month=13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, "POST", "/payouts/compute", Some(request_body("R-3", 0))).await;
    let (status, bytes) = send(
        &app,
        "PUT",
        "/payouts/R-3/2025/3/status",
        Some(json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let error: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(error["error"], "invalid_transition");

    let (status, _) = send(
        &app,
        "PUT",
        "/payouts/R-3/2025/3/status",
        Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_slab_table_are_exposed() {
    let app = new_router();

    let (status, bytes) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["status"], "ok");

    let (status, bytes) = send(&app, "GET", "/config/slabs", None).await;
    assert_eq!(status, StatusCode::OK);
    let slabs: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(slabs.as_array().unwrap().len(), 4);
    assert_eq!(slabs[3]["max"], Value::Null);
}
