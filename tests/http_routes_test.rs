// ABOUTME: HTTP-level tests for the assembled router using tower oneshot requests
// ABOUTME: Status codes, error bodies, cache and request-id headers, webhook auth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use vlife_server::{config::ServerConfig, database::SqliteWorkoutStore, routes::build_router};

use common::{create_test_store, manual_clock, seed_library, seed_plan_week, test_resources};

async fn router_with(config: ServerConfig) -> Result<(Router, Arc<SqliteWorkoutStore>)> {
    let store = create_test_store().await?;
    let resources = test_resources(store.clone(), None, manual_clock(), config)?;
    Ok((build_router(&resources), store))
}

async fn send(
    router: &Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_and_ready() -> Result<()> {
    let (router, _) = router_with(ServerConfig::default()).await?;

    let (status, _, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _, body) = send(&router, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    Ok(())
}

#[tokio::test]
async fn test_missing_plan_is_404_with_error_code() -> Result<()> {
    let (router, _) = router_with(ServerConfig::default()).await?;
    let uri = format!("/api/workouts/current-plan?userId={}", Uuid::new_v4());

    let (status, headers, body) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    Ok(())
}

#[tokio::test]
async fn test_missing_user_id_is_400() -> Result<()> {
    let (router, _) = router_with(ServerConfig::default()).await?;

    let (status, _, body) = send(&router, get("/api/workouts/logs")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
    Ok(())
}

#[tokio::test]
async fn test_responses_carry_no_store_and_request_id() -> Result<()> {
    let (router, _) = router_with(ServerConfig::default()).await?;
    let uri = format!("/api/workouts/logs?userId={}", Uuid::new_v4());

    let (status, headers, body) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logs"], json!([]));
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert!(headers.contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn test_session_lifecycle_over_http() -> Result<()> {
    let (router, store) = router_with(ServerConfig::default()).await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 2, library[0].id).await?;
    let start_body = json!({ "userId": user_id, "workoutId": workouts[0].id });

    let (status, _, first) =
        send(&router, post_json("/api/workouts/logs/start", &start_body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["isResume"], false);

    let (status, _, second) =
        send(&router, post_json("/api/workouts/logs/start", &start_body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["isResume"], true);
    assert_eq!(second["log"]["id"], first["log"]["id"]);

    let log_id = first["log"]["id"].as_str().unwrap().to_owned();
    let (status, _, exercise) = send(
        &router,
        post_json(
            &format!("/api/workouts/logs/{log_id}/exercises"),
            &json!({
                "exerciseId": library[0].id,
                "sets": [
                    { "weight": 135.0, "reps": 8, "rpe": 7 },
                    { "weight": 135.0, "reps": 8, "rpe": 8 }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(exercise["totalVolumeLbs"], 2160.0);

    let complete_body = json!({ "logId": log_id, "perceivedDifficulty": 7 });
    let (status, _, done) = send(
        &router,
        post_json("/api/workouts/logs/complete", &complete_body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["log"]["status"], "completed");
    assert_eq!(done["log"]["totalSets"], 2);

    let (status, _, body) = send(
        &router,
        post_json("/api/workouts/logs/complete", &complete_body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "STATE_CONFLICT");

    let (status, _, detail) = send(&router, get(&format!("/api/workouts/logs/{log_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["exercises"].as_array().unwrap().len(), 1);

    let uri = format!("/api/workouts/personal-records?userId={user_id}");
    let (status, _, records) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records["personalRecords"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_invalid_log_id_in_path_is_400() -> Result<()> {
    let (router, _) = router_with(ServerConfig::default()).await?;

    let (status, _, body) = send(&router, get("/api/workouts/logs/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    Ok(())
}

#[tokio::test]
async fn test_webhook_requires_configured_secret() -> Result<()> {
    let mut config = ServerConfig::default();
    config.webhooks.revenuecat_secret = Some("rc-shared-secret".to_owned());
    let (router, _) = router_with(config).await?;
    let payload = json!({
        "event": {
            "type": "INITIAL_PURCHASE",
            "app_user_id": Uuid::new_v4(),
            "product_id": "vlife_monthly"
        }
    });

    let (status, _, body) = send(&router, post_json("/api/webhooks/revenuecat", &payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_INVALID");

    let mut request = post_json("/api/webhooks/revenuecat", &payload);
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer wrong".parse()?);
    let (status, _, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut request = post_json("/api/webhooks/revenuecat", &payload);
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer rc-shared-secret".parse()?);
    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "updated");
    assert_eq!(body["status"], "active");
    Ok(())
}

#[tokio::test]
async fn test_unconfigured_integrations_answer_503() -> Result<()> {
    let (router, _) = router_with(ServerConfig::default()).await?;

    let (status, _, body) = send(&router, get("/api/exercisedb/exercises/0001")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "CONFIG_MISSING");

    let request = post_json(
        "/api/workouts/generate-week",
        &json!({ "userId": Uuid::new_v4() }),
    );
    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "CONFIG_MISSING");
    Ok(())
}

#[tokio::test]
async fn test_cache_revalidate_reports_counts() -> Result<()> {
    let (router, _) = router_with(ServerConfig::default()).await?;

    let (status, _, body) = send(
        &router,
        Request::builder()
            .method(Method::POST)
            .uri("/api/cache/revalidate")
            .body(Body::empty())?,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revalidated"], true);
    assert_eq!(body["removed"], 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_and_query_use_error_envelope() -> Result<()> {
    let (router, store) = router_with(ServerConfig::default()).await?;
    let library = seed_library(store.as_ref(), 5).await?;
    let user_id = Uuid::new_v4();
    let (_, workouts) = seed_plan_week(store.as_ref(), user_id, 1, 1, library[0].id).await?;
    let start_body = json!({ "userId": user_id, "workoutId": workouts[0].id });
    let (_, _, started) = send(&router, post_json("/api/workouts/logs/start", &start_body)).await;
    let log_id = started["log"]["id"].as_str().unwrap().to_owned();
    let uri = format!("/api/workouts/logs/{log_id}/exercises");

    let (status, headers, body) = send(
        &router,
        post_json(&uri, &json!({ "exerciseId": library[0].id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert!(body["error"]["details"]["reason"]
        .as_str()
        .unwrap()
        .contains("sets"));

    let oversized = json!({
        "exerciseId": library[0].id,
        "sets": [{ "weight": 1.0, "reps": 3_000_000_000_u32 }]
    });
    let (status, _, body) = send(&router, post_json(&uri, &oversized)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALUE_OUT_OF_RANGE");

    let (status, _, body) = send(&router, get("/api/workouts/logs?userId=not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    Ok(())
}

#[tokio::test]
async fn test_webhook_checks_secret_before_parsing_body() -> Result<()> {
    let mut config = ServerConfig::default();
    config.webhooks.revenuecat_secret = Some("rc-shared-secret".to_owned());
    let (router, _) = router_with(config).await?;
    let garbage = || {
        Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/revenuecat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
    };

    let (status, _, body) = send(&router, garbage()?).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_INVALID");

    let mut request = garbage()?;
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer rc-shared-secret".parse()?);
    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    Ok(())
}
