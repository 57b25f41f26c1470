use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::assessment::domain::PriorityDomain;
use crate::workflows::assessment::router::assessment_router;
use crate::workflows::assessment::service::AssessmentService;
use crate::workflows::assessment::views::DisplayPolicy;

fn build_router() -> (
    Router,
    Arc<AssessmentService<MemoryRepository, MemoryNotices>>,
) {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    let router = assessment_router(service.clone(), DisplayPolicy::default());
    (router, service)
}

fn post_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn put_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::put(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn intake_route_accepts_submissions() {
    let (router, _) = build_router();
    let payload = serde_json::to_value(submission(PriorityDomain::Health)).expect("serializes");

    let response = router
        .oneshot(post_json("/api/v1/assessments", payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "awaiting-payment");
    assert!(body["share_token"].as_str().is_some());
}

#[tokio::test]
async fn intake_route_rejects_invalid_submissions() {
    let (router, _) = build_router();
    let mut payload = serde_json::to_value(submission(PriorityDomain::Health)).expect("serializes");
    payload["amount_cents"] = json!(0);

    let response = router
        .oneshot(post_json("/api/v1/assessments", payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_share_tokens_return_not_found() {
    let (router, _) = build_router();

    let response = router
        .oneshot(
            Request::get("/api/v1/assessments/does-not-exist")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn illegal_lifecycle_events_map_to_conflict() {
    let (router, service) = build_router();
    let record = service
        .submit_intake(submission(PriorityDomain::Health))
        .expect("intake accepted");
    let token = record.request.share_token.0;

    let payload = json!({
        "event": { "kind": "start-review" },
        "actor": { "role": "reviewer", "id": "reviewer-ana" },
    });
    let response = router
        .oneshot(post_json(
            &format!("/api/v1/assessments/{token}/events"),
            payload,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error text")
        .contains("awaiting-payment"));
}

#[tokio::test]
async fn completing_without_a_result_maps_to_precondition_failed() {
    let (router, service) = build_router();
    let id = in_review_request(&service, PriorityDomain::Health);
    let token = service.get(id).expect("record exists").request.share_token.0;

    let payload = json!({
        "event": { "kind": "complete" },
        "actor": { "role": "reviewer", "id": "reviewer-ana" },
    });
    let response = router
        .oneshot(post_json(
            &format!("/api/v1/assessments/{token}/events"),
            payload,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn point_writes_report_their_clamp_over_http() {
    let (router, service) = build_router();
    let id = in_review_request(&service, PriorityDomain::Health);
    let token = service.get(id).expect("record exists").request.share_token.0;

    let open_payload = json!({
        "reviewer": "reviewer-ana",
        "initial": [
            { "pattern": "CRIATIVO", "region": "head", "value": 6 },
            { "pattern": "CONECTIVO", "region": "head", "value": 3 },
        ],
    });
    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/assessments/{token}/matrix"),
            open_payload,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let point_payload = json!({
        "reviewer": "reviewer-ana",
        "pattern": "FORTE",
        "region": "head",
        "value": 5,
    });
    let response = router
        .oneshot(put_json(
            &format!("/api/v1/assessments/{token}/matrix/points"),
            point_payload,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["requested"], 5);
    assert_eq!(body["applied"], 1);
    assert_eq!(body["clamped"], true);
}

#[tokio::test]
async fn out_of_range_points_map_to_unprocessable() {
    let (router, service) = build_router();
    let id = in_review_request(&service, PriorityDomain::Health);
    let token = service.get(id).expect("record exists").request.share_token.0;

    service
        .open_scoring(id, reviewer(), &[])
        .expect("scoring opened");

    let payload = json!({
        "reviewer": "reviewer-ana",
        "pattern": "FORTE",
        "region": "head",
        "value": 11,
    });
    let response = router
        .oneshot(put_json(
            &format!("/api/v1/assessments/{token}/matrix/points"),
            payload,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn recompute_route_returns_the_derived_view() {
    let (router, service) = build_router();
    let id = in_review_request(&service, PriorityDomain::Health);
    let token = service.get(id).expect("record exists").request.share_token.0;
    service
        .open_scoring(id, reviewer(), &tie_break_points())
        .expect("scoring opened");

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/assessments/{token}/matrix/recompute"),
            json!({}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["grand_total"], 50);
    assert_eq!(body["primary"], "CRIATIVO");
    assert_eq!(body["secondary"], "CONECTIVO");
    assert_eq!(body["tertiary"], "FORTE");
}

#[tokio::test]
async fn narrative_views_flag_slots_below_the_display_floor() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    // Floor above the 20% secondary/tertiary shares but below the primary.
    let router = assessment_router(service.clone(), DisplayPolicy { floor_pct: 25 });

    let id = in_review_request(&service, PriorityDomain::Professional);
    let token = service.get(id).expect("record exists").request.share_token.0;
    service
        .open_scoring(id, reviewer(), &tie_break_points())
        .expect("scoring opened");
    service.recompute_matrix(id).expect("recompute runs");

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/assessments/{token}/narrative"),
            json!({ "reviewer": "reviewer-ana" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let slots = body["slots"].as_array().expect("slots array");
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0]["below_display_floor"], false);
    assert_eq!(slots[1]["below_display_floor"], true);
    assert_eq!(slots[2]["below_display_floor"], true);
    // Flagged slots still contribute their fragments to the composed text;
    // the floor is advice to the renderer, not a composition cutoff.
    assert_eq!(
        body["pain_state"]
            .as_str()
            .expect("pain text")
            .matches("\n\n")
            .count(),
        2
    );
}

#[tokio::test]
async fn visibility_route_enforces_the_result_precondition() {
    let (router, service) = build_router();
    let id = in_review_request(&service, PriorityDomain::Health);
    let token = service.get(id).expect("record exists").request.share_token.0;

    let payload = json!({
        "visible": true,
        "actor": { "role": "owner", "id": "subject-17" },
    });
    let response = router
        .oneshot(
            Request::patch(format!("/api/v1/assessments/{token}/result/visibility"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
}
