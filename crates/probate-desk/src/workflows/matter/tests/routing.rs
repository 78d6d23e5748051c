use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::matter::domain::{MatterAction, PortalStatus};
use crate::workflows::matter::status::apply_action;
use crate::workflows::matter::{MatterRepository, USER_ID_HEADER, USER_ROLE_HEADER};

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header(USER_ID_HEADER, "client-1")
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, role: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(USER_ID_HEADER, "user-1")
        .header(USER_ROLE_HEADER, role)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn advance_to_waiting(repository: &MemoryRepository, mailed_days_ago: i64) {
    let mut matter = repository.stored(MATTER);
    let mailed_at = Utc::now() - Duration::days(mailed_days_ago);
    for action in [
        MatterAction::CompleteIntake,
        MatterAction::ConfirmWillSearchMailed,
        MatterAction::ConfirmWillSearchResults,
        MatterAction::ConfirmNoticesMailed,
    ] {
        apply_action(&mut matter, action, mailed_at).expect("sequence applies");
    }
    repository.replace(matter);
}

#[tokio::test]
async fn requests_without_identity_are_rejected() {
    let router = build_router(seeded_repository());
    let response = router
        .oneshot(
            Request::get(format!("/api/v1/matters/{MATTER}/timeline"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn timeline_route_reports_status_and_next_action() {
    let router = build_router(seeded_repository());
    let response = router
        .oneshot(get(&format!("/api/v1/matters/{MATTER}/timeline")))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], json!("intake"));
    assert_eq!(body["next_action"], json!("complete_intake"));
    assert_eq!(body["can_file"], json!(false));
}

#[tokio::test]
async fn unknown_matter_is_not_found() {
    let router = build_router(seeded_repository());
    let response = router
        .oneshot(get("/api/v1/matters/nope/timeline"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_sequence_action_conflicts() {
    let router = build_router(seeded_repository());
    let response = router
        .oneshot(post_json(
            &format!("/api/v1/matters/{MATTER}/actions"),
            "client",
            json!({ "action": "confirm_notices_mailed" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn filing_during_waiting_period_returns_countdown() {
    let repository = seeded_repository();
    advance_to_waiting(&repository, 5);
    let router = build_router(repository.clone());

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/matters/{MATTER}/actions"),
            "client",
            json!({ "action": "confirm_probate_filed" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["days_remaining"], json!(16));
    assert_eq!(
        repository.fetch(&crate::workflows::matter::MatterId(MATTER.to_string()))
            .expect("fetch")
            .expect("stored")
            .portal_status,
        PortalStatus::NoticesWaiting21Days
    );
}

#[tokio::test]
async fn corrections_are_admin_only() {
    let repository = seeded_repository();
    advance_to_waiting(&repository, 1);

    let forbidden = build_router(repository.clone())
        .oneshot(post_json(
            &format!("/api/v1/matters/{MATTER}/corrections"),
            "staff",
            json!({ "milestone": "notices_mailed", "value": null }),
        ))
        .await
        .expect("router responds");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let corrected = build_router(repository.clone())
        .oneshot(post_json(
            &format!("/api/v1/matters/{MATTER}/corrections"),
            "admin",
            json!({ "milestone": "notices_mailed", "value": null }),
        ))
        .await
        .expect("router responds");
    assert_eq!(corrected.status(), StatusCode::OK);
    let body = read_json_body(corrected).await;
    assert_eq!(body["status"], json!("notices_ready"));
}

#[tokio::test]
async fn estate_route_returns_normalized_data_with_validation() {
    let router = build_router(seeded_repository());
    let response = router
        .oneshot(get(&format!("/api/v1/matters/{MATTER}/estate")))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["validation"]["valid"], json!(true));
    assert_eq!(body["estate"]["registry"], json!("Kelowna"));
}

#[tokio::test]
async fn document_route_streams_generated_pdf() {
    let router = build_router(seeded_repository());
    let response = router
        .oneshot(
            Request::post(format!("/api/v1/matters/{MATTER}/documents/p1"))
                .header(USER_ID_HEADER, "client-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"PP-100-p1.pdf\""
    );
}

#[tokio::test]
async fn unavailable_form_reports_not_available() {
    let router = build_router(seeded_repository());
    let response = router
        .oneshot(
            Request::post(format!("/api/v1/matters/{MATTER}/documents/p11"))
                .header(USER_ID_HEADER, "client-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], json!("not_available"));
}

#[tokio::test]
async fn incomplete_estate_returns_itemized_errors() {
    let repository = seeded_repository();
    let mut matter = repository.stored(MATTER);
    matter.intake.deceased.last_name = None;
    repository.replace(matter);

    let response = build_router(repository)
        .oneshot(
            Request::post(format!("/api/v1/matters/{MATTER}/documents/p3"))
                .header(USER_ID_HEADER, "client-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|issue| issue["field"].as_str())
        .collect();
    assert!(fields.contains(&"deceased.lastName"));
}
