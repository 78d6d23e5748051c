use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use probate_desk::integrations::{
    enforce_rate_limit, retell_webhook_router, CallEventSink, ExtractionOutcome, RateLimiter,
    SignatureVerifier, WillExtractor,
};
use probate_desk::workflows::fees::{FeeBreakdown, FeeSchedule};
use probate_desk::workflows::matter::{
    matter_router, Actor, MatterRepository, MatterState, ReminderScheduler,
};
use probate_desk::workflows::qualification::{
    evaluate_qualification, CollectedData, QualificationFlags, QualificationResult,
    QualificationStatus, TierPricing, TierRecommendation,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the HTTP surface needs, built once at startup.
pub(crate) struct ApiDependencies<R, S> {
    pub(crate) matters: MatterState<R, S>,
    pub(crate) fees: Arc<FeeSchedule>,
    pub(crate) pricing: Arc<TierPricing>,
    pub(crate) limiter: Arc<dyn RateLimiter>,
    pub(crate) extractor: Arc<WillExtractor>,
    /// `None` when no vendor key is configured; webhooks are then refused.
    pub(crate) verifier: Option<Arc<SignatureVerifier>>,
    pub(crate) call_events: Arc<dyn CallEventSink>,
}

#[derive(Clone)]
struct PublicState {
    fees: Arc<FeeSchedule>,
    pricing: Arc<TierPricing>,
}

pub(crate) fn with_api_routes<R, S>(deps: ApiDependencies<R, S>) -> Router
where
    R: MatterRepository + 'static,
    S: ReminderScheduler + 'static,
{
    let public = Router::new()
        .route("/api/v1/fees", post(fee_endpoint))
        .route("/api/v1/qualification", post(qualification_endpoint))
        .route_layer(middleware::from_fn_with_state(
            deps.limiter,
            enforce_rate_limit,
        ))
        .with_state(PublicState {
            fees: deps.fees,
            pricing: deps.pricing,
        });

    let wills = Router::new()
        .route("/api/v1/wills/extract", post(extract_will_endpoint))
        .with_state(deps.extractor);

    let webhooks = match deps.verifier {
        Some(verifier) => retell_webhook_router(verifier, deps.call_events),
        None => Router::new().route("/api/v1/webhooks/retell", post(unconfigured_webhook)),
    };

    matter_router(deps.matters)
        .merge(public)
        .merge(wills)
        .merge(webhooks)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeeRequest {
    pub(crate) estate_value: Decimal,
}

async fn fee_endpoint(
    State(state): State<PublicState>,
    Json(payload): Json<FeeRequest>,
) -> Result<Json<FeeBreakdown>, Response> {
    if payload.estate_value.is_sign_negative() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "estate_value must not be negative" })),
        )
            .into_response());
    }
    Ok(Json(state.fees.calculate(payload.estate_value)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct QualificationRequest {
    #[serde(default)]
    pub(crate) flags: QualificationFlags,
    #[serde(default)]
    pub(crate) collected: Option<CollectedData>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QualificationResponse {
    pub(crate) qualification: QualificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tier: Option<TierRecommendation>,
}

async fn qualification_endpoint(
    State(state): State<PublicState>,
    Json(payload): Json<QualificationRequest>,
) -> Json<QualificationResponse> {
    let qualification = evaluate_qualification(&payload.flags);
    let tier = match (qualification.result, payload.collected) {
        (QualificationStatus::NotFit, _) | (_, None) => None,
        (_, Some(collected)) => Some(state.pricing.recommend(&collected, &payload.flags)),
    };

    info!(
        result = ?qualification.result,
        reasons = qualification.reasons.len(),
        tier = tier.as_ref().map(|recommendation| recommendation.tier.label()),
        "qualification evaluated"
    );

    Json(QualificationResponse {
        qualification,
        tier,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct WillExtractRequest {
    pub(crate) text: String,
}

async fn extract_will_endpoint(
    actor: Actor,
    State(extractor): State<Arc<WillExtractor>>,
    Json(payload): Json<WillExtractRequest>,
) -> Result<Json<ExtractionOutcome>, Response> {
    if payload.text.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "text must not be empty" })),
        )
            .into_response());
    }

    let outcome = extractor.extract(&payload.text).await;
    info!(
        user_id = %actor.user_id,
        fallback = outcome.fallback_reason.is_some(),
        "will text extracted"
    );
    Ok(Json(outcome))
}

async fn unconfigured_webhook() -> Response {
    warn!("webhook received but no signing key is configured");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid signature" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        DisabledChat, InMemoryCallEventSink, InMemoryMatterRepository, InMemoryReminderScheduler,
    };
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use probate_desk::integrations::{SlidingWindowLimiter, SIGNATURE_HEADER};
    use probate_desk::workflows::documents::{
        DocumentGenerator, DocumentService, HtmlRenderer, RenderError,
    };
    use probate_desk::workflows::matter::{MatterService, USER_ID_HEADER};
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tower::ServiceExt;

    struct NoBrowser;

    impl HtmlRenderer for NoBrowser {
        fn render_pdf(&self, _html: &str) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::MissingOutput)
        }
    }

    struct Harness {
        router: Router,
        call_events: InMemoryCallEventSink,
    }

    fn harness(max_requests: u32, verifier: Option<Arc<SignatureVerifier>>) -> Harness {
        let repository = Arc::new(InMemoryMatterRepository::default());
        let reminders = Arc::new(InMemoryReminderScheduler::default());
        let generator = DocumentGenerator::new(FeeSchedule::default(), Arc::new(NoBrowser));
        let call_events = InMemoryCallEventSink::default();

        let deps = ApiDependencies {
            matters: MatterState {
                matters: Arc::new(MatterService::new(repository.clone(), reminders)),
                documents: Arc::new(DocumentService::new(repository, generator)),
            },
            fees: Arc::new(FeeSchedule::default()),
            pricing: Arc::new(TierPricing::default()),
            limiter: Arc::new(SlidingWindowLimiter::new(
                max_requests,
                Duration::from_secs(60),
            )),
            extractor: Arc::new(WillExtractor::new(Arc::new(DisabledChat))),
            verifier,
            call_events: Arc::new(call_events.clone()),
        };

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        Harness {
            router: with_api_routes(deps).layer(Extension(state)),
            call_events,
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn read_json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    fn decimal(value: &serde_json::Value) -> Decimal {
        match value {
            serde_json::Value::String(raw) => raw.parse().expect("decimal string"),
            other => other.to_string().parse().expect("decimal number"),
        }
    }

    #[tokio::test]
    async fn health_and_readiness_respond() {
        let Harness { router, .. } = harness(10, None);
        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(health.status(), StatusCode::OK);

        let ready = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(read_json_body(ready).await["status"], json!("ready"));
    }

    #[tokio::test]
    async fn fee_endpoint_returns_breakdown() {
        let Harness { router, .. } = harness(10, None);
        let response = router
            .oneshot(post_json("/api/v1/fees", json!({ "estate_value": 750000 })))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(decimal(&body["total"]), Decimal::from(10_150));
        assert_eq!(body["brackets"].as_array().expect("brackets").len(), 3);
    }

    #[tokio::test]
    async fn negative_estate_value_is_rejected() {
        let Harness { router, .. } = harness(10, None);
        let response = router
            .oneshot(post_json("/api/v1/fees", json!({ "estate_value": -5 })))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn public_endpoints_are_rate_limited() {
        let Harness { router, .. } = harness(1, None);
        let first = router
            .clone()
            .oneshot(post_json("/api/v1/qualification", json!({})))
            .await
            .expect("router responds");
        assert_eq!(first.status(), StatusCode::OK);

        let second = router
            .oneshot(post_json("/api/v1/fees", json!({ "estate_value": 1000 })))
            .await
            .expect("router responds");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn qualification_includes_tier_unless_not_fit() {
        let Harness { router, .. } = harness(10, None);
        let collected = json!({
            "estate_value": "750000",
            "has_real_property": true,
            "grant_type": "administration"
        });

        let fit = router
            .clone()
            .oneshot(post_json(
                "/api/v1/qualification",
                json!({ "flags": {}, "collected": collected.clone() }),
            ))
            .await
            .expect("router responds");
        let body = read_json_body(fit).await;
        assert_eq!(body["qualification"]["result"], json!("fit"));
        assert_eq!(body["tier"]["tier"], json!("premium"));

        let not_fit = router
            .oneshot(post_json(
                "/api/v1/qualification",
                json!({ "flags": { "expected_dispute": true }, "collected": collected }),
            ))
            .await
            .expect("router responds");
        let body = read_json_body(not_fit).await;
        assert_eq!(body["qualification"]["result"], json!("not_fit"));
        assert_eq!(
            body["qualification"]["recommended_action"],
            json!("refer_to_lawyer")
        );
        assert!(body.get("tier").is_none());
    }

    #[tokio::test]
    async fn will_extraction_requires_identity_and_falls_back() {
        let Harness { router, .. } = harness(10, None);
        let anonymous = router
            .clone()
            .oneshot(post_json("/api/v1/wills/extract", json!({ "text": "WILL" })))
            .await
            .expect("router responds");
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let request = Request::post("/api/v1/wills/extract")
            .header(header::CONTENT_TYPE, "application/json")
            .header(USER_ID_HEADER, "client-7")
            .body(Body::from(json!({ "text": "LAST WILL" }).to_string()))
            .expect("request");
        let response = router.oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["extraction"]["executors"], json!([]));
        assert!(body["fallback_reason"].is_string());
    }

    #[tokio::test]
    async fn webhooks_need_a_valid_signature() {
        let verifier = Arc::new(SignatureVerifier::new("key_live"));
        let Harness {
            router,
            call_events,
        } = harness(10, Some(verifier.clone()));
        let payload = json!({ "event": "call_started", "call": { "call_id": "c-1" } }).to_string();

        let forged = Request::post("/api/v1/webhooks/retell")
            .header(header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, "v=1,d=00")
            .body(Body::from(payload.clone()))
            .expect("request");
        let response = router.clone().oneshot(forged).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let signature = verifier
            .sign(payload.as_bytes(), chrono::Utc::now())
            .expect("signs");
        let signed = Request::post("/api/v1/webhooks/retell")
            .header(header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(payload))
            .expect("request");
        let response = router.oneshot(signed).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(call_events.events().len(), 1);
    }

    #[tokio::test]
    async fn webhooks_are_refused_without_a_key() {
        let Harness { router, .. } = harness(10, None);
        let response = router
            .oneshot(post_json(
                "/api/v1/webhooks/retell",
                json!({ "event": "call_started", "call": { "call_id": "c-1" } }),
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
