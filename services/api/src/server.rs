use crate::cli::ServeArgs;
use crate::infra::{
    AppState, DisabledChat, InMemoryCallEventSink, InMemoryMatterRepository,
    InMemoryReminderScheduler,
};
use crate::routes::{with_api_routes, ApiDependencies};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use probate_desk::config::AppConfig;
use probate_desk::error::AppError;
use probate_desk::integrations::{
    ChatCompletion, OpenAiCompatibleChat, RateLimiter, SignatureVerifier, SlidingWindowLimiter,
    WillExtractor,
};
use probate_desk::telemetry;
use probate_desk::workflows::documents::{DocumentGenerator, DocumentService, HeadlessChromium};
use probate_desk::workflows::fees::FeeSchedule;
use probate_desk::workflows::matter::{MatterService, MatterState};
use probate_desk::workflows::qualification::TierPricing;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let fees = FeeSchedule::from_config(&config.fees)?;
    let repository = Arc::new(InMemoryMatterRepository::default());
    let reminders = Arc::new(InMemoryReminderScheduler::default());
    let renderer = HeadlessChromium::new(config.documents.chromium_path.clone());
    let generator = DocumentGenerator::new(fees.clone(), Arc::new(renderer));

    let chat: Arc<dyn ChatCompletion> = match OpenAiCompatibleChat::from_config(&config.llm) {
        Ok(chat) => Arc::new(chat),
        Err(err) => {
            warn!(error = %err, "will extraction will return empty results");
            Arc::new(DisabledChat)
        }
    };

    let verifier = match &config.voice.api_key {
        Some(key) => Some(Arc::new(SignatureVerifier::new(key.as_bytes()))),
        None => {
            warn!("RETELL_API_KEY not set; voice webhooks will be refused");
            None
        }
    };

    let limiter: Arc<dyn RateLimiter> =
        Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit));

    let deps = ApiDependencies {
        matters: MatterState {
            matters: Arc::new(MatterService::new(repository.clone(), reminders)),
            documents: Arc::new(DocumentService::new(repository, generator)),
        },
        fees: Arc::new(fees),
        pricing: Arc::new(TierPricing::default()),
        limiter,
        extractor: Arc::new(WillExtractor::new(chat)),
        verifier,
        call_events: Arc::new(InMemoryCallEventSink::default()),
    };

    let app = with_api_routes(deps)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "probate desk api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
