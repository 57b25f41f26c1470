use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use somascope::config::AppConfig;
use somascope::error::AppError;
use somascope::telemetry;
use somascope::workflows::assessment::{
    assessment_router, Actor, AssessmentNotice, AssessmentRecord, AssessmentRepository,
    AssessmentService, DisplayPolicy, HealthHistory, HistoryEntry, IntakeSubmission,
    LifecycleEvent, NoticeError, NoticePublisher, OwnerId, Pattern, PhotoSet, PointAssignment,
    PriorityDomain, RankTier, Region, RepositoryError, RequestId, RequestStatus, ReviewerId,
    ShareToken, StatedComplaints,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "somascope",
    about = "Run the body-pattern assessment service or demo a request end to end",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk one assessment from intake to narrative result and print it
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Priority domain for the demo subject (health, relationships, professional)
    #[arg(long, default_value = "professional")]
    priority: String,
    /// Reviewer name recorded on the demo request
    #[arg(long, default_value = "demo-reviewer")]
    reviewer: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let service = Arc::new(AssessmentService::new(
        Arc::new(MemoryAssessmentStore::default()),
        Arc::new(LogNoticePublisher),
    ));
    let display = DisplayPolicy {
        floor_pct: config.narrative.display_floor_pct,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(assessment_router(service, display))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "assessment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
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

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// In-process aggregate store keyed by request id, with a share-token
/// index maintained on every write.
#[derive(Default, Clone)]
struct MemoryAssessmentStore {
    records: Arc<Mutex<HashMap<RequestId, AssessmentRecord>>>,
}

impl AssessmentRepository for MemoryAssessmentStore {
    fn insert(&self, record: AssessmentRecord) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.request.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: AssessmentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.request.id) {
            guard.insert(record.request.id, record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: RequestId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn find_by_token(
        &self,
        token: &ShareToken,
    ) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| &record.request.share_token == token)
            .cloned())
    }

    fn pending_review(&self, limit: usize) -> Result<Vec<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut pending: Vec<AssessmentRecord> = guard
            .values()
            .filter(|record| record.request.status == RequestStatus::AwaitingReview)
            .cloned()
            .collect();
        pending.sort_by_key(|record| record.request.id);
        pending.truncate(limit);
        Ok(pending)
    }
}

/// Notice sink for deployments without an outbound channel configured.
struct LogNoticePublisher;

impl NoticePublisher for LogNoticePublisher {
    fn publish(&self, notice: AssessmentNotice) -> Result<(), NoticeError> {
        info!(
            template = %notice.template,
            request = notice.request_id.0,
            "assessment notice emitted"
        );
        Ok(())
    }
}

fn parse_priority(raw: &str) -> Result<PriorityDomain, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "health" => Ok(PriorityDomain::Health),
        "relationships" => Ok(PriorityDomain::Relationships),
        "professional" => Ok(PriorityDomain::Professional),
        other => Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unknown priority domain '{other}'"),
        ))),
    }
}

fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let priority = parse_priority(&args.priority)?;
    let reviewer = ReviewerId(args.reviewer);

    let service = AssessmentService::new(
        Arc::new(MemoryAssessmentStore::default()),
        Arc::new(LogNoticePublisher),
    );

    let record = service.submit_intake(demo_submission(priority))?;
    let id = record.request.id;
    println!("Assessment demo");
    println!(
        "Request #{} created ({}), share token {}",
        id.0,
        record.request.status,
        record.request.share_token.0
    );

    service.transition_status(
        id,
        LifecycleEvent::ConfirmPayment {
            processor_reference: "demo-payment-001".to_string(),
        },
        &Actor::PaymentProcessor,
    )?;
    service.transition_status(
        id,
        LifecycleEvent::StartReview,
        &Actor::Reviewer(reviewer.clone()),
    )?;

    let (_, adjustments) = service.open_scoring(id, reviewer.clone(), &demo_points())?;
    let clamped = adjustments.iter().filter(|adj| adj.clamped).count();
    println!(
        "\nScoring opened with {} initial points ({} clamped to the region budget)",
        adjustments.len(),
        clamped
    );

    let derived = service.recompute_matrix(id)?;
    println!("\nPattern shares (grand total {})", derived.grand_total());
    for pattern in Pattern::ordered() {
        println!(
            "- {}: {} points, {}%",
            pattern.label(),
            derived.total(pattern),
            derived.percentage(pattern)
        );
    }

    let result = service.compose_narrative(id, reviewer.clone())?;
    service.transition_status(id, LifecycleEvent::Complete, &Actor::Reviewer(reviewer))?;

    println!("\nDominant patterns ({} axis)", result.axis.label());
    for tier in RankTier::ordered() {
        let slot = &result.slots[tier as usize];
        if slot.is_filled() {
            println!("- {}: {} ({}%)", tier.label(), slot.pattern_label, slot.percentage);
        }
    }

    println!("\nPain state\n{}", result.pain_state);
    println!("\nResource state\n{}", result.resource_state);

    let completed = service.get(id)?;
    println!(
        "\nRequest #{} finished as {} with result visible: {}",
        id.0, completed.request.status, completed.request.has_result
    );

    Ok(())
}

fn demo_submission(priority: PriorityDomain) -> IntakeSubmission {
    IntakeSubmission {
        owner: OwnerId("demo-subject".to_string()),
        priority,
        complaints: StatedComplaints {
            primary: "Chronic neck and shoulder tension".to_string(),
            secondary: Some("Difficulty delegating work".to_string()),
            tertiary: None,
        },
        photos: PhotoSet {
            front: "demo/front.jpg".to_string(),
            back: "demo/back.jpg".to_string(),
            left_profile: "demo/left.jpg".to_string(),
            right_profile: "demo/right.jpg".to_string(),
        },
        history: HealthHistory {
            surgeries: HistoryEntry {
                reported: true,
                detail: Some("Appendectomy, 2014".to_string()),
            },
            ..HealthHistory::default()
        },
        amount_cents: 19_900,
    }
}

fn demo_points() -> Vec<PointAssignment> {
    vec![
        PointAssignment {
            pattern: Pattern::Forte,
            region: Region::Trunk,
            value: 7,
        },
        PointAssignment {
            pattern: Pattern::Lider,
            region: Region::Trunk,
            value: 6,
        },
        PointAssignment {
            pattern: Pattern::Forte,
            region: Region::Legs,
            value: 5,
        },
        PointAssignment {
            pattern: Pattern::Criativo,
            region: Region::Head,
            value: 6,
        },
        PointAssignment {
            pattern: Pattern::Conectivo,
            region: Region::Eyes,
            value: 4,
        },
        PointAssignment {
            pattern: Pattern::Lider,
            region: Region::Mouth,
            value: 3,
        },
        PointAssignment {
            pattern: Pattern::Competitivo,
            region: Region::Feet,
            value: 2,
        },
    ]
}
