use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tender_ops::config::AppConfig;
use tender_ops::error::AppError;
use tender_ops::telemetry;
use tender_ops::workflows::approval::{
    approval_router, ApprovalService, InMemoryDecisionNotifier, InMemoryWorkflowRepository,
};
use tender_ops::workflows::evaluation::{
    evaluation_router, format_cents, sheet_to_csv, AwardPackAssembler, BidLineItem,
    BidSubmission, BidderId,
    BoqItemId, ComparableSheetBuilder, CriterionId, EvaluationCriterion, EvaluationPlan,
    EvaluationService, EvaluationWeights, InMemoryTenderRepository, OutlierPolicy, ScorerId,
    ScoringEngine, ScoringPolicy, SensitivityAnalyzer, TechnicalScoreEntry,
    TenderEvaluationSnapshot, TenderId,
};
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Tender Award Orchestrator",
    about = "Run the bid evaluation and award approval service from the command line",
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
    /// Run evaluation workflows against canned tender data
    Evaluation {
        #[command(subcommand)]
        command: EvaluationCommand,
    },
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

#[derive(Subcommand, Debug)]
enum EvaluationCommand {
    /// Score the demo tender and print ranking, comparable sheet, and
    /// sensitivity output
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Override the outlier threshold (percent deviation from the median)
    #[arg(long)]
    outlier_threshold: Option<f64>,
    /// Weight shift scenarios in percentage points (repeatable)
    #[arg(long = "shift", allow_hyphen_values = true)]
    shifts: Vec<i16>,
    /// Print the comparable sheet as CSV instead of a listing
    #[arg(long)]
    csv: bool,
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
        Command::Evaluation {
            command: EvaluationCommand::Demo(args),
        } => run_evaluation_demo(args),
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

    let tender_repository = Arc::new(InMemoryTenderRepository::default());
    let snapshot = sample_snapshot();
    let seeded_tender = snapshot.tender_id.clone();
    if tender_repository.seed(snapshot).is_ok() {
        info!(tender = %seeded_tender.0, "seeded demo tender snapshot");
    }

    let evaluation_service = Arc::new(EvaluationService::new(
        tender_repository,
        ScoringPolicy::default(),
        OutlierPolicy::new(config.evaluation.outlier_threshold_percent),
    ));

    let approval_service = Arc::new(ApprovalService::new(
        Arc::new(InMemoryWorkflowRepository::default()),
        Arc::new(InMemoryDecisionNotifier::default()),
    ));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(evaluation_router(evaluation_service))
        .merge(approval_router(approval_service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tender award orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_evaluation_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        outlier_threshold,
        shifts,
        csv,
    } = args;

    let snapshot = sample_snapshot();
    let engine = ScoringEngine::new(ScoringPolicy::default());
    let sheets = ComparableSheetBuilder::new(
        outlier_threshold.map(OutlierPolicy::new).unwrap_or_default(),
    );
    let analyzer = SensitivityAnalyzer::new(engine.clone());

    let shifts = if shifts.is_empty() {
        vec![-10, -5, 5, 10]
    } else {
        shifts
    };

    println!("Bid evaluation demo");
    println!(
        "Tender {} with {} bids, split {}/{} technical/commercial",
        snapshot.tender_id.0,
        snapshot.bids.len(),
        snapshot.plan.weights.technical_percent,
        snapshot.plan.weights.commercial_percent
    );

    let scores = engine.compute_scores(
        &snapshot.plan,
        &snapshot.technical_scores,
        &snapshot.bids,
    )?;

    println!("\nCombined ranking");
    for score in &scores {
        println!(
            "- #{} {} | technical {:.2} | commercial {:.2} | weighted {:.2} | price {}",
            score.rank,
            score.bidder_id.0,
            score.technical_total,
            score.commercial_total,
            score.weighted_total,
            format_cents(score.evaluated_price_cents)
        );
    }

    let rows = sheets.build(&snapshot.bids);
    if csv {
        println!("\nComparable sheet (CSV)");
        print!("{}", sheet_to_csv(&rows).map_err(|err| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())
        })?);
    } else {
        println!("\nComparable sheet");
        for row in &rows {
            println!("- {} (median {:.2})", row.boq_item_id.0, row.median_cents / 100.0);
            for entry in &row.entries {
                let marker = if entry.outlier { " [outlier]" } else { "" };
                println!(
                    "    {}: {} ({:+.2}%){}",
                    entry.bidder_id.0,
                    format_cents(entry.extended_price_cents),
                    entry.deviation_percent,
                    marker
                );
            }
        }
    }

    let scenarios = analyzer.analyze(
        &snapshot.plan,
        &snapshot.technical_scores,
        &snapshot.bids,
        &shifts,
    )?;

    println!("\nSensitivity");
    for scenario in &scenarios {
        let stability = if scenario.top_changed {
            "top bidder changes"
        } else {
            "ranking stable"
        };
        println!(
            "- shift {:+} -> split {}/{}: {} leads ({})",
            scenario.shift_percent,
            scenario.weights.technical_percent,
            scenario.weights.commercial_percent,
            scenario.top_bidder.0,
            stability
        );
    }

    match AwardPackAssembler::assemble(
        &snapshot.tender_id,
        &scores,
        "Highest weighted total across the qualifying field".to_string(),
    ) {
        Ok(pack) => println!(
            "\nRecommended award: {} ({})",
            pack.recommended_bidder.0, pack.rationale
        ),
        Err(err) => println!("\nAward pack withheld: {err}"),
    }

    Ok(())
}

/// Canned tender used by the demo command and as the seed for `serve`.
fn sample_snapshot() -> TenderEvaluationSnapshot {
    let now = Utc::now();

    let criteria = vec![
        EvaluationCriterion {
            id: CriterionId("crit-methodology".to_string()),
            name: "Construction methodology".to_string(),
            weight_percent: 40,
            max_raw_score: 10,
            description: "Method statement, program, and site organization".to_string(),
        },
        EvaluationCriterion {
            id: CriterionId("crit-experience".to_string()),
            name: "Comparable project experience".to_string(),
            weight_percent: 35,
            max_raw_score: 10,
            description: "Delivered projects of similar scope in the last decade".to_string(),
        },
        EvaluationCriterion {
            id: CriterionId("crit-hse".to_string()),
            name: "Health, safety, and environment plan".to_string(),
            weight_percent: 25,
            max_raw_score: 5,
            description: "HSE management system and incident record".to_string(),
        },
    ];

    let bids = vec![
        bid(
            "acme-construction",
            now - Duration::days(4),
            &[("boq-earthworks", 12_50, 400), ("boq-concrete", 210_00, 120), ("boq-steel", 95_00, 260)],
        ),
        bid(
            "bravo-build",
            now - Duration::days(3),
            &[("boq-earthworks", 11_00, 400), ("boq-concrete", 198_00, 120), ("boq-steel", 101_00, 260)],
        ),
        bid(
            "cardinal-eng",
            now - Duration::days(2),
            &[("boq-earthworks", 19_75, 400), ("boq-concrete", 225_00, 120), ("boq-steel", 88_00, 260)],
        ),
    ];

    let technical_scores = vec![
        score("acme-construction", "crit-methodology", "scorer-lead", 8),
        score("acme-construction", "crit-methodology", "scorer-tech", 7),
        score("acme-construction", "crit-experience", "scorer-lead", 9),
        score("acme-construction", "crit-experience", "scorer-tech", 8),
        score("acme-construction", "crit-hse", "scorer-lead", 4),
        score("acme-construction", "crit-hse", "scorer-tech", 5),
        score("bravo-build", "crit-methodology", "scorer-lead", 7),
        score("bravo-build", "crit-methodology", "scorer-tech", 7),
        score("bravo-build", "crit-experience", "scorer-lead", 8),
        score("bravo-build", "crit-experience", "scorer-tech", 7),
        score("bravo-build", "crit-hse", "scorer-lead", 4),
        score("bravo-build", "crit-hse", "scorer-tech", 4),
        score("cardinal-eng", "crit-methodology", "scorer-lead", 9),
        score("cardinal-eng", "crit-methodology", "scorer-tech", 9),
        score("cardinal-eng", "crit-experience", "scorer-lead", 7),
        score("cardinal-eng", "crit-experience", "scorer-tech", 8),
        score("cardinal-eng", "crit-hse", "scorer-lead", 5),
        score("cardinal-eng", "crit-hse", "scorer-tech", 5),
    ];

    TenderEvaluationSnapshot {
        tender_id: TenderId("tender-demo".to_string()),
        plan: EvaluationPlan {
            weights: EvaluationWeights {
                technical_percent: 60,
                commercial_percent: 40,
            },
            criteria,
        },
        bids,
        technical_scores,
    }
}

fn bid(
    bidder: &str,
    submitted_at: chrono::DateTime<Utc>,
    lines: &[(&str, u64, u32)],
) -> BidSubmission {
    BidSubmission {
        bidder_id: BidderId(bidder.to_string()),
        submitted_at,
        disqualified: false,
        line_items: lines
            .iter()
            .map(|(item, unit_price_cents, quantity)| BidLineItem {
                boq_item_id: BoqItemId(item.to_string()),
                unit_price_cents: *unit_price_cents,
                quantity: *quantity,
            })
            .collect(),
    }
}

fn score(bidder: &str, criterion: &str, scorer: &str, raw: u16) -> TechnicalScoreEntry {
    TechnicalScoreEntry {
        bidder_id: BidderId(bidder.to_string()),
        criterion_id: CriterionId(criterion.to_string()),
        scorer_id: ScorerId(scorer.to_string()),
        raw_score: raw,
    }
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
