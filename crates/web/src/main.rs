mod cli;
mod metrics;
mod models;

use anyhow::{anyhow, Context, Result};
use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;
use common::chain::ChainGatewayClient;
use common::config::{RecordSourceKind, ResolverKind};
use common::model::ScoringModelClient;
use common::types::{Address, SubmissionStatus};
use engine::pipeline::{PipelineController, Snapshot};
use engine::records::{ChainRecordSource, SampleRecordSource, Source};
use engine::resolver::{ChainResolver, ModelResolver, Resolver};
use engine::submission::GiveHelpInput;
use engine::watcher::run_watcher;
use models::{RankRow, RecordRow};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub snapshot_rx: watch::Receiver<Snapshot>,
    pub chain: Arc<ChainGatewayClient>,
    pub refresh_tx: mpsc::Sender<()>,
}

// --- Templates ---

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    contract: String,
}

#[derive(Template)]
#[template(path = "partials/leaderboard.html")]
struct LeaderboardTemplate {
    loading: bool,
    rows: Vec<RankRow>,
}

#[derive(Template)]
#[template(path = "partials/board.html")]
struct BoardTemplate {
    loading: bool,
    rows: Vec<RecordRow>,
}

#[derive(Template)]
#[template(path = "partials/submission.html")]
struct SubmissionTemplate {
    tx_hash: String,
    phase: &'static str,
    reason: String,
}

#[derive(Template)]
#[template(path = "partials/submit_error.html")]
struct SubmitErrorTemplate {
    reason: String,
}

// --- Handlers ---

async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(
        DashboardTemplate {
            contract: state.chain.contract_address().short(),
        }
        .to_string(),
    )
}

async fn leaderboard_partial(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    let template = match &snapshot {
        Snapshot::Loading => LeaderboardTemplate {
            loading: true,
            rows: vec![],
        },
        // Empty entries render the empty-state message, not the skeleton.
        Snapshot::Ready { entries, .. } => LeaderboardTemplate {
            loading: false,
            rows: models::rank_rows(entries),
        },
    };
    Html(template.to_string())
}

async fn board_partial(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot_rx.borrow().clone();
    let template = match &snapshot {
        Snapshot::Loading => BoardTemplate {
            loading: true,
            rows: vec![],
        },
        Snapshot::Ready { records, .. } => BoardTemplate {
            loading: false,
            rows: models::record_rows(records, Utc::now()),
        },
    };
    Html(template.to_string())
}

#[derive(Deserialize)]
struct HelpForm {
    recipient: String,
    message: String,
}

async fn help_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HelpForm>,
) -> impl IntoResponse {
    let input = GiveHelpInput {
        recipient: form.recipient,
        message: form.message,
    };
    let give = match input.validate() {
        Ok(give) => give,
        Err(e) => {
            return Html(
                SubmitErrorTemplate {
                    reason: e.to_string(),
                }
                .to_string(),
            )
        }
    };

    match state.chain.give_help(&give.recipient, &give.message).await {
        Ok(tx) => {
            ::metrics::counter!("help_submissions_total").increment(1);
            tracing::info!(tx_hash = %tx.tx_hash, recipient = %give.recipient, "help submitted");
            render_submission(tx.tx_hash, "pending_signature", String::new())
        }
        Err(e) => {
            tracing::warn!(error = %e, "help submission failed");
            Html(
                SubmitErrorTemplate {
                    reason: short_reason(&e),
                }
                .to_string(),
            )
        }
    }
}

fn short_reason(e: &anyhow::Error) -> String {
    let mut reason = format!("Transaction error: {e}");
    if reason.chars().count() > 200 {
        reason = reason.chars().take(200).collect::<String>() + "\u{2026}";
    }
    reason
}

async fn tx_partial(
    State(state): State<Arc<AppState>>,
    Path(tx_hash): Path<String>,
) -> impl IntoResponse {
    match state.chain.transaction_status(&tx_hash).await {
        Ok(SubmissionStatus::PendingSignature) => {
            render_submission(tx_hash, "pending_signature", String::new())
        }
        Ok(SubmissionStatus::Confirming) => render_submission(tx_hash, "confirming", String::new()),
        Ok(SubmissionStatus::Confirmed) => {
            // The confirmed record is on chain but not yet in our snapshot;
            // nudge the watcher instead of waiting out the poll interval.
            if state.refresh_tx.try_send(()).is_err() {
                tracing::debug!("refresh nudge dropped");
            }
            render_submission(tx_hash, "confirmed", String::new())
        }
        Ok(SubmissionStatus::Failed { reason }) => render_submission(tx_hash, "failed", reason),
        Err(e) => {
            // A status-check hiccup is not a failed transaction; keep polling.
            tracing::warn!(error = %e, tx_hash, "transaction status check failed");
            render_submission(tx_hash, "confirming", String::new())
        }
    }
}

fn render_submission(tx_hash: String, phase: &'static str, reason: String) -> Html<String> {
    Html(
        SubmissionTemplate {
            tx_hash,
            phase,
            reason,
        }
        .to_string(),
    )
}

// --- Router ---

pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/partials/leaderboard", get(leaderboard_partial))
        .route("/partials/board", get(board_partial))
        .route("/partials/tx/{tx_hash}", get(tx_partial))
        .route("/help", post(help_submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = common::config::Config::load()?;
    let dispatch = common::observability::build_dispatch(&config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch)?;

    let cmd = cli::parse_args(std::env::args()).map_err(|e| anyhow!(e))?;

    let contract: Address = config
        .chain
        .contract_address
        .parse()
        .map_err(|e| anyhow!("invalid chain.contract_address: {e}"))?;
    let chain = Arc::new(ChainGatewayClient::new(
        &config.chain.gateway_url,
        contract,
        Duration::from_secs(config.chain.request_timeout_secs),
    )?);

    let source = match config.records.source {
        RecordSourceKind::Chain => Source::Chain(ChainRecordSource::new(chain.clone())),
        RecordSourceKind::Sample => Source::Sample(SampleRecordSource),
    };
    let resolver = match config.scoring.resolver {
        ResolverKind::Chain => Resolver::Chain(ChainResolver::new(chain.clone())),
        ResolverKind::Model => {
            let api_key = std::env::var("ANTHROPIC_API_KEY")
                .context("scoring.resolver = \"model\" requires ANTHROPIC_API_KEY")?;
            Resolver::Model(ModelResolver::new(ScoringModelClient::new(
                &api_key,
                &config.model,
            )))
        }
    };
    let controller = Arc::new(PipelineController::new(source, resolver));

    if cmd == cli::Command::Leaderboard {
        return cli::print_leaderboard(&controller).await;
    }

    metrics::install_prometheus(config.observability.prometheus_port)?;
    metrics::describe();

    let snapshot_rx = controller.subscribe();
    let (refresh_tx, refresh_rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    tokio::spawn(run_watcher(
        controller,
        Duration::from_secs(config.chain.poll_interval_secs),
        refresh_rx,
        cancel.clone(),
    ));

    let state = Arc::new(AppState {
        snapshot_rx,
        chain,
        refresh_tx,
    });
    let app = create_router_with_state(state);

    let web_port = config.web.as_ref().map_or(8080, |w| w.port);
    let web_host = config
        .web
        .as_ref()
        .map_or("0.0.0.0".to_string(), |w| w.host.clone());
    let addr: SocketAddr = format!("{web_host}:{web_port}").parse()?;
    tracing::info!("kindness board listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
        })
        .await?;
    Ok(())
}
