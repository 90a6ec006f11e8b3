//! brandkit HTTP server binary (§6).
//!
//! A thin axum harness around [`brandkit::PipelineRunner`]: each phase
//! endpoint streams [`PipelineEvent`]s as they're emitted, then a final
//! event carrying the phase result. The library contract itself has no
//! notion of HTTP — this binary exists only to expose it over the wire.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8080)
//! - `RUST_LOG` — tracing filter (default: "info,brandkit=debug")
//! - `BRANDKIT_API_BASE_URL` / `BRANDKIT_API_KEY` — model provider endpoint
//!   and credential, consumed by the HTTP model clients (§6, opaque to
//!   the core)
//! - `BRANDKIT_REFERENCE_ROOT` — root directory for the reference index
//!   (§4.B); logo generation falls back to prompt-only mode if unset or
//!   unloadable
//! - see [`brandkit::Config`] for the remaining tunables
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use brandkit::model_clients::{HttpImageGenProvider, HttpTextProvider, HttpVisionProvider, ImageGenClient, TextStructuredClient, VisionClient};
use brandkit::reference_index::ReferenceIndex;
use brandkit::stages::mockup_compositor::PlacementZone;
use brandkit::types::{Brief, BrandDirectionsOutput};
use brandkit::{Config, PipelineEvent, PipelineRunner, ProgressSink, StyleDnaCache};

type Runner = PipelineRunner<HttpTextProvider, HttpVisionProvider, HttpImageGenProvider>;

#[derive(Clone)]
struct AppState {
    runner: Arc<Runner>,
}

/// `POST /phase1` request body: a brief plus where Phase 1 should write
/// the per-direction logo files it produces.
#[derive(Debug, Deserialize)]
struct Phase1Request {
    brief: Brief,
    output_root: PathBuf,
}

/// `POST /phase2` request body: the chosen direction (carried forward
/// from the Phase-1 response, which already validated it) plus the
/// generated logo and mockup-zone metadata the asset phase composites
/// against.
#[derive(Debug, Deserialize)]
struct Phase2Request {
    brief: Brief,
    directions: BrandDirectionsOutput,
    chosen_option_number: u8,
    logo_path: PathBuf,
    #[serde(default)]
    mockup_zones: Vec<PlacementZone>,
    output_dir: PathBuf,
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/phase1", post(phase1_handler))
        .route("/phase2", post(phase2_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "brandkit",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn phase1_handler(
    State(state): State<AppState>,
    Json(request): Json<Phase1Request>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let (result_tx, result_rx) = oneshot::channel();
    let sink = ProgressSink::new(move |event| {
        let _ = progress_tx.send(event);
    });

    let runner = state.runner.clone();
    tokio::spawn(async move {
        let result = runner
            .run_logos_phase(&request.brief, &request.output_root, sink, None)
            .await;
        let _ = result_tx.send(result);
    });

    Sse::new(event_stream(progress_rx, result_rx)).keep_alive(KeepAlive::default())
}

async fn phase2_handler(
    State(state): State<AppState>,
    Json(request): Json<Phase2Request>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let (result_tx, result_rx) = oneshot::channel();
    let sink = ProgressSink::new(move |event| {
        let _ = progress_tx.send(event);
    });

    let runner = state.runner.clone();
    tokio::spawn(async move {
        let result = runner
            .run_assets_phase(
                &request.directions,
                request.chosen_option_number,
                &request.brief,
                &request.logo_path,
                &request.mockup_zones,
                &request.output_dir,
                sink,
                None,
            )
            .await;
        let _ = result_tx.send(result);
    });

    Sse::new(event_stream(progress_rx, result_rx)).keep_alive(KeepAlive::default())
}

/// Drains `progress_rx` as `progress` SSE events, then — once the sender
/// side closes, meaning the phase has returned — awaits the final result
/// and emits it as one terminal `result` event (§6: "streams events then
/// returns ... JSON").
fn event_stream<T: Serialize + Send + 'static>(
    progress_rx: mpsc::UnboundedReceiver<PipelineEvent>,
    result_rx: oneshot::Receiver<T>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    enum StreamState<T> {
        Streaming(mpsc::UnboundedReceiver<PipelineEvent>, oneshot::Receiver<T>),
        Done,
    }

    stream::unfold(StreamState::Streaming(progress_rx, result_rx), |state| async move {
        match state {
            StreamState::Streaming(mut rx, result_rx) => match rx.recv().await {
                Some(event) => {
                    let sse = sse_json("progress", &event);
                    Some((Ok(sse), StreamState::Streaming(rx, result_rx)))
                }
                None => match result_rx.await {
                    Ok(result) => Some((Ok(sse_json("result", &result)), StreamState::Done)),
                    Err(_) => None,
                },
            },
            StreamState::Done => None,
        }
    })
}

fn sse_json<T: Serialize>(event_name: &'static str, payload: &T) -> Event {
    Event::default()
        .event(event_name)
        .json_data(payload)
        .unwrap_or_else(|e| {
            Event::default()
                .event("error")
                .data(format!("failed to encode {event_name} event: {e}"))
        })
}

fn build_runner(config: Config) -> Runner {
    let base_url = config
        .api_base_url
        .clone()
        .unwrap_or_else(|| "http://localhost:9000".to_string());

    let text_provider = HttpTextProvider::new(base_url.clone(), config.api_key.clone(), config.text_model.clone());
    let vision_provider = HttpVisionProvider::new(base_url.clone(), config.api_key.clone(), config.vision_model.clone());
    let image_provider = HttpImageGenProvider::new(base_url, config.api_key.clone());

    let text_client = TextStructuredClient::new(text_provider);
    let image_client = ImageGenClient::new(image_provider, config.image_model_ladder.clone());
    let style_dna_cache = StyleDnaCache::new(VisionClient::new(vision_provider));

    let reference_index = std::env::var("BRANDKIT_REFERENCE_ROOT").ok().and_then(|root| {
        match ReferenceIndex::load(Path::new(&root)) {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!("failed to load reference index from {root}: {e}");
                None
            }
        }
    });

    let mut runner = PipelineRunner::new(config, text_client, image_client);
    runner.style_dna_cache = Some(style_dna_cache);
    runner.reference_index = reference_index;
    runner
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,brandkit=debug".into()),
        )
        .init();

    let config = Config::from_env();
    let runner = build_runner(config);
    let state = AppState { runner: Arc::new(runner) };
    let app = app_router(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{port}");

    tracing::info!("brandkit server starting on {bind_addr}");
    tracing::info!("  GET  /healthz — liveness probe");
    tracing::info!("  POST /phase1  — brief -> four brand directions + logos (SSE)");
    tracing::info!("  POST /phase2  — chosen direction -> full asset kit (SSE)");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
