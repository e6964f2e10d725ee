//! Web form and JSON API for innovation analysis

use crate::crew::{Crew, CrewError, CrewEvent, EventCallback, Topic};
use crate::report::AnalysisReport;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::{Any, CorsLayer};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

struct AppState {
    crew: Arc<Crew>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    topic: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    git_hash: String,
    build_time: String,
    model: String,
}

/// Build the router; exposed separately so tests can serve it on an ephemeral port
pub fn router(crew: Arc<Crew>, model: impl Into<String>) -> Router {
    let state = Arc::new(AppState {
        crew,
        model: model.into(),
    });

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/analyze", post(analyze))
        .route("/api/analyze/stream", get(analyze_stream))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_http_server(crew: Arc<Crew>, model: &str, host: &str, port: u16) -> Result<()> {
    let app = router(crew, model);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Innovation assistant listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("PRODUCT_DESIGN_GIT_HASH").to_string(),
        build_time: env!("PRODUCT_DESIGN_BUILD_TIME").to_string(),
        model: state.model.clone(),
    })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// Message shown to the user when a run fails
fn failure_message(err: &CrewError) -> String {
    match err {
        CrewError::EmptyTopic => err.to_string(),
        other => format!("An error occurred: {}", other),
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    let topic = match Topic::new(&req.topic) {
        Ok(topic) => topic,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let events: EventCallback = Arc::new(|event: CrewEvent| {
        tracing::debug!("{}", event.summary());
    });

    let result = state
        .crew
        .kickoff(&topic, &events)
        .await
        .and_then(|output| AnalysisReport::from_output(&output));

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!("Analysis failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, failure_message(&e))
        }
    }
}

fn sse_event(name: &str, payload: &impl Serialize) -> Event {
    Event::default()
        .event(name)
        .data(serde_json::to_string(payload).unwrap_or_default())
}

async fn analyze_stream(
    State(state): State<Arc<AppState>>,
    Query(req): Query<AnalyzeRequest>,
) -> Response {
    let topic = match Topic::new(&req.topic) {
        Ok(topic) => topic,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let (tx, rx) = mpsc::unbounded_channel::<Result<Event, Infallible>>();

    let progress_tx = tx.clone();
    let events: EventCallback = Arc::new(move |event: CrewEvent| {
        // A closed channel means the browser went away; the run still finishes
        let _ = progress_tx.send(Ok(sse_event("progress", &event)));
    });

    let crew = state.crew.clone();
    tokio::spawn(async move {
        let result = crew
            .kickoff(&topic, &events)
            .await
            .and_then(|output| AnalysisReport::from_output(&output));

        let event = match result {
            Ok(report) => sse_event("result", &report),
            Err(e) => {
                tracing::error!("Analysis failed: {}", e);
                sse_event(
                    "failure",
                    &serde_json::json!({ "error": failure_message(&e) }),
                )
            }
        };
        let _ = tx.send(Ok(event));
    });

    Sse::new(UnboundedReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}
