//! HTTP server for the planfact API.
//!
//! Serves rendered reports to the dashboard collaborator. The dataset is
//! fetched once by the injected [`DatasetLoader`] and reused across
//! requests; `POST /api/refresh` is the only way to re-fetch.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | GET    | `/api/report`     | Rendered report; query params = filters  |
//! | POST   | `/api/refresh`    | Re-fetch the source dataset              |
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |
//!
//! Filter query params use logical field names, comma-separated for
//! multiselect: `/api/report?manager=Иванов&buyer=Альфа,Бета`.

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, ReportResponse};
use crate::error::{LoadError, PipelineError};
use crate::loader::DatasetLoader;
use crate::report::{render, selection_from_pairs};

/// Start the HTTP server with an injected dataset loader.
pub async fn start_server(
    port: u16,
    loader: DatasetLoader,
) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS: the dashboard is served from a different origin
    // during development.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/report", get(get_report))
        .route("/api/refresh", post(refresh))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(loader));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Planfact server running on http://localhost:{}", port);
    println!("   GET  /api/report  - Rendered report (query params = filters)");
    println!("   POST /api/refresh - Re-fetch the source dataset");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "planfact",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "report": "GET /api/report",
            "refresh": "POST /api/refresh",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Rendered report endpoint; every query param is a filter selection.
async fn get_report(
    State(loader): State<Arc<DatasetLoader>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ReportResponse>, (StatusCode, Json<Value>)> {
    let selection = selection_from_pairs(params.iter(), loader.definition())
        .map_err(bad_request)?;

    let (dataset, info) = loader.load().await.map_err(load_failure)?;
    let report = render(&dataset, &selection, loader.definition());

    Ok(Json(ReportResponse::build(report, &info)))
}

/// Re-fetch the source dataset, invalidating the session cache.
async fn refresh(
    State(loader): State<Arc<DatasetLoader>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let (dataset, info) = loader.refresh().await.map_err(load_failure)?;

    Ok(Json(json!({
        "status": "refreshed",
        "datasetRows": dataset.len(),
        "droppedRows": info.dropped_rows,
        "fetchedAt": info.fetched_at.to_rfc3339(),
    })))
}

fn bad_request(err: PipelineError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(error_response(&err.to_string())),
    )
}

fn load_failure(err: LoadError) -> (StatusCode, Json<Value>) {
    eprintln!("Load error: {}", err);
    let status = match err {
        // A structurally incompatible source file is the client's data
        // problem, not a server fault.
        LoadError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error_response(&err.to_string())))
}
