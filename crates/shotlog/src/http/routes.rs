use std::future::Future;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::dataset::DatasetKind;
use crate::ingest::{IngestError, IngestService};

#[derive(Clone)]
pub struct AppState {
    service: IngestService,
}

impl AppState {
    pub fn new(service: IngestService) -> Self {
        Self { service }
    }
}

#[derive(Debug, Serialize)]
struct NotFoundBody {
    error: &'static str,
    expected_file: String,
    path: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(service: IngestService) -> Router {
    Router::new()
        .route("/api/trd", get(get_trd))
        .route("/api/sts", get(get_sts))
        .route("/health", get(health))
        .layer(middleware::from_fn(log_request))
        .with_state(AppState::new(service))
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Latest row of today's daily production file.
pub async fn get_trd(State(state): State<AppState>) -> Response {
    ingest(&state, DatasetKind::Daily).await
}

/// Latest row of this month's status file.
pub async fn get_sts(State(state): State<AppState>) -> Response {
    ingest(&state, DatasetKind::Monthly).await
}

pub async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

async fn ingest(state: &AppState, kind: DatasetKind) -> Response {
    match state.service.handle(kind).await {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response(kind, err),
    }
}

fn error_response(kind: DatasetKind, err: IngestError) -> Response {
    match err {
        IngestError::NotFound {
            expected_file,
            path,
        } => {
            info!(kind = %kind, expected_file = %expected_file, "Dataset file not present yet");
            let body = NotFoundBody {
                error: "File not found",
                expected_file,
                path: path.display().to_string(),
            };
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        other => {
            error!(kind = %kind, error_kind = other.kind(), error = %other, "Ingestion failed");
            let body = ErrorBody {
                error: other.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FixedClock;
    use crate::db::Database;
    use axum::body::to_bytes;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn state(root: &std::path::Path) -> AppState {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2026, 1, 13).unwrap());
        AppState::new(IngestService::with_clock(root, db, Arc::new(clock)))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = health().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_expected_name() {
        let dir = TempDir::new().unwrap();
        let response = get_sts(State(state(dir.path()))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "File not found");
        assert_eq!(body["expected_file"], "Sts202601.csv");
        assert!(body["path"]
            .as_str()
            .unwrap()
            .ends_with("Sts202601.csv"));
    }

    #[tokio::test]
    async fn test_empty_file_is_500() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("2026/01/Trd20260113.csv");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "").unwrap();

        let response = get_trd(State(state(dir.path()))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("CSV empty"));
        assert!(message.contains("Trd20260113.csv"));
        assert!(!message.contains(dir.path().to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_malformed_row_hides_data_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("2026/01/Trd20260113.csv");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "1,2,3\n").unwrap();

        let response = get_trd(State(state(dir.path()))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Malformed row in 'Trd20260113.csv'"));
        assert!(!message.contains(dir.path().to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_file_removed_before_read_is_404() {
        let err = IngestError::from_read(
            crate::reader::ReadError::NotFound {
                path: "/srv/data/2026/01/Trd20260113.csv".into(),
            },
            "Trd20260113.csv",
        );
        let response = error_response(DatasetKind::Daily, err);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["expected_file"], "Trd20260113.csv");
    }

    #[tokio::test]
    async fn test_status_row_is_returned() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("2026/01/Sts202601.csv");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "9,2026-01-13 08:00:00,1,PN-7\n").unwrap();

        let response = get_sts(State(state(dir.path()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "timestamp": "2026-01-13 08:00:00",
                "status": 1,
                "partnumber": "PN-7",
                "file_used": "Sts202601.csv"
            })
        );
    }
}
