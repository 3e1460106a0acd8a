// THEORY:
// `brightspot_server` is the upload-handling layer wrapped around the engine. The
// engine knows how to analyse one image; this crate knows about HTTP, about which
// uploads to refuse before they reach the engine, about keeping a history of
// runs, and about handing annotated images back out.
//
// Routes:
// - `GET  /`                    liveness payload
// - `GET  /healthz`             plain `ok`
// - `POST /analyze-image`       multipart upload, field `file` (.jpg / .png)
// - `GET  /download/:filename`  annotated image by generated name
// - `GET  /records`             stored analysis history
//
// Engine work is CPU-bound and does blocking file I/O, so each run is moved onto
// the blocking thread pool; the async workers only shuffle bytes.

pub mod error;
pub mod records;

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
    routing::{get, post},
};
use brightspot::core_modules::persistor::locate;
use brightspot::{AnalysisPipeline, AnalysisResponse, PipelineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub use error::ApiError;
pub use records::{RecordStore, RecordStoreError, StoredRecord};

const ALLOWED_EXTENSIONS: [&str; 2] = [".jpg", ".png"];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Where annotated images are written and served from.
    pub results_dir: PathBuf,
    /// JSON Lines file holding the analysis history.
    pub records_path: PathBuf,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

/// Shared state behind every handler.
#[derive(Debug)]
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    pub records: RecordStore,
}

impl AppState {
    /// Prepares the results directory and opens the record store.
    ///
    /// Directory creation happens here, once, at startup.
    pub async fn initialize(cfg: &ServerConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&cfg.results_dir).await?;
        if let Some(parent) = cfg.records_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let records = RecordStore::open(&cfg.records_path).await?;
        let pipeline = AnalysisPipeline::new(PipelineConfig {
            results_dir: cfg.results_dir.clone(),
        });
        Ok(Self { pipeline, records })
    }
}

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Rejects uploads the engine should never see.
pub fn validate_upload(upload: &Upload) -> Result<(), ApiError> {
    if upload.filename.is_empty() {
        return Err(ApiError::NoFileSelected);
    }
    if !ALLOWED_EXTENSIONS
        .iter()
        .any(|ext| upload.filename.ends_with(ext))
    {
        return Err(ApiError::InvalidFileType);
    }
    if upload.bytes.is_empty() {
        return Err(ApiError::EmptyFile);
    }
    Ok(())
}

/// Validates, analyses, and records one upload.
pub async fn handle_upload(state: &AppState, upload: Upload) -> Result<AnalysisResponse, ApiError> {
    validate_upload(&upload)?;

    let pipeline = state.pipeline.clone();
    let Upload { filename, bytes } = upload;
    info!(filename = %filename, bytes = bytes.len(), "Analysing upload");

    let report = tokio::task::spawn_blocking(move || pipeline.process(&bytes, &filename)).await??;
    let stored = state.records.append(report.record.clone()).await?;

    info!(
        record_id = stored.id,
        artifact = %report.artifact.identifier,
        average_brightness = report.statistics.average_brightness,
        "Analysis stored"
    );
    Ok(report.response())
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?.to_vec();
        return Ok(Upload { filename, bytes });
    }
    Err(ApiError::NoFileSelected)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "Hello": "World" }))
}

async fn analyze_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let upload = read_upload(&mut multipart).await?;
    Ok(Json(handle_upload(&state, upload).await?))
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let path = locate(&state.pipeline.config().results_dir, &filename)?;
    let bytes = tokio::fs::read(&path).await?;

    let content_type = image::ImageFormat::from_path(&path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

async fn list_records(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    Ok(Json(state.records.list().await?))
}

pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(|| async { "ok" }))
        .route("/analyze-image", post(analyze_image))
        .route("/download/:filename", get(download))
        .route("/records", get(list_records))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Binds the listener and serves in a background task.
pub async fn start_server(cfg: ServerConfig) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let state = Arc::new(AppState::initialize(&cfg).await?);
    let app = create_router(state, cfg.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!(
        "Brightspot server listening on http://{} (results={}, records={})",
        listener.local_addr()?,
        cfg.results_dir.display(),
        cfg.records_path.display()
    );

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Server error: {e}");
        }
    });
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let mut image = RgbImage::from_pixel(24, 24, Rgb([60, 60, 60]));
        image.put_pixel(5, 6, Rgb([250, 250, 250]));
        image.put_pixel(18, 2, Rgb([0, 0, 0]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    async fn state(dir: &TempDir) -> AppState {
        let cfg = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            results_dir: dir.path().join("results"),
            records_path: dir.path().join("db").join("records.jsonl"),
            max_upload_bytes: 1 << 20,
        };
        AppState::initialize(&cfg).await.unwrap()
    }

    fn upload(filename: &str, bytes: Vec<u8>) -> Upload {
        Upload {
            filename: filename.to_string(),
            bytes,
        }
    }

    #[test]
    fn validation_rules() {
        assert!(matches!(
            validate_upload(&upload("", vec![1])),
            Err(ApiError::NoFileSelected)
        ));
        assert!(matches!(
            validate_upload(&upload("photo.gif", vec![1])),
            Err(ApiError::InvalidFileType)
        ));
        assert!(matches!(
            validate_upload(&upload("photo.jpeg", vec![1])),
            Err(ApiError::InvalidFileType)
        ));
        assert!(matches!(
            validate_upload(&upload("photo.png", Vec::new())),
            Err(ApiError::EmptyFile)
        ));
        assert!(validate_upload(&upload("photo.jpg", vec![1])).is_ok());
    }

    #[tokio::test]
    async fn upload_is_analysed_and_recorded() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        let response = handle_upload(&state, upload("scene.png", png_bytes())).await.unwrap();

        assert_eq!(response.brightest_point, brightspot::Point::new(5, 6));
        assert_eq!(response.darkest_point, brightspot::Point::new(18, 2));
        assert!(dir.path().join("results").join(&response.processed_image).is_file());

        let records = state.records.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].record.filename, "scene.png");
        assert_eq!(records[0].record.average_brightness, response.average_brightness);
    }

    #[tokio::test]
    async fn undecodable_upload_is_a_bad_request() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        let err = handle_upload(&state, upload("fake.png", b"not a png".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(state.records.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_serves_stored_artifact() {
        let dir = TempDir::new().unwrap();
        let state = Arc::new(state(&dir).await);
        let response = handle_upload(&state, upload("scene.png", png_bytes())).await.unwrap();

        let served = download(State(state.clone()), Path(response.processed_image.clone()))
            .await
            .unwrap();
        assert_eq!(served.status(), StatusCode::OK);
        assert_eq!(served.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn download_rejects_traversal_and_unknown_names() {
        let dir = TempDir::new().unwrap();
        let state = Arc::new(state(&dir).await);

        let err = download(State(state.clone()), Path("../records.jsonl".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = download(State(state.clone()), Path("output_missing.png".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_never_serves_the_record_store() {
        let dir = TempDir::new().unwrap();
        let cfg = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            results_dir: dir.path().join("results"),
            records_path: dir.path().join("results").join("records.jsonl"),
            max_upload_bytes: 1 << 20,
        };
        let state = Arc::new(AppState::initialize(&cfg).await.unwrap());
        handle_upload(&state, upload("scene.png", png_bytes())).await.unwrap();
        assert!(cfg.records_path.is_file());

        let err = download(State(state.clone()), Path("records.jsonl".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
