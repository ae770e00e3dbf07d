//! Request handlers.

use crate::core::{AnalysisResult, ImageUpload, SubmissionError};
use crate::http::auth::BearerToken;
use crate::http::error::{ApiError, Operation};
use crate::http::models::{HealthResponse, ScanView};
use crate::http::AppState;
use crate::store::ScanId;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// `POST /api/scan`
pub async fn submit_scan(
    State(state): State<AppState>,
    token: BearerToken,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    // The body is only read once the caller is known.
    let auth = state
        .orchestrator
        .admit(token.as_deref())
        .await
        .map_err(|e| ApiError::from_submission(&e, Operation::Submit))?;

    let upload = match multipart {
        Ok(multipart) => read_image(multipart).await?,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Request body is not multipart");
            None
        }
    };

    // Run detached so a client disconnect cannot cancel analysis or persistence.
    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move {
        orchestrator.submit_authenticated(&auth, upload).await
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Submission task failed");
        ApiError::internal(Operation::Submit)
    })?;

    outcome
        .map(Json)
        .map_err(|e| ApiError::from_submission(&e, Operation::Submit))
}

/// Reads the `image` field, skipping any others.
///
/// A body that is not valid multipart counts as having no image. A body over
/// the configured limit is rejected outright, but only for authenticated
/// callers since nothing is read before that.
async fn read_image(mut multipart: Multipart) -> Result<Option<ImageUpload>, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Image too large"));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Malformed multipart body");
                return Ok(None);
            }
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Image too large"));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read image field");
                return Ok(None);
            }
        };

        let mut upload = ImageUpload::new(data.to_vec());
        if let Some(name) = file_name {
            upload = upload.with_file_name(name);
        }
        if let Some(content_type) = content_type {
            upload = upload.with_content_type(content_type);
        }
        return Ok(Some(upload));
    }
}

/// `GET /api/scans`
pub async fn list_scans(
    State(state): State<AppState>,
    token: BearerToken,
) -> Result<Json<Vec<ScanView>>, ApiError> {
    let fail = |e: SubmissionError| {
        if e.is_internal() {
            tracing::error!(error = %e, "Failed to fetch scan history");
        }
        ApiError::from_submission(&e, Operation::History)
    };

    let auth = state
        .orchestrator
        .authenticate(token.as_deref())
        .await
        .map_err(fail)?;
    let scans = state.orchestrator.history(&auth).await.map_err(fail)?;

    Ok(Json(scans.into_iter().map(ScanView::from).collect()))
}

/// `GET /api/scans/{id}`
pub async fn get_scan(
    State(state): State<AppState>,
    token: BearerToken,
    Path(id): Path<String>,
) -> Result<Json<ScanView>, ApiError> {
    let fail = |e: SubmissionError| {
        if e.is_internal() {
            tracing::error!(error = %e, scan_id = %id, "Failed to fetch scan details");
        }
        ApiError::from_submission(&e, Operation::Detail)
    };

    let auth = state
        .orchestrator
        .authenticate(token.as_deref())
        .await
        .map_err(fail)?;

    // An id that cannot exist is as absent as one that does not.
    let scan_id: ScanId = id.parse().map_err(|_| ApiError::scan_not_found())?;

    let scan = state
        .orchestrator
        .scan_detail(&auth, scan_id)
        .await
        .map_err(fail)?;

    Ok(Json(ScanView::from(scan)))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
