//! Mapping of submission errors to HTTP responses.

use crate::core::{IdentityError, SubmissionError};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// The operation a request was performing, which selects the wording of
/// internal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /api/scan`
    Submit,
    /// `GET /api/scans`
    History,
    /// `GET /api/scans/{id}`
    Detail,
}

impl Operation {
    fn internal_message(&self) -> &'static str {
        match self {
            Self::Submit => "Failed to process image",
            Self::History => "Failed to fetch scan history",
            Self::Detail => "Failed to fetch scan details",
        }
    }
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Short description of the failure.
    pub error: String,

    /// Optional guidance for the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// Creates an error with a status and short description.
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                message: None,
            },
        }
    }

    /// Adds user guidance to the body.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.message = Some(message.into());
        self
    }

    /// The opaque 500 for an operation.
    pub fn internal(operation: Operation) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            operation.internal_message(),
        )
    }

    /// The 404 for a scan that does not exist for the caller.
    pub fn scan_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Scan not found")
    }

    /// Translates a submission error. Internal failures lose their detail.
    pub fn from_submission(error: &SubmissionError, operation: Operation) -> Self {
        match error {
            SubmissionError::Unauthenticated(cause) => {
                let message = match cause {
                    IdentityError::MissingCredential => "No session token provided",
                    IdentityError::InvalidCredential { .. } | IdentityError::Unavailable { .. } => {
                        "Invalid session"
                    }
                };
                Self::new(StatusCode::UNAUTHORIZED, "User not authenticated").with_message(message)
            }
            SubmissionError::NoSubscription => {
                Self::new(StatusCode::FORBIDDEN, "No active subscription")
            }
            SubmissionError::QuotaExceeded { .. } => {
                Self::new(StatusCode::FORBIDDEN, "Free tier limit reached")
                    .with_message("Please upgrade to continue scanning")
            }
            SubmissionError::BadInput { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "No image file provided")
            }
            SubmissionError::NotFound => Self::scan_not_found(),
            SubmissionError::AnalysisFailed(_) | SubmissionError::StorageFailed(_) => {
                Self::internal(operation)
            }
        }
    }

    /// The HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The JSON body.
    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
