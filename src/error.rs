use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::model::ModelError;
use crate::pdf::template::TemplateError;
use crate::pdf::RenderError;

/// Everything that can stop an export. The session is never modified on
/// any of these paths.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Please upload a certificate template first")]
    MissingTemplate,
    #[error("Please enter the recipient name")]
    MissingRecipientName,
    #[error("Please enter at least one recipient name")]
    EmptyBulkList,
    #[error(transparent)]
    TemplateParse(TemplateError),
    #[error("Failed to generate certificate: {0}")]
    Render(RenderError),
    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export task failed: {0}")]
    Join(String),
}

impl From<RenderError> for ExportError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Template(e) => ExportError::TemplateParse(e),
            other => ExportError::Render(other),
        }
    }
}

impl From<TemplateError> for ExportError {
    fn from(err: TemplateError) -> Self {
        ExportError::TemplateParse(err)
    }
}

impl ExportError {
    pub fn status(&self) -> StatusCode {
        match self {
            ExportError::MissingTemplate => StatusCode::CONFLICT,
            ExportError::MissingRecipientName
            | ExportError::EmptyBulkList
            | ExportError::TemplateParse(_) => StatusCode::BAD_REQUEST,
            ExportError::Render(_)
            | ExportError::Archive(_)
            | ExportError::Io(_)
            | ExportError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors returned by the JSON API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Failed to save upload: {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Model(_) | ApiError::Template(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Export(e) => e.status(),
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (
            status,
            Json(serde_json::json!({
                "status": "error",
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        ApiError::Export(self).into_response()
    }
}
