use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Why a single transaction record could not take part in an aggregation.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum DataFormatError {
    #[error("createdAt is missing")]
    MissingCreatedAt,
    #[error("createdAt is not a valid timestamp: {0}")]
    InvalidCreatedAt(String),
    #[error("adminEarning is missing")]
    MissingAdminEarning,
    #[error("adminEarning is not a number: {0}")]
    InvalidAdminEarning(String),
    #[error("adminEarning is not finite: {0}")]
    NonFiniteAdminEarning(String),
    #[error("adminEarning {0} overflows the running totals")]
    AmountOverflow(String),
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("malformed row: {0}")]
    MalformedRow(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("sales API request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("sales API responded with status {0}")]
    UpstreamStatus(u16),
    #[error("sales API returned an unexpected payload: {0}")]
    UpstreamPayload(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Upstream(_) | AppError::UpstreamStatus(_) | AppError::UpstreamPayload(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(status = status.as_u16(), "{self}");
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
