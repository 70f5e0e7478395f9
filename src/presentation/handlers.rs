use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, web};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub struct AppState {
    pub auth_service: AuthService,
}

// Every failure body is `{"message": ...}`
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            ApiError::Validation(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Internal causes stay in the log, never in the body
        let message = match self {
            ApiError::Validation(msg) => {
                warn!(error = %msg, status = %status, "Validation error");
                msg.clone()
            }
            ApiError::Internal(cause) => {
                error!(error = %cause, status = %status, "Internal error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        HttpResponse::build(status).json(MessageResponse { message })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(msg)) => ApiError::Validation(msg.clone()),
            None => ApiError::Internal(format!("{err:#}")),
        }
    }
}

/// Body extraction failures (malformed JSON, wrong content type, oversized
/// payload) are reported as internal errors with the generic message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        warn!(path = %req.path(), error = %err, "Failed to parse request body");
        ApiError::Internal(format!("Failed to parse request body: {err}")).into()
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}
