use crate::domain::user::{LoginRequest, Role};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::{debug, info, instrument};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: Role,
}

#[instrument(skip(state, req))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!(email = %req.email, "Login request received");

    let outcome = state
        .auth_service
        .login(req.into_inner())
        .await
        .map_err(|e| {
            debug!(error = %e, "Login rejected");
            ApiError::from(e)
        })?;

    let response = LoginResponse {
        message: LOGIN_SUCCESS_MESSAGE.to_string(),
        token: outcome.token,
        role: outcome.role,
    };

    info!(role = %response.role, "Token issued");
    Ok(HttpResponse::Ok().json(response))
}
