use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use crate::account::{AccountError, AccountRegistrar, UserPayload};

pub fn router(registrar: Arc<AccountRegistrar>) -> Router {
    Router::new()
        .route("/users/register", post(register_user))
        .with_state(registrar)
}

async fn register_user(
    State(registrar): State<Arc<AccountRegistrar>>,
    Json(payload): Json<UserPayload>,
) -> Result<impl IntoResponse, AccountError> {
    let user = registrar.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::CircuitOpen(_) => "SERVICE_UNAVAILABLE",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status.is_server_error() {
            log::error!("register user failed:{}", self);
            "Internal server error".to_owned()
        } else {
            log::info!("register user rejected:{}", self);
            self.to_string()
        };
        let body = json!({
            "error": detail,
            "error_code": self.error_code(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
