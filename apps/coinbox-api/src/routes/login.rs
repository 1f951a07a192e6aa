//! Credential login.
//!
//! Unknown email and wrong password produce the same 401 so the response
//! never reveals which accounts exist.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use coinbox_db::User;

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Exchange email + password for a bearer token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let user = match state.db.users().get_by_email(email).await? {
        Some(user) if verify_password(&request.password, &user.password_hash) => user,
        _ => {
            warn!(email = %email, "Login rejected");
            return Err(ApiError::Unauthorized);
        }
    };

    let token = state.jwt.generate_token(user.id, &user.email)?;

    info!(user_id = user.id, "Operator logged in");
    Ok(Json(LoginResponse { token, user }))
}
