use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::TokenPair;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
    pub refresh_token: String,
}

/// POST /prot/auth/refresh - exchange a refresh token for a new pair
pub async fn refresh(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<RefreshBody>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(body) = payload?;
    let tokens = state.services.auth.refresh(Some(&caller), &body.refresh_token)?;
    Ok(ApiResponse::success(tokens))
}

/// GET /prot/auth/whoami - the identity carried by the access token
pub async fn whoami(Extension(caller): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(caller))
}
