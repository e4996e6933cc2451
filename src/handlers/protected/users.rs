use axum::{
    extract::rejection::PathRejection,
    extract::{Path, State},
};

use crate::app::AppState;
use crate::database::models::User;
use crate::handlers::Deleted;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /prot/users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(state.services.users.get().await?))
}

/// GET /prot/users/:id
pub async fn get(State(state): State<AppState>, id: Result<Path<i64>, PathRejection>) -> ApiResult<User> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.services.users.get_by_id(id).await?))
}

/// DELETE /prot/users/:id - cascades to the user's requests
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted<i64>> {
    let Path(id) = id?;
    state.services.users.delete(id).await?;
    Ok(ApiResponse::success(Deleted { id }))
}
