use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::{Employee, SpecialtyGrant};
use crate::handlers::Deleted;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /prot/employee
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Employee>> {
    Ok(ApiResponse::success(state.services.employees.get().await?))
}

/// GET /prot/employee/:id
pub async fn get(State(state): State<AppState>, id: Result<Path<i64>, PathRejection>) -> ApiResult<Employee> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.services.employees.get_by_id(id).await?))
}

/// DELETE /prot/employee/:id - assigned requests become unassigned
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted<i64>> {
    let Path(id) = id?;
    state.services.employees.delete(id).await?;
    Ok(ApiResponse::success(Deleted { id }))
}

/// POST /prot/employee/:id/service - grant a specialty
pub async fn grant_specialty(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SpecialtyGrant>, JsonRejection>,
) -> ApiResult<Employee> {
    let Path(id) = id?;
    let Json(grant) = payload?;
    state.services.employees.grant_specialty(id, grant.service_id).await?;
    Ok(ApiResponse::created(state.services.employees.get_by_id(id).await?))
}

/// DELETE /prot/employee/:id/service/:service_id - revoke a specialty
pub async fn revoke_specialty(
    State(state): State<AppState>,
    ids: Result<Path<(i64, i32)>, PathRejection>,
) -> ApiResult<()> {
    let Path((id, service_id)) = ids?;
    state.services.employees.revoke_specialty(id, service_id).await?;
    Ok(ApiResponse::<()>::no_content())
}
