use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::database::models::{EmployeeAssignment, NewRequest, Request, RequestFilter, StatusChange};
use crate::handlers::Deleted;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// POST /prot/request
///
/// End users file requests for themselves; employees must name the owner.
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    payload: Result<Json<NewRequest>, JsonRejection>,
) -> ApiResult<Request> {
    let Json(input) = payload?;
    let request = state.services.requests.create(&caller, input).await?;
    tracing::info!(request_id = request.id, owner_id = request.owner_id, "request filed");
    Ok(ApiResponse::created(request))
}

/// GET /prot/request?owner_id&service_id&status&employee_id&desired_at
pub async fn list(
    State(state): State<AppState>,
    filter: Result<Query<RequestFilter>, QueryRejection>,
) -> ApiResult<Vec<Request>> {
    let Query(filter) = filter?;
    Ok(ApiResponse::success(state.services.requests.get_with_filter(filter).await?))
}

/// GET /prot/request/:id
pub async fn get(State(state): State<AppState>, id: Result<Path<i64>, PathRejection>) -> ApiResult<Request> {
    let Path(id) = id?;
    Ok(ApiResponse::success(state.services.requests.get_by_id(id).await?))
}

/// PATCH /prot/request/:id/employee
pub async fn assign_employee(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EmployeeAssignment>, JsonRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let Json(body) = payload?;
    state.services.requests.update_employee(id, body.employee_id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// PATCH /prot/request/:id/status
pub async fn change_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let Json(body) = payload?;
    state.services.requests.update_status(id, body.status).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// DELETE /prot/request/:id
pub async fn delete(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Deleted<i64>> {
    let Path(id) = id?;
    state.services.requests.delete(id).await?;
    Ok(ApiResponse::success(Deleted { id }))
}
