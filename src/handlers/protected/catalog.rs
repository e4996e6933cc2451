use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::database::models::NameInput;
use crate::handlers::{Catalog, Deleted};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /prot/{roles,tariffs,services}
pub async fn list<T: Catalog>(State(state): State<AppState>) -> ApiResult<Vec<T>> {
    let records = T::service(&state.services).get().await?;
    Ok(ApiResponse::success(records))
}

/// GET /prot/{roles,tariffs,services}/:id
pub async fn get<T: Catalog>(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<T> {
    let Path(id) = id?;
    let record = T::service(&state.services).get_by_id(id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT /prot/{roles,tariffs,services}/:id - rename
pub async fn rename<T: Catalog>(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<NameInput>, JsonRejection>,
) -> ApiResult<T> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let record = T::service(&state.services).rename(id, &input.name).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /prot/{roles,tariffs,services}/:id
///
/// Refused with 409 while the record is the designated superuser role or
/// default tariff, or while other rows still reference it.
pub async fn delete<T: Catalog>(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Deleted<i32>> {
    let Path(id) = id?;
    T::service(&state.services).delete(id).await?;
    Ok(ApiResponse::success(Deleted { id }))
}
