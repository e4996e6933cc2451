use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::database::models::NameInput;
use crate::handlers::Catalog;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /pub/roles, /pub/tariffs, /pub/services
///
/// The first role created becomes the superuser role and the first tariff
/// the default tariff.
pub async fn create<T: Catalog>(
    State(state): State<AppState>,
    payload: Result<Json<NameInput>, JsonRejection>,
) -> ApiResult<T> {
    let Json(input) = payload?;
    let created = T::service(&state.services).create(&input.name).await?;
    Ok(ApiResponse::created(created))
}
