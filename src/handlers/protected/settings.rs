use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Setting;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /prot/settings
pub async fn get(State(state): State<AppState>) -> ApiResult<Setting> {
    let setting = state.services.designations.current().await?;
    Ok(ApiResponse::success(setting))
}
