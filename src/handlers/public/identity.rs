use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::auth::TokenPair;
use crate::database::models::{Employee, EmployeeCredentials, NewEmployee, NewUser, User, UserCredentials};
use crate::middleware::{ApiResponse, ApiResult};

/// POST /pub/users/signup
pub async fn user_signup(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<User> {
    let Json(input) = payload?;
    let user = state.services.users.register(input).await?;
    tracing::info!(user_id = user.id, "user registered");
    Ok(ApiResponse::created(user))
}

/// POST /pub/employee/signup
pub async fn employee_signup(
    State(state): State<AppState>,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> ApiResult<Employee> {
    let Json(input) = payload?;
    let employee = state.services.employees.register(input).await?;
    tracing::info!(employee_id = employee.id, role_id = employee.role_id, "employee registered");
    Ok(ApiResponse::created(employee))
}

/// POST /pub/users/signin - phone and password
pub async fn user_signin(
    State(state): State<AppState>,
    payload: Result<Json<UserCredentials>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(credentials) = payload?;
    let tokens = state.services.auth.login_user(credentials).await?;
    Ok(ApiResponse::success(tokens))
}

/// POST /pub/employee/signin - email and password
pub async fn employee_signin(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeCredentials>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(credentials) = payload?;
    let tokens = state.services.auth.login_employee(credentials).await?;
    Ok(ApiResponse::success(tokens))
}
