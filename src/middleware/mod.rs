pub mod auth;
pub mod report;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use report::error_report_middleware;
pub use response::{ApiResponse, ApiResult};
