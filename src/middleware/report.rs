use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response, Json};

use crate::error::ErrorReport;

/// Completes error bodies with the request path and logs every failure once.
pub async fn error_report_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    if report.status.is_server_error() {
        tracing::error!(
            timestamp = %report.timestamp.to_rfc3339(),
            path = %path,
            status = report.status.as_u16(),
            "{}",
            report.message
        );
    } else {
        tracing::warn!(
            timestamp = %report.timestamp.to_rfc3339(),
            path = %path,
            status = report.status.as_u16(),
            "{}",
            report.message
        );
    }

    let mut rebuilt = (report.status, Json(report.body(Some(&path)))).into_response();
    rebuilt.extensions_mut().insert(report);
    rebuilt
}
