//! HTTP rendering of [`AppError`]

#[cfg(feature = "axum")]
use super::app_error::AppError;

/// Renders the `{ success: false, message }` envelope.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut body = serde_json::json!({
            "success": false,
            "message": self.message(),
        });
        if let Some(action) = self.action() {
            body["action"] = serde_json::Value::from(action);
        }
        if let Some(detail) = self.detail() {
            body["debug"] = serde_json::Value::from(detail);
        }

        (status, Json(body)).into_response()
    }
}
