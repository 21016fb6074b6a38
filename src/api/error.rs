use axum::{Json, http::header, response::IntoResponse};

use super::models::ErrorResponse;
use crate::error::DispatchError;

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        // 405 must advertise what would have been accepted
        let allow_header = match &self {
            DispatchError::MethodNotAllowed { allowed, .. } => Some(
                allowed
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(allow) = allow_header {
            if let Ok(value) = allow.parse() {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}
