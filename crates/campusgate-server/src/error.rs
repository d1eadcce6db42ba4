//! HTTP error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use campusgate_core::Error;

use crate::middleware::RequestId;

/// A core error bound to the request it failed
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    request_id: RequestId,
}

impl ApiError {
    pub fn new(error: Error, request_id: &RequestId) -> Self {
        Self {
            error,
            request_id: request_id.clone(),
        }
    }
}

pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::AuthFailure(_) | Error::Unauthorized(_) | Error::SessionExpired(_) => {
            StatusCode::UNAUTHORIZED
        }
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::CapacityExceeded { .. } | Error::UpstreamUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Error::UpstreamFormat(_) => StatusCode::BAD_GATEWAY,
        Error::TokenGeneration(_)
        | Error::Config(_)
        | Error::Serialization(_)
        | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);

        let message = match &self.error {
            Error::AuthFailure(_) => "Invalid username or password".to_string(),
            Error::CapacityExceeded { .. } => {
                "Server is at capacity, please try again later".to_string()
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(request_id = %self.request_id, "Request failed: {}", e);
                "Internal server error".to_string()
            }
            e => e.to_string(),
        };
        if status != StatusCode::INTERNAL_SERVER_ERROR {
            tracing::debug!(request_id = %self.request_id, "Request failed: {}", self.error);
        }

        let body = serde_json::json!({
            "error": {
                "message": message,
                "code": self.error.code(),
                "status": status.as_u16(),
            },
            "requestId": self.request_id.as_str(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::AuthFailure("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&Error::SessionExpired("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&Error::InvalidRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::CapacityExceeded { max_sessions: 40 }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&Error::UpstreamUnavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&Error::UpstreamFormat("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_capacity_error_body() {
        let request_id = RequestId::from("req-1");
        let response =
            ApiError::new(Error::CapacityExceeded { max_sessions: 40 }, &request_id).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MAX_SESSIONS_REACHED");
        assert_eq!(body["error"]["status"], 503);
        assert_eq!(body["requestId"], "req-1");
    }

    #[tokio::test]
    async fn test_internal_error_is_not_leaked() {
        let request_id = RequestId::from("req-2");
        let response = ApiError::new(
            Error::Internal("cookie SESSION=abc".into()),
            &request_id,
        )
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Internal server error");
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }
}
