use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::errors::Error;

#[derive(Debug, ::serde::Serialize)]
struct ErrorBody {
    code: u32,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("{:?}", self);
        } else {
            tracing::debug!("rejected - {}", self);
        }

        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code: self.code(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(e: JsonRejection) -> Self { Error::InvalidArgument(e.body_text()) }
}

impl From<QueryRejection> for Error {
    fn from(e: QueryRejection) -> Self { Error::InvalidArgument(e.body_text()) }
}

impl From<MultipartRejection> for Error {
    fn from(e: MultipartRejection) -> Self { Error::InvalidArgument(e.body_text()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_code() {
        assert_eq!(
            Error::NotFound("user").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::TokenExpired.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::Internal(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
