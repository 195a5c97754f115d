//! Mapping of use-case errors onto HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{infrastructure::dto::http::ErrorResponse, usecase::ChatError};

/// Error returned by HTTP handlers
#[derive(Debug)]
pub struct ApiError(pub ChatError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ChatError::Unauthenticated(_) | ChatError::Unauthorized => StatusCode::UNAUTHORIZED,
            ChatError::Forbidden(_) => StatusCode::FORBIDDEN,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ChatError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ChatError::InvalidPayload(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        // テスト項目: エラーの種類ごとの HTTP ステータス
        let cases = [
            (ChatError::Unauthenticated("x".to_string()), StatusCode::UNAUTHORIZED),
            (ChatError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ChatError::Forbidden("chat 'c1'".to_string()), StatusCode::FORBIDDEN),
            (ChatError::NotFound("c1".to_string()), StatusCode::NOT_FOUND),
            (ChatError::InvalidPayload("x".to_string()), StatusCode::BAD_REQUEST),
            (
                ChatError::PersistenceFailure("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError(error).status(), expected);
        }
    }
}
