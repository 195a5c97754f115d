//! UseCase 層のエラー定義
//!
//! HTTP / WebSocket の両方の入口で同じ分類を使います。

use thiserror::Error;

use crate::domain::{AuthError, RepositoryError, ValueObjectError};

/// チャット操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// トークンが不正・期限切れ・欠落（接続拒否）
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// コネクションが認証済みとして登録されていない
    #[error("connection is not authenticated")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    /// チャット・グループへのアクセス権がない
    #[error("access to {0} is forbidden")]
    Forbidden(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// 永続化の失敗（リトライしない）
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

impl ChatError {
    /// ワイヤー上のエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
        }
    }
}

impl From<ValueObjectError> for ChatError {
    fn from(e: ValueObjectError) -> Self {
        Self::InvalidPayload(e.to_string())
    }
}

impl From<AuthError> for ChatError {
    fn from(e: AuthError) -> Self {
        Self::Unauthenticated(e.to_string())
    }
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::ChatNotFound(id) => Self::NotFound(format!("chat '{}'", id)),
            RepositoryError::Unavailable(_) => Self::PersistenceFailure(e.to_string()),
        }
    }
}
