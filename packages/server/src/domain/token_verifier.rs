//! TokenVerifier trait 定義
//!
//! 認証コラボレーターが発行したセッショントークンを検証し、ユーザー ID を取り出す。

use super::{AuthError, UserId};

#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    /// トークンを検証してユーザー ID を返す
    fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}
