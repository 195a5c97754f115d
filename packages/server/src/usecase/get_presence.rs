//! UseCase: プレゼンスの取得
//!
//! ユーザーは 1 つ以上のコネクションがある間オンライン。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, UserId},
    infrastructure::registry::SessionRegistry,
};

/// ユーザーのプレゼンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: UserId,
    pub connections: Vec<ConnectionId>,
    /// 最後に登録されたコネクション
    pub canonical_connection: Option<ConnectionId>,
}

impl Presence {
    pub fn is_online(&self) -> bool {
        !self.connections.is_empty()
    }
}

/// プレゼンス取得のユースケース
pub struct GetPresenceUseCase {
    sessions: Arc<SessionRegistry>,
}

impl GetPresenceUseCase {
    /// 新しい GetPresenceUseCase を作成
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self { sessions }
    }

    pub fn execute(&self, user_id: UserId) -> Presence {
        Presence {
            connections: self.sessions.connections_for_user(&user_id),
            canonical_connection: self.sessions.canonical_connection(&user_id),
            user_id,
        }
    }
}
