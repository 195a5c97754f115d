//! UseCase: チャットルームへの参加・退出
//!
//! ルームの参加状態はコネクション単位で、切断すると失われる。
//! 再接続したクライアントは参加し直す必要がある。

use std::sync::Arc;

use crate::{
    domain::{ChatId, ChatRepository, ConnectionId, RoomKey},
    infrastructure::registry::{RoomMembership, SessionRegistry},
};

use super::{
    access::{authenticated_user, authorize_chat},
    error::ChatError,
};

/// ルーム参加・退出のユースケース
pub struct JoinChatUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    sessions: Arc<SessionRegistry>,
    rooms: Arc<RoomMembership>,
}

impl JoinChatUseCase {
    /// 新しい JoinChatUseCase を作成
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        sessions: Arc<SessionRegistry>,
        rooms: Arc<RoomMembership>,
    ) -> Self {
        Self {
            repository,
            sessions,
            rooms,
        }
    }

    /// チャットのルームに参加（冪等）
    ///
    /// # Returns
    ///
    /// * `Ok(RoomKey)` - 参加したルーム
    /// * `Err(ChatError)` - 未認証・チャットなし・アクセス権なし
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        chat_id: &ChatId,
    ) -> Result<RoomKey, ChatError> {
        let user_id = authenticated_user(&self.sessions, &connection_id)?;
        let chat = authorize_chat(self.repository.as_ref(), chat_id, &user_id).await?;

        let room = chat.room_key();
        if self.rooms.join(&room, connection_id) {
            tracing::info!(
                "Connection '{}' of user '{}' joined room '{}'",
                connection_id,
                user_id,
                room
            );
        }
        Ok(room)
    }

    /// チャットのルームから退出（冪等）
    ///
    /// 退出には権限確認を行わない。
    pub fn leave(&self, connection_id: ConnectionId, chat_id: &ChatId) -> Result<RoomKey, ChatError> {
        authenticated_user(&self.sessions, &connection_id)?;

        let room = RoomKey::chat(chat_id);
        if self.rooms.leave(&room, connection_id) {
            tracing::info!("Connection '{}' left room '{}'", connection_id, room);
        }
        Ok(room)
    }
}
