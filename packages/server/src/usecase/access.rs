//! チャットへのアクセス判定
//!
//! - ダイレクトチャット: `user1` / `user2` のどちらか
//! - グループチャット: グループのメンバー状態が `Accepted`
//!
//! ルーム参加・入力中の自動参加・送信・履歴取得・既読化のすべてがこの判定を通る。

use crate::{
    domain::{Chat, ChatId, ChatKind, ChatRepository, ConnectionId, UserId},
    infrastructure::registry::SessionRegistry,
};

use super::error::ChatError;

/// チャットを取得し、ユーザーにアクセス権があるか確認する
pub async fn authorize_chat(
    repository: &dyn ChatRepository,
    chat_id: &ChatId,
    user_id: &UserId,
) -> Result<Chat, ChatError> {
    let chat = repository
        .find_chat(chat_id)
        .await?
        .ok_or_else(|| ChatError::NotFound(format!("chat '{}'", chat_id)))?;

    let allowed = match &chat.kind {
        ChatKind::Direct { .. } => chat.is_direct_participant(user_id),
        ChatKind::Group { group_id } => repository
            .group_member_status(group_id, user_id)
            .await?
            .is_some_and(|status| status.grants_access()),
    };

    if allowed {
        Ok(chat)
    } else {
        tracing::warn!("User '{}' has no access to chat '{}'", user_id, chat_id);
        Err(ChatError::Forbidden(format!("chat '{}'", chat_id)))
    }
}

/// コネクションに紐づく認証済みユーザーを取得する
pub fn authenticated_user(
    sessions: &SessionRegistry,
    connection_id: &ConnectionId,
) -> Result<UserId, ChatError> {
    sessions
        .lookup(connection_id)
        .map(|connection| connection.user_id)
        .ok_or(ChatError::Unauthorized)
}
