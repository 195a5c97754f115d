//! エンティティ
//!
//! `Chat` / `Message` は永続化コラボレーターが所有する外部エンティティで、
//! このクレートは事実として受け取るだけです。`Connection` は SessionRegistry が所有します。

use super::value_object::{
    ChatId, ConnectionId, GroupId, MessageContent, MessageId, RoomKey, Timestamp, UserId,
};

/// チャットの種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatKind {
    /// 2 人のユーザー間のチャット
    Direct { user1: UserId, user2: UserId },
    /// グループに紐づくチャット（メンバーはグループの承認状態で決まる）
    Group { group_id: GroupId },
}

/// チャット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub kind: ChatKind,
    pub created_at: Timestamp,
    /// 最終アクティビティ時刻（メッセージ送信で更新）
    pub updated_at: Timestamp,
}

impl Chat {
    pub fn new(id: ChatId, kind: ChatKind, created_at: Timestamp) -> Self {
        Self {
            id,
            kind,
            created_at,
            updated_at: created_at,
        }
    }

    /// 配信先のルームキー（種類によらず `chat:<chatId>`）
    pub fn room_key(&self) -> RoomKey {
        RoomKey::chat(&self.id)
    }

    /// ダイレクトチャットの参加者か
    ///
    /// グループチャットでは常に `false`。グループの可否はメンバー状態で判定する。
    pub fn is_direct_participant(&self, user_id: &UserId) -> bool {
        match &self.kind {
            ChatKind::Direct { user1, user2 } => user1 == user_id || user2 == user_id,
            ChatKind::Group { .. } => false,
        }
    }

    /// 順序を問わず `a` と `b` のダイレクトチャットか
    pub fn is_direct_between(&self, a: &UserId, b: &UserId) -> bool {
        match &self.kind {
            ChatKind::Direct { user1, user2 } => {
                (user1 == a && user2 == b) || (user1 == b && user2 == a)
            }
            ChatKind::Group { .. } => false,
        }
    }

    pub fn group_id(&self) -> Option<&GroupId> {
        match &self.kind {
            ChatKind::Group { group_id } => Some(group_id),
            ChatKind::Direct { .. } => None,
        }
    }
}

/// メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub is_read: bool,
    pub created_at: Timestamp,
}

/// グループメンバーの承認状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMemberStatus {
    Pending,
    Accepted,
    Rejected,
}

impl GroupMemberStatus {
    /// チャットへのアクセスを許可するか（承認済みのみ）
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// 認証済みコネクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub connected_at: Timestamp,
}

impl Connection {
    /// 個人ルームのキー
    pub fn personal_room(&self) -> RoomKey {
        RoomKey::user(&self.user_id)
    }
}
