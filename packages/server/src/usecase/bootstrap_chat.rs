//! UseCase: チャットの作成（取得）
//!
//! マッチ成立・グループ作成などのコラボレーターからも呼ばれる。
//! どちらの経路も冪等で、同じペア・同じグループに対してチャットは 1 つだけ。

use std::sync::Arc;

use crate::domain::{Chat, ChatRepository, GroupId, UserId};

use super::error::ChatError;

/// チャット作成のユースケース
pub struct BootstrapChatUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
}

impl BootstrapChatUseCase {
    /// 新しい BootstrapChatUseCase を作成
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// 2 ユーザー間のダイレクトチャットを取得（なければ作成）
    ///
    /// 自分自身とのチャットは作れない。
    pub async fn open_direct_chat(&self, requester: &UserId, other: &UserId) -> Result<Chat, ChatError> {
        if requester == other {
            return Err(ChatError::InvalidPayload(
                "cannot open a direct chat with yourself".to_string(),
            ));
        }
        Ok(self
            .repository
            .find_or_create_direct_chat(requester, other)
            .await?)
    }

    /// グループのチャットを取得（なければ作成）
    ///
    /// 承認済みメンバーだけが開ける。
    pub async fn open_group_chat(
        &self,
        requester: &UserId,
        group_id: &GroupId,
    ) -> Result<Chat, ChatError> {
        let accepted = self
            .repository
            .group_member_status(group_id, requester)
            .await?
            .is_some_and(|status| status.grants_access());
        if !accepted {
            tracing::warn!(
                "User '{}' is not an accepted member of group '{}'",
                requester,
                group_id
            );
            return Err(ChatError::Forbidden(format!("group '{}'", group_id)));
        }

        Ok(self.repository.find_or_create_group_chat(group_id).await?)
    }
}
