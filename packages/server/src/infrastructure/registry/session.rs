//! Session Registry
//!
//! 認証済みコネクションとユーザー ID の対応を保持します。
//!
//! ## 並行性
//!
//! `DashMap` のシャード単位ロックで、無関係なコネクション同士が互いを待たないようにしている。
//! 2 つのマップのガードを同時に保持することはない（デッドロック防止）。
//!
//! ## プレゼンス
//!
//! ユーザーは 1 つ以上のコネクションが登録されている間「オンライン」。
//! 同一ユーザーの複数接続を許可し、最後に登録されたコネクションを代表とする。
//! オンライン / オフラインの判定とその通知は `lock_presence` の内側で行い、
//! 他のセッションが受け取る順序を実際の遷移の順序と一致させる。

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{Connection, ConnectionId, Timestamp, UserId};

/// `admit` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub connection: Connection,
    /// このユーザーの最初のコネクションか（オフライン → オンライン）
    pub first_for_user: bool,
}

/// `remove` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub connection: Connection,
    /// このユーザーのコネクションが残っていないか（オンライン → オフライン）
    pub user_offline: bool,
}

/// Session Registry
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// connection_id -> Connection
    connections: DashMap<ConnectionId, Connection>,
    /// user_id -> 登録順のコネクション ID（末尾が代表）
    by_user: DashMap<UserId, Vec<ConnectionId>>,
    /// プレゼンス遷移の直列化
    presence: Mutex<()>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// プレゼンス遷移のロックを取得
    ///
    /// 登録から `user:online` の通知まで、削除から `user:offline` の通知までを
    /// それぞれこのロックを保持したまま行う。
    pub async fn lock_presence(&self) -> MutexGuard<'_, ()> {
        self.presence.lock().await
    }

    /// 認証済みユーザーのコネクションを登録
    ///
    /// トークン検証は呼び出し側（UseCase）で済ませておくこと。
    pub fn admit(&self, user_id: UserId, connected_at: Timestamp) -> Admission {
        let connection = Connection {
            id: ConnectionId::generate(),
            user_id: user_id.clone(),
            connected_at,
        };
        self.connections.insert(connection.id, connection.clone());

        let first_for_user = {
            let mut ids = self.by_user.entry(user_id).or_default();
            let first = ids.is_empty();
            ids.push(connection.id);
            first
        };

        tracing::debug!(
            "Connection '{}' admitted for user '{}' (first: {})",
            connection.id,
            connection.user_id,
            first_for_user
        );

        Admission {
            connection,
            first_for_user,
        }
    }

    /// コネクションを削除
    ///
    /// 冪等。既に削除済みの ID では `None` を返す。
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<Removal> {
        let (_, connection) = self.connections.remove(connection_id)?;

        let user_offline = match self.by_user.entry(connection.user_id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().retain(|id| id != connection_id);
                if entry.get().is_empty() {
                    entry.remove();
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => true,
        };

        tracing::debug!(
            "Connection '{}' removed for user '{}' (offline: {})",
            connection.id,
            connection.user_id,
            user_offline
        );

        Some(Removal {
            connection,
            user_offline,
        })
    }

    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<Connection> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// ユーザーのコネクション ID 一覧（登録順、空の場合あり）
    pub fn connections_for_user(&self, user_id: &UserId) -> Vec<ConnectionId> {
        self.by_user
            .get(user_id)
            .map(|ids| ids.value().clone())
            .unwrap_or_default()
    }

    /// ユーザーの代表コネクション（最後に登録されたもの）
    pub fn canonical_connection(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.by_user
            .get(user_id)
            .and_then(|ids| ids.value().last().copied())
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.by_user.contains_key(user_id)
    }

    /// 全コネクション ID（グローバルブロードキャスト用）
    pub fn all_connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
