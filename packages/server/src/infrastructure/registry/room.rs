//! Room Membership
//!
//! どのコネクションがどのルームを購読しているかを保持します。
//! ルームは最初の join で作られ、メンバーが空になった時点で削除されます（空ルームを残さない）。
//! メンバーシップはコネクション単位で永続化されず、再接続時にはクライアントが join し直す。
//!
//! ## 並行性
//!
//! 同一コネクションに対する join / leave / leave_all は呼び出し側で直列化されている前提
//! （コネクションごとに 1 タスク）。`members_of` は他コネクションの更新と並行に読めるが、
//! `leave_all` が完了したコネクションを返すことはない。

use std::collections::HashSet;

use dashmap::DashMap;

use crate::domain::{ConnectionId, RoomKey};

/// Room Membership Manager
#[derive(Debug, Default)]
pub struct RoomMembership {
    /// room -> 所属コネクション
    rooms: DashMap<RoomKey, HashSet<ConnectionId>>,
    /// connection -> 参加中のルーム
    joined: DashMap<ConnectionId, HashSet<RoomKey>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームに参加（冪等）。新たに参加した場合 `true`
    pub fn join(&self, room: &RoomKey, connection_id: ConnectionId) -> bool {
        let inserted = self
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id);
        self.joined
            .entry(connection_id)
            .or_default()
            .insert(room.clone());
        inserted
    }

    /// ルームから退出（冪等）。参加していた場合 `true`
    pub fn leave(&self, room: &RoomKey, connection_id: ConnectionId) -> bool {
        let removed = self.remove_member(room, &connection_id);

        if let Some(mut rooms) = self.joined.get_mut(&connection_id) {
            rooms.remove(room);
        }
        self.joined
            .remove_if(&connection_id, |_, rooms| rooms.is_empty());

        removed
    }

    /// 切断時に全ルームから退出し、退出したルームを返す
    pub fn leave_all(&self, connection_id: ConnectionId) -> Vec<RoomKey> {
        let Some((_, rooms)) = self.joined.remove(&connection_id) else {
            return Vec::new();
        };

        let mut left: Vec<RoomKey> = rooms.into_iter().collect();
        left.sort();
        for room in &left {
            self.remove_member(room, &connection_id);
        }
        left
    }

    /// ルームのメンバー
    pub fn members_of(&self, room: &RoomKey) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, room: &RoomKey, connection_id: &ConnectionId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains(connection_id))
    }

    /// コネクションが参加中のルーム
    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomKey> {
        let mut rooms: Vec<RoomKey> = self
            .joined
            .get(connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// 存在するルーム数
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove_member(&self, room: &RoomKey, connection_id: &ConnectionId) -> bool {
        // get_mut のガードは remove_if の前に解放する（同一シャードのロック）
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => members.remove(connection_id),
            None => false,
        };
        self.rooms.remove_if(room, |_, members| members.is_empty());
        removed
    }
}
