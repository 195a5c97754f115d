//! Server state shared by every handler.

use std::sync::Arc;

use tabichat_shared::time::Clock;

use crate::{
    domain::{ChatRepository, MessagePusher, TokenVerifier},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        registry::{RoomMembership, SessionRegistry},
    },
    usecase::{
        BootstrapChatUseCase, ConnectSessionUseCase, DisconnectSessionUseCase, GetPresenceUseCase,
        JoinChatUseCase, MarkAsReadUseCase, QueryChatsUseCase, SendMessageUseCase, TypingUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectSessionUseCase（セッション接続のユースケース）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション切断のユースケース）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// JoinChatUseCase（ルーム参加・退出のユースケース）
    pub join_chat_usecase: Arc<JoinChatUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// TypingUseCase（入力中通知のユースケース）
    pub typing_usecase: Arc<TypingUseCase>,
    /// MarkAsReadUseCase（既読化のユースケース）
    pub mark_as_read_usecase: Arc<MarkAsReadUseCase>,
    /// BootstrapChatUseCase（チャット作成のユースケース）
    pub bootstrap_chat_usecase: Arc<BootstrapChatUseCase>,
    /// QueryChatsUseCase（チャット取得のユースケース）
    pub query_chats_usecase: Arc<QueryChatsUseCase>,
    /// GetPresenceUseCase（プレゼンス取得のユースケース）
    pub get_presence_usecase: Arc<GetPresenceUseCase>,
    /// MessagePusher（ack / error をコネクションへ返す）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub sessions: Arc<SessionRegistry>,
    pub rooms: Arc<RoomMembership>,
    /// Capacity of each connection's outbound queue
    pub outbound_queue_capacity: usize,
}

impl AppState {
    /// Wire the use cases around the given collaborators.
    ///
    /// The session registry, room membership and pusher are created here, one
    /// set per server instance.
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        token_verifier: Arc<dyn TokenVerifier>,
        clock: Arc<dyn Clock>,
        outbound_queue_capacity: usize,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomMembership::new());
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        Self {
            connect_session_usecase: Arc::new(ConnectSessionUseCase::new(
                token_verifier,
                sessions.clone(),
                rooms.clone(),
                message_pusher.clone(),
                clock,
            )),
            disconnect_session_usecase: Arc::new(DisconnectSessionUseCase::new(
                sessions.clone(),
                rooms.clone(),
                message_pusher.clone(),
            )),
            join_chat_usecase: Arc::new(JoinChatUseCase::new(
                repository.clone(),
                sessions.clone(),
                rooms.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                repository.clone(),
                sessions.clone(),
                rooms.clone(),
                message_pusher.clone(),
            )),
            typing_usecase: Arc::new(TypingUseCase::new(
                repository.clone(),
                sessions.clone(),
                rooms.clone(),
                message_pusher.clone(),
            )),
            mark_as_read_usecase: Arc::new(MarkAsReadUseCase::new(
                repository.clone(),
                sessions.clone(),
            )),
            bootstrap_chat_usecase: Arc::new(BootstrapChatUseCase::new(repository.clone())),
            query_chats_usecase: Arc::new(QueryChatsUseCase::new(repository)),
            get_presence_usecase: Arc::new(GetPresenceUseCase::new(sessions.clone())),
            message_pusher,
            sessions,
            rooms,
            outbound_queue_capacity: outbound_queue_capacity.max(1),
        }
    }
}
