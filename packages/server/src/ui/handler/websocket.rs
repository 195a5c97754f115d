//! WebSocket connection handlers.
//!
//! Each connection gets two tasks:
//! - the pusher loop drains the bounded outbound queue into the socket;
//! - the receive loop parses inbound frames and runs them one at a time, so
//!   events from the same connection are never processed concurrently.
//!
//! Acks and errors go through the same outbound queue as broadcasts, which
//! keeps everything a connection receives in a single order.
//!
//! The connection is torn down as soon as either task ends or the pusher evicts
//! it for a full queue. The receive loop is asked to stop at the next frame
//! boundary rather than aborted, so an event that is already running completes
//! before disconnect.

use std::{ops::ControlFlow, sync::Arc};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, Stream, StreamExt},
};
use serde::Deserialize;
use tokio::{
    sync::{Notify, mpsc},
    task::JoinHandle,
};

use crate::{
    domain::{ChatId, ConnectionId, OutboundEvent, PusherChannel, UserId},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::ChatError,
};

use super::{auth::bearer_token, error::ApiError};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Upgrade handler
///
/// The token is verified before the upgrade; a bad token never yields a socket.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = query.token.as_deref().or_else(|| bearer_token(&headers));
    let user_id = state.connect_session_usecase.authenticate(token)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Spawns a task that drains the outbound queue into the WebSocket sink.
///
/// The loop ends when the queue is closed or the socket rejects a write.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (sender, receiver) = socket.split();

    let (channel, rx, eviction) = PusherChannel::bounded(state.outbound_queue_capacity);
    let connection = state.connect_session_usecase.admit(user_id, channel).await;
    let connection_id = connection.id;

    let mut send_task = pusher_loop(rx, sender);

    let stop = Arc::new(Notify::new());
    let stop_clone = stop.clone();
    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        read_frames(&stop_clone, receiver, |msg| {
            let state = state_clone.clone();
            async move { handle_frame(&state, connection_id, msg).await }
        })
        .await;
    });

    // If any one of the tasks completes or the connection is evicted, stop the rest
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => stop_receiving(&stop, &mut recv_task).await,
        _ = eviction.evicted() => {
            tracing::info!("Connection '{}' evicted as a slow consumer", connection_id);
            send_task.abort();
            stop_receiving(&stop, &mut recv_task).await;
        }
    };

    state
        .disconnect_session_usecase
        .execute(connection_id)
        .await;
}

/// Feed frames to `handle` one at a time until the stream ends, `handle`
/// breaks, or `stop` fires
///
/// `stop` is only observed between frames, never while `handle` runs.
async fn read_frames<S, F, Fut>(stop: &Notify, mut frames: S, mut handle: F)
where
    S: Stream + Unpin,
    F: FnMut(S::Item) -> Fut,
    Fut: Future<Output = ControlFlow<()>>,
{
    loop {
        let frame = tokio::select! {
            biased;
            _ = stop.notified() => return,
            frame = frames.next() => frame,
        };
        let Some(frame) = frame else {
            return;
        };
        if handle(frame).await.is_break() {
            return;
        }
    }
}

async fn handle_frame(
    state: &AppState,
    connection_id: ConnectionId,
    msg: Result<Message, axum::Error>,
) -> ControlFlow<()> {
    let msg = match msg {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!("WebSocket error on connection '{}': {}", connection_id, e);
            return ControlFlow::Break(());
        }
    };

    match msg {
        Message::Text(text) => handle_text(state, connection_id, text.as_str()).await,
        Message::Binary(_) => {
            push_error(
                state,
                connection_id,
                None,
                &ChatError::InvalidPayload("binary frames are not supported".to_string()),
            )
            .await;
        }
        Message::Close(_) => {
            tracing::info!("Connection '{}' requested close", connection_id);
            return ControlFlow::Break(());
        }
        // Ping/pong is handled automatically by the WebSocket protocol
        _ => {}
    }
    ControlFlow::Continue(())
}

/// Let the receive loop finish its current event, then wait for it to exit
async fn stop_receiving(stop: &Notify, recv_task: &mut JoinHandle<()>) {
    stop.notify_one();
    let _ = recv_task.await;
}

/// Parse and run one inbound frame, replying with an ack or an error event
async fn handle_text(state: &AppState, connection_id: ConnectionId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                "Malformed event from connection '{}': {}",
                connection_id,
                e
            );
            push_error(
                state,
                connection_id,
                event_name(text),
                &ChatError::InvalidPayload(e.to_string()),
            )
            .await;
            return;
        }
    };

    let name = event.name();
    tracing::debug!("Received '{}' from connection '{}'", name, connection_id);

    match dispatch(state, connection_id, event).await {
        Ok(Some(ack)) => {
            if let Err(e) = state.message_pusher.push_to(&connection_id, &ack).await {
                tracing::warn!("Failed to ack '{}' to '{}': {}", name, connection_id, e);
            }
        }
        Ok(None) => {}
        Err(e) => push_error(state, connection_id, Some(name.to_string()), &e).await,
    }
}

/// Run an inbound event and return the ack to send, if any
///
/// `message:send` is acknowledged by `message:sent` inside the use case.
async fn dispatch(
    state: &AppState,
    connection_id: ConnectionId,
    event: ClientEvent,
) -> Result<Option<OutboundEvent>, ChatError> {
    match event {
        ClientEvent::SendMessage(payload) => {
            let (chat_id, content) = payload.into_domain()?;
            state
                .send_message_usecase
                .execute_for_connection(connection_id, &chat_id, content)
                .await?;
            Ok(None)
        }
        ClientEvent::JoinChat(payload) => {
            let chat_id = payload.chat_id()?;
            state.join_chat_usecase.join(connection_id, &chat_id).await?;
            Ok(Some(ack(ClientEvent::JOIN_CHAT, chat_id)))
        }
        ClientEvent::LeaveChat(payload) => {
            let chat_id = payload.chat_id()?;
            state.join_chat_usecase.leave(connection_id, &chat_id)?;
            Ok(Some(ack(ClientEvent::LEAVE_CHAT, chat_id)))
        }
        ClientEvent::TypingStart(payload) => {
            let chat_id = payload.chat_id()?;
            state.typing_usecase.start(connection_id, &chat_id).await?;
            Ok(Some(ack(ClientEvent::TYPING_START, chat_id)))
        }
        ClientEvent::TypingStop(payload) => {
            let chat_id = payload.chat_id()?;
            state.typing_usecase.stop(connection_id, &chat_id).await?;
            Ok(Some(ack(ClientEvent::TYPING_STOP, chat_id)))
        }
        ClientEvent::MarkRead(payload) => {
            let chat_id = payload.chat_id()?;
            state
                .mark_as_read_usecase
                .execute_for_connection(connection_id, &chat_id)
                .await?;
            Ok(Some(ack(ClientEvent::MARK_READ, chat_id)))
        }
    }
}

fn ack(event: &'static str, chat_id: ChatId) -> OutboundEvent {
    OutboundEvent::Ack {
        event,
        chat_id: Some(chat_id),
    }
}

async fn push_error(
    state: &AppState,
    connection_id: ConnectionId,
    event: Option<String>,
    error: &ChatError,
) {
    let outbound = OutboundEvent::Error {
        event,
        code: error.code(),
        message: error.to_string(),
    };
    if let Err(e) = state.message_pusher.push_to(&connection_id, &outbound).await {
        tracing::warn!("Failed to push error to '{}': {}", connection_id, e);
    }
}

/// Best-effort event name of a frame that failed to parse
fn event_name(text: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()?
        .get("event")?
        .as_str()
        .map(str::to_string)
}
