//! Lifecycle of one upgraded connection: join, replay, read loop, teardown.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ConnectionHandle, Message, Room, RoomKey, connection::Outbox};
use crate::AppState;

/// Who is connecting, and to which kind of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRequest {
    Group { group_id: i64, user_id: Option<i64> },
    /// Persistent room between `sender_id` (the connecting user) and `receiver_id`.
    Pairwise { sender_id: i64, receiver_id: i64 },
}

impl JoinRequest {
    pub fn room_key(&self) -> RoomKey {
        match *self {
            Self::Group { group_id, .. } => RoomKey::group(group_id),
            Self::Pairwise { sender_id, receiver_id } => RoomKey::pairwise(sender_id, receiver_id),
        }
    }

    fn user_id(&self) -> Option<i64> {
        match *self {
            Self::Group { user_id, .. } => user_id,
            Self::Pairwise { sender_id, .. } => Some(sender_id),
        }
    }
}

/// Leaves the room and closes the outbox when the connection ends, whichever
/// way it ends.
struct Membership {
    room: Arc<Room>,
    conn: Arc<ConnectionHandle>,
}

impl Drop for Membership {
    fn drop(&mut self) {
        self.room.leave(self.conn.id);
        self.conn.close();
    }
}

pub(crate) async fn serve(socket: WebSocket, state: AppState, join: JoinRequest) {
    let key = join.room_key();
    let (sink, mut stream) = socket.split();
    let (conn, outbox) = ConnectionHandle::new(join.user_id(), state.config.outbox_capacity);
    let writer = tokio::spawn(write_outbox(sink, outbox, conn.id));

    let room = state.registry.get_or_create(&key);
    room.join(conn.clone());
    let membership = Membership { room, conn };
    info!(room = %key, conn = %membership.conn.id, user = ?join.user_id(), "connection joined");

    if let JoinRequest::Pairwise { sender_id, receiver_id } = join {
        replay_history(&state, &membership.conn, sender_id, receiver_id).await;
    }

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                debug!(conn = %membership.conn.id, error = %err, "read failed");
                break;
            }
        };

        let data = match frame {
            WsMessage::Text(_) | WsMessage::Binary(_) => frame.into_data(),
            WsMessage::Close(_) => break,
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
        };

        let msg: Message = match serde_json::from_slice(&data) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(conn = %membership.conn.id, error = %err, "undecodable message, closing");
                break;
            }
        };

        let msg = match join {
            JoinRequest::Group { .. } => msg,
            JoinRequest::Pairwise { sender_id, receiver_id } => {
                let msg = Message { sender_id, receiver_id, ..msg }.stamped();
                if let Err(err) = state.store.store(&msg).await {
                    warn!(room = %key, error = %err, "failed to store message, dropping it");
                    continue;
                }
                msg
            }
        };

        if let Err(err) = membership.room.relay(msg).await {
            warn!(conn = %membership.conn.id, error = %err, "closing");
            break;
        }
    }

    let conn_id = membership.conn.id;
    drop(membership);
    let _ = writer.await;
    info!(room = %key, conn = %conn_id, "connection closed");
}

async fn replay_history(state: &AppState, conn: &ConnectionHandle, a: i64, b: i64) {
    let history = match state.store.history(a, b).await {
        Ok(history) => history,
        Err(err) => {
            warn!(conn = %conn.id, error = %err, "failed to load history");
            return;
        }
    };

    debug!(conn = %conn.id, messages = history.len(), "replaying history");
    for msg in history {
        if let Err(err) = conn.send(Arc::new(msg)).await {
            warn!(conn = %conn.id, error = %err, "failed to replay message");
        }
    }
}

async fn write_outbox(mut sink: SplitSink<WebSocket, WsMessage>, mut outbox: Outbox, conn_id: Uuid) {
    while let Some(msg) = outbox.recv().await {
        let json = match serde_json::to_string(&*msg) {
            Ok(json) => json,
            Err(err) => {
                warn!(conn = %conn_id, error = %err, "failed to encode message");
                continue;
            }
        };

        if let Err(err) = sink.send(WsMessage::Text(json.into())).await {
            debug!(conn = %conn_id, error = %err, "write failed");
            return;
        }
    }

    let _ = sink.send(WsMessage::Close(None)).await;
    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairwise_requests_from_either_side_share_a_key() {
        let from_five = JoinRequest::Pairwise { sender_id: 5, receiver_id: 9 };
        let from_nine = JoinRequest::Pairwise { sender_id: 9, receiver_id: 5 };
        let from_seven = JoinRequest::Pairwise { sender_id: 7, receiver_id: 5 };

        assert_eq!(from_five.room_key(), from_nine.room_key());
        assert_ne!(from_five.room_key(), from_seven.room_key());
    }

    #[test]
    fn group_request_uses_group_key() {
        let join = JoinRequest::Group { group_id: 42, user_id: None };
        assert_eq!(join.room_key(), RoomKey::group(42));
        assert_eq!(join.user_id(), None);
    }
}
