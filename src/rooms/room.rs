use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ConnectionHandle, Message, RoomKey};

#[derive(Debug, Error)]
#[error("room {0} no longer relays messages")]
pub struct RoomClosed(pub RoomKey);

/// A set of live connections sharing one key, plus the queue that
/// serializes their messages into a single fan-out loop.
#[derive(Debug)]
pub struct Room {
    key: RoomKey,
    members: Mutex<Vec<Arc<ConnectionHandle>>>,
    queue: Mutex<Option<mpsc::Sender<Message>>>,
}

impl Room {
    /// Creates the room and starts its relay loop. Must run inside a tokio runtime.
    pub fn spawn(key: RoomKey, queue_capacity: usize) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let room = Arc::new(Self {
            key,
            members: Mutex::new(Vec::new()),
            queue: Mutex::new(Some(tx)),
        });

        tokio::spawn(room.clone().relay_loop(rx));
        room
    }

    pub fn join(&self, conn: Arc<ConnectionHandle>) {
        let mut members = self.members.lock();
        debug!(room = %self.key, conn = %conn.id, user = ?conn.user_id, "join");
        members.push(conn);
    }

    /// Removes the first member with this id. Returns false if it was not a member.
    pub fn leave(&self, conn_id: Uuid) -> bool {
        let mut members = self.members.lock();
        let Some(pos) = members.iter().position(|m| m.id == conn_id) else {
            return false;
        };
        members.remove(pos);
        debug!(room = %self.key, conn = %conn_id, remaining = members.len(), "leave");
        true
    }

    /// Current members in join order.
    pub fn members(&self) -> Vec<Arc<ConnectionHandle>> {
        self.members.lock().clone()
    }

    pub fn member_count(&self) -> usize {
        self.members.lock().len()
    }

    /// Hands a message to the relay loop, waiting while the queue is full.
    pub async fn relay(&self, msg: Message) -> Result<(), RoomClosed> {
        let tx = self.queue.lock().clone();
        let Some(tx) = tx else {
            return Err(RoomClosed(self.key.clone()));
        };
        tx.send(msg).await.map_err(|_| RoomClosed(self.key.clone()))
    }

    /// Delivers to every member present right now. Returns how many accepted it.
    ///
    /// Waits on each member's outbox, so a slow member holds up the room but
    /// loses nothing. A closed member is logged and skipped; it stays until its
    /// own connection ends.
    pub async fn broadcast(&self, msg: Message) -> usize {
        let msg = Arc::new(msg);
        let members = self.members();

        let mut delivered = 0;
        for member in &members {
            match member.send(msg.clone()).await {
                Ok(()) => delivered += 1,
                Err(err) => warn!(room = %self.key, conn = %member.id, error = %err, "delivery failed"),
            }
        }
        debug!(room = %self.key, delivered, members = members.len(), "broadcast");
        delivered
    }

    /// Closes the relay queue. Already queued messages are still delivered,
    /// then the relay loop exits and later `relay` calls fail.
    pub fn shutdown(&self) {
        if self.queue.lock().take().is_some() {
            info!(room = %self.key, "relay queue closed");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.queue.lock().is_none()
    }

    async fn relay_loop(self: Arc<Self>, mut queue: mpsc::Receiver<Message>) {
        info!(room = %self.key, "relay loop started");
        while let Some(msg) = queue.recv().await {
            self.broadcast(msg).await;
        }
        info!(room = %self.key, "relay loop stopped");
    }
}
