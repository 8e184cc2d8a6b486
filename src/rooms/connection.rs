//! One live client channel, as seen by the room it belongs to.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::Message;

pub type Outbox = mpsc::Receiver<Arc<Message>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection is closed")]
    Closed,
}

/// Write side of a connection.
///
/// Messages go into a bounded outbox that the connection's writer task
/// drains onto the socket. Dropping or closing every sender ends that task.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: Uuid,
    pub user_id: Option<i64>,
    tx: Mutex<Option<mpsc::Sender<Arc<Message>>>>,
}

impl ConnectionHandle {
    pub fn new(user_id: Option<i64>, outbox_capacity: usize) -> (Arc<Self>, Outbox) {
        let (tx, rx) = mpsc::channel(outbox_capacity);
        let handle = Self {
            id: Uuid::now_v7(),
            user_id,
            tx: Mutex::new(Some(tx)),
        };
        (Arc::new(handle), rx)
    }

    /// Queues a message, waiting while the outbox is full.
    ///
    /// Fails only once the writer is gone or the handle was closed.
    pub async fn send(&self, msg: Arc<Message>) -> Result<(), DeliveryError> {
        let tx = self.tx.lock().clone().ok_or(DeliveryError::Closed)?;
        tx.send(msg).await.map_err(|_| DeliveryError::Closed)
    }

    /// Detaches the outbox. The writer flushes what is already queued and stops.
    pub fn close(&self) {
        self.tx.lock().take();
    }
}
