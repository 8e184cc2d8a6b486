mod connection;
mod history;
mod key;
mod msg;
mod registry;
mod room;
mod session;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use connection::{ConnectionHandle, DeliveryError, Outbox};
pub use key::RoomKey;
pub use msg::Message;
pub use registry::RoomRegistry;
pub use room::{Room, RoomClosed};
pub use session::JoinRequest;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::group_ws))
        .route("/ws/pair", get(ws::pair_ws))
        .route("/history", get(history::history))
}
