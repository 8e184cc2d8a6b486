use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The unit exchanged on every channel, in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender_id: i64,
    /// 0 for group broadcasts.
    #[serde(default)]
    pub receiver_id: i64,
    pub message: String,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<OffsetDateTime>,
}

impl Message {
    pub fn new(sender_id: i64, receiver_id: i64, message: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            message: message.into(),
            time: None,
        }
    }

    /// Replaces whatever time the client claimed with the relay's clock.
    pub fn stamped(self) -> Self {
        Self {
            time: Some(OffsetDateTime::now_utc()),
            ..self
        }
    }
}
