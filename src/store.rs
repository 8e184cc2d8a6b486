//! Message history for pairwise rooms.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use time::OffsetDateTime;
use tracing::info;

use crate::rooms::Message;

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn store(&self, msg: &Message) -> anyhow::Result<()>;

    /// Every message exchanged between `a` and `b`, in either direction,
    /// oldest first.
    async fn history(&self, a: i64, b: i64) -> anyhow::Result<Vec<Message>>;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            // an in-memory database lives only as long as its connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await
            .with_context(|| format!("connecting to {url}"))?;

        Ok(Self { db_pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id INTEGER NOT NULL,
                receiver_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                time_ns INTEGER NOT NULL
            )",
        )
        .execute(&self.db_pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS messages_pair ON messages (sender_id,receiver_id,time_ns)")
            .execute(&self.db_pool)
            .await?;

        info!("message store ready");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn store(&self, msg: &Message) -> anyhow::Result<()> {
        let time = msg.time.unwrap_or_else(OffsetDateTime::now_utc);
        let time_ns = i64::try_from(time.unix_timestamp_nanos()).context("timestamp out of range")?;

        sqlx::query("INSERT INTO messages (sender_id,receiver_id,message,time_ns) VALUES (?,?,?,?)")
            .bind(msg.sender_id)
            .bind(msg.receiver_id)
            .bind(&msg.message)
            .bind(time_ns)
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }

    async fn history(&self, a: i64, b: i64) -> anyhow::Result<Vec<Message>> {
        let rows: Vec<(i64, i64, String, i64)> = sqlx::query_as(
            "SELECT sender_id,receiver_id,message,time_ns FROM messages
             WHERE (sender_id=? AND receiver_id=?) OR (sender_id=? AND receiver_id=?)
             ORDER BY time_ns,id",
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter()
            .map(|(sender_id, receiver_id, message, time_ns)| -> anyhow::Result<Message> {
                Ok(Message {
                    sender_id,
                    receiver_id,
                    message,
                    time: Some(OffsetDateTime::from_unix_timestamp_nanos(time_ns.into())?),
                })
            })
            .collect()
    }
}
