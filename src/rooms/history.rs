use std::sync::Arc;

use axum::{Json, debug_handler, extract::{Query, State}};
use serde::Deserialize;

use crate::{store::MessageStore, AppResult};

use super::Message;

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    user_a: i64,
    user_b: i64,
}

/// Stored conversation between two users, oldest first.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn history(
    State(store): State<Arc<dyn MessageStore>>,
    Query(HistoryQuery { user_a, user_b }): Query<HistoryQuery>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(store.history(user_a, user_b).await?))
}
