use axum::{debug_handler, extract::{Query, State, WebSocketUpgrade}, response::IntoResponse};
use serde::Deserialize;

use crate::AppState;

use super::session::{self, JoinRequest};

#[derive(Debug, Deserialize)]
pub(crate) struct GroupQuery {
    group_id: i64,
    user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PairQuery {
    sender_id: i64,
    receiver_id: i64,
}

#[debug_handler]
pub(crate) async fn group_ws(
    State(state): State<AppState>,
    Query(GroupQuery { group_id, user_id }): Query<GroupQuery>,

    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session::serve(socket, state, JoinRequest::Group { group_id, user_id }))
}

#[debug_handler]
pub(crate) async fn pair_ws(
    State(state): State<AppState>,
    Query(PairQuery { sender_id, receiver_id }): Query<PairQuery>,

    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session::serve(socket, state, JoinRequest::Pairwise { sender_id, receiver_id }))
}
