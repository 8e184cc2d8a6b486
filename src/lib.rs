pub mod appresult;
pub mod config;
pub mod rooms;
pub mod store;

use std::sync::Arc;

use axum::{extract::FromRef, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};
pub use config::Config;
use rooms::RoomRegistry;
use store::MessageStore;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub store: Arc<dyn MessageStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MessageStore>) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new(config.relay_queue_capacity)),
            store,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(rooms::router())
        .with_state(state)
        // clients may connect from any origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
