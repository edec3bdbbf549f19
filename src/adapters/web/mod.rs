//! Web server adapter.
//!
//! JSON API over the record store and the crossover signal engine.

mod error;
mod handlers;

pub use error::{WebError, status_from_error};
pub use handlers::*;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::domain::signal::SmaCrossover;
use crate::ports::record_store::RecordStore;

pub struct AppState {
    pub store: Arc<dyn RecordStore + Send + Sync>,
    /// Windows used when a request does not supply its own.
    pub strategy: SmaCrossover,
    pub default_instrument: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/data", get(handlers::list_bars).post(handlers::create_bar))
        .route(
            "/strategy",
            get(handlers::stored_performance).post(handlers::series_performance),
        )
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
