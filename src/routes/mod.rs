use axum::Router;

use crate::config::Config;

mod health;
mod map_data;

// ---

pub fn router(config: Config) -> Router {
    // ---
    Router::new()
        .merge(map_data::router())
        .merge(health::router())
        .with_state(config)
}
