//! Country routes. Reads are public; mutations check the admin capability in their handlers.

use crate::handlers::countries::{create, delete, list, show, update};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

pub fn country_routes(state: AppState) -> Router {
    Router::new()
        .route("/countries/list", get(list))
        .route("/countries/:id/show", get(show))
        .route("/countries", post(create))
        .route("/countries/", post(create))
        .route("/countries/:id", patch(update).delete(delete))
        .with_state(state)
}
