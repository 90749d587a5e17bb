use crate::api::models::AppState;
use crate::api::search::handlers::{filter_by_country_handler, search_by_text_handler};
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews/country/{country}", get(filter_by_country_handler))
        .route("/reviews/text/{partialtext}", get(search_by_text_handler))
}
