use crate::api::models::*;
use crate::storage::Review;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

pub async fn filter_by_country_handler(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = {
        let country = country.clone();
        state
            .with_store(move |store| store.filter_by_country(&country))
            .await?
    };

    if reviews.is_empty() {
        info!(country = %country, "No review matches country");
    } else {
        info!(country = %country, found = reviews.len(), "Filtered by country");
    }
    Ok(Json(reviews))
}

pub async fn search_by_text_handler(
    State(state): State<AppState>,
    Path(text): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = {
        let text = text.clone();
        state
            .with_store(move |store| store.search_by_partial_type(&text))
            .await?
    };

    if reviews.is_empty() {
        info!(text = %text, "No review type matches text");
    } else {
        info!(text = %text, found = reviews.len(), "Search complete");
    }
    Ok(Json(reviews))
}
