use crate::api::models::*;
use crate::storage::{Review, CREATE_SCHEMA_HINT};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

const GET_NOT_FOUND: &str = "unsuccessful, check ID";
const UPDATE_NOT_FOUND: &str = "update unsuccessful, check ID";
const DELETE_NOT_FOUND: &str = "Cannot delete review, check ID";
const DELETE_OK: &str = "Review deleted successfully";

pub async fn list_reviews_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.with_store(|store| store.get_all_reviews()).await?;
    info!(count = reviews.len(), "Listed reviews");
    Ok(Json(reviews))
}

pub async fn get_review_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Review>, AppError> {
    let id = parse_id(&raw_id).ok_or_else(|| AppError::NotFound(GET_NOT_FOUND.to_string()))?;

    let review = state
        .with_store(move |store| store.get_review(id))
        .await
        .map_err(|e| e.or_not_found(GET_NOT_FOUND))?;
    Ok(Json(review))
}

pub async fn create_review_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Review>, AppError> {
    let Json(fields) = body.map_err(|rejection| {
        warn!(error = %rejection, "Rejected create body");
        AppError::BadRequest(CREATE_SCHEMA_HINT.to_string())
    })?;

    let review = state
        .with_store(move |store| store.create_review(&fields))
        .await?;

    info!(id = review.id, country = %review.country, "Review created");
    Ok(Json(review))
}

pub async fn update_review_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Review>, AppError> {
    let id = parse_id(&raw_id).ok_or_else(|| AppError::NotFound(UPDATE_NOT_FOUND.to_string()))?;
    let Json(fields) = body.map_err(|rejection| {
        warn!(id, error = %rejection, "Rejected update body");
        AppError::BadRequest(format!("update unsuccessful, {}", rejection.body_text()))
    })?;

    let review = state
        .with_store(move |store| store.update_review(id, &fields))
        .await
        .map_err(|e| e.or_not_found(UPDATE_NOT_FOUND))?;

    info!(id, "Review updated");
    Ok(Json(review))
}

pub async fn delete_review_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let id = parse_id(&raw_id).ok_or_else(|| AppError::NotFound(DELETE_NOT_FOUND.to_string()))?;

    state
        .with_store(move |store| store.delete_review(id))
        .await
        .map_err(|e| e.or_not_found(DELETE_NOT_FOUND))?;

    info!(id, "Review deleted");
    Ok(Json(StatusResponse::new(DELETE_OK)))
}
