//! Axum server and routes.

use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use zoo_query::QueryProxy;
use zoo_types::{Animal, EntityRegistry, NewAnimal};

pub struct AppState {
    pub registry: Arc<dyn EntityRegistry + Send + Sync>,
    pub proxy: Arc<QueryProxy>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let query_path = format!("/api/{}", state.proxy.function_name());
    Router::new()
        .route(
            "/api/zoo/v1/animals",
            post(handle_create_animal).put(handle_update_animal),
        )
        .route(
            "/api/zoo/v1/animals/:id",
            get(handle_get_animal).delete(handle_delete_animal),
        )
        .route(&query_path, post(handle_query))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_create_animal(
    State(state): State<Arc<AppState>>,
    Json(animal): Json<NewAnimal>,
) -> Result<Json<Animal>, ApiError> {
    let created = state.registry.create(animal).await?;
    tracing::info!(id = created.id, kind = %created.kind, "animal created");
    Ok(Json(created))
}

async fn handle_get_animal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Animal>, ApiError> {
    state
        .registry
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| animal_not_found(id))
}

async fn handle_update_animal(
    State(state): State<Arc<AppState>>,
    Json(animal): Json<Animal>,
) -> Result<Json<Animal>, ApiError> {
    let updated = state.registry.update(animal).await?;
    tracing::info!(id = updated.id, "animal updated");
    Ok(Json(updated))
}

async fn handle_delete_animal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Animal>, ApiError> {
    let removed = state
        .registry
        .delete(id)
        .await?
        .ok_or_else(|| animal_not_found(id))?;
    tracing::info!(id, "animal deleted");
    Ok(Json(removed))
}

fn animal_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("animal {} not found", id))
}

/// Body is taken raw so that schema errors map to JH-4001 rather than the extractor's rejection.
async fn handle_query(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let outcome = state.proxy.handle(&body).await?;
    if outcome.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(outcome.responses).into_response())
}

async fn handle_health() -> &'static str {
    "ok"
}
