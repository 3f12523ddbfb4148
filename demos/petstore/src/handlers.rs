use axopen::error_response;
use axopen::prelude::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use crate::models::{ListPets, NewPet, PetPath};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 20;

pub async fn list_pets(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ListPets>,
) -> Response {
    // A missing limit binds to zero.
    let limit = match query.limit {
        0 => DEFAULT_LIMIT,
        n => n as usize,
    };
    Json(state.list(query.tag.as_deref(), limit).await).into_response()
}

pub async fn find_pet(State(state): State<AppState>, ValidPath(path): ValidPath<PetPath>) -> Response {
    match state.get(path.pet_id).await {
        Some(pet) => Json(pet).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Pet not found"),
    }
}

pub async fn add_pet(State(state): State<AppState>, ValidBody(new): ValidBody<NewPet>) -> Response {
    let pet = state.insert(&new).await;
    info!(id = pet.id, name = %pet.name, "pet added");
    (StatusCode::CREATED, Json(pet)).into_response()
}

pub async fn delete_pet(
    State(state): State<AppState>,
    ValidPath(path): ValidPath<PetPath>,
    values: RequestValues,
) -> Response {
    if !state.remove(path.pet_id).await {
        return error_response(StatusCode::NOT_FOUND, "Pet not found");
    }
    info!(
        id = path.pet_id,
        key = values.security("api_key").unwrap_or_default(),
        "pet deleted"
    );
    StatusCode::NO_CONTENT.into_response()
}

pub async fn health() -> &'static str {
    "ok"
}
