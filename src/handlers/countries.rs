//! Country CRUD handlers: list, show, create, update, delete.

use crate::error::AppError;
use crate::extractors::AdminAccess;
use crate::response;
use crate::service::{CountryService, CountryValidator};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Malformed ids cannot name an existing country, so they are reported as not found.
fn parse_id(id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str).map_err(|_| AppError::NotFound(format!("country {}", id_str)))
}

fn body_to_map(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// GET /countries/list
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let countries = CountryService::list(state.store.as_ref()).await?;
    Ok(response::many(countries))
}

/// GET /countries/:id/show
pub async fn show(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let country = CountryService::read(state.store.as_ref(), id).await?;
    Ok(response::ok(country))
}

/// POST /countries (admin)
pub async fn create(
    _admin: AdminAccess,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    let fields = CountryValidator::validate_create(&body)?;
    let country = CountryService::create(state.store.as_ref(), fields).await?;
    Ok(response::created(country))
}

/// PATCH /countries/:id (admin). Only supplied fields change.
pub async fn update(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let body = body_to_map(body)?;
    let patch = CountryValidator::validate_patch(&body)?;
    let country = CountryService::update(state.store.as_ref(), id, patch).await?;
    Ok(response::ok(country))
}

/// DELETE /countries/:id (admin)
pub async fn delete(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let country = CountryService::delete(state.store.as_ref(), id).await?;
    Ok(response::ok(country))
}
