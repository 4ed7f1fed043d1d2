//! Success envelope: `{"data": ..., "meta": {...}}`. Errors use `error::ErrorBody`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Serialize)]
pub struct Meta {
    pub count: u64,
}

pub type Reply<T> = (StatusCode, Json<Envelope<T>>);

fn reply<T: Serialize>(status: StatusCode, data: T, meta: Option<Meta>) -> Reply<T> {
    (status, Json(Envelope { data, meta }))
}

/// 201 with the created resource.
pub fn created<T: Serialize>(data: T) -> Reply<T> {
    reply(StatusCode::CREATED, data, None)
}

pub fn ok<T: Serialize>(data: T) -> Reply<T> {
    reply(StatusCode::OK, data, None)
}

/// 200 with the items and `meta.count`.
pub fn many<T: Serialize>(data: Vec<T>) -> Reply<Vec<T>> {
    let count = data.len() as u64;
    reply(StatusCode::OK, data, Some(Meta { count }))
}
