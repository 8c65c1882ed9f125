use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

pub async fn home() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "message": "Interface Report API is up and running!" })),
    )
}
