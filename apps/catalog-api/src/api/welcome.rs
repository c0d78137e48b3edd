//! Root greeting, served outside `/api`.

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

pub fn router() -> Router {
    Router::new().route("/", get(welcome))
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Welcome to CodeMaker API",
    }))
}
