// src/handlers/catalog.rs - Product browsing surface.
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
struct ProductQuery {
    category: Option<String>,
    q: Option<String>,
}

pub fn catalog_routes() -> Router {
    Router::new().route("/api/products", get(list_products))
}

async fn list_products(
    Query(params): Query<ProductQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Value> {
    let products = state
        .catalog
        .filter(params.category.as_deref(), params.q.as_deref());

    Json(json!({
        "products": products,
        "categories": state.catalog.categories(),
    }))
}
