//! ScentCart - Cart Aggregation Gateway
//!
//! Thin HTTP surface over the cart core. No auth, no catalog: callers supply
//! the price snapshot and the gateway maps operations onto `CartService`.

use anyhow::Result;
use axum::{extract::{Path, State}, http::StatusCode, routing::{get, post, put}, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scentcart::service::{AddBundleRequest, AddItemRequest, SetQuantityRequest};
use scentcart::{Cart, CartError, CartService, InMemoryCartStore, OwnerRef};

#[derive(Clone)]
pub struct AppState { pub cart: Arc<CartService<InMemoryCartStore>> }

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let currency = std::env::var("CART_CURRENCY").unwrap_or_else(|_| "INR".to_string());
    let state = AppState { cart: Arc::new(CartService::with_currency(InMemoryCartStore::new(), &currency)) };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "scentcart"})) }))
        .route("/api/v1/cart/:owner", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:owner/items", post(add_item))
        .route("/api/v1/cart/:owner/items/:entry", put(set_quantity).delete(remove_item))
        .route("/api/v1/cart/:owner/items/:entry/increment", post(increment))
        .route("/api/v1/cart/:owner/items/:entry/decrement", post(decrement))
        .route("/api/v1/cart/:owner/bundles", post(add_bundle))
        .route("/api/v1/cart/:owner/merge", post(merge_guest))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("scentcart gateway listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

type ApiResult = std::result::Result<Json<Cart>, (StatusCode, String)>;

fn err(e: CartError) -> (StatusCode, String) {
    let status = match e {
        CartError::Validation(_) => StatusCode::BAD_REQUEST,
        CartError::NotFound(_) => StatusCode::NOT_FOUND,
        CartError::Capacity { .. } => StatusCode::CONFLICT,
        CartError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

async fn get_cart(State(s): State<AppState>, Path(owner): Path<String>) -> ApiResult {
    s.cart.get_cart(&OwnerRef::parse(&owner)).await.map(Json).map_err(err)
}

async fn add_item(State(s): State<AppState>, Path(owner): Path<String>, Json(r): Json<AddItemRequest>) -> ApiResult {
    s.cart.add_item(&OwnerRef::parse(&owner), r).await.map(Json).map_err(err)
}

async fn add_bundle(State(s): State<AppState>, Path(owner): Path<String>, Json(r): Json<AddBundleRequest>) -> ApiResult {
    s.cart.add_bundle(&OwnerRef::parse(&owner), r).await.map(Json).map_err(err)
}

async fn set_quantity(State(s): State<AppState>, Path((owner, entry)): Path<(String, String)>, Json(r): Json<SetQuantityRequest>) -> ApiResult {
    s.cart.set_quantity(&OwnerRef::parse(&owner), &entry, r.quantity).await.map(Json).map_err(err)
}

async fn increment(State(s): State<AppState>, Path((owner, entry)): Path<(String, String)>) -> ApiResult {
    s.cart.increment(&OwnerRef::parse(&owner), &entry).await.map(Json).map_err(err)
}

async fn decrement(State(s): State<AppState>, Path((owner, entry)): Path<(String, String)>) -> ApiResult {
    s.cart.decrement(&OwnerRef::parse(&owner), &entry).await.map(Json).map_err(err)
}

async fn remove_item(State(s): State<AppState>, Path((owner, entry)): Path<(String, String)>) -> ApiResult {
    s.cart.remove_item(&OwnerRef::parse(&owner), &entry).await.map(Json).map_err(err)
}

async fn clear_cart(State(s): State<AppState>, Path(owner): Path<String>) -> ApiResult {
    s.cart.clear(&OwnerRef::parse(&owner)).await.map(Json).map_err(err)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest { pub guest_session: String }

async fn merge_guest(State(s): State<AppState>, Path(owner): Path<String>, Json(r): Json<MergeRequest>) -> ApiResult {
    s.cart.merge_guest_into_user(&OwnerRef::Guest(r.guest_session), &OwnerRef::parse(&owner)).await.map(Json).map_err(err)
}
