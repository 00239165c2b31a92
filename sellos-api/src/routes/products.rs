/// Catalogue endpoints
///
/// # Endpoints
///
/// - `GET /api/products` - List products (public)
/// - `GET /api/products/:id` - Product detail (public)
/// - `GET /api/products/search/:term` - Case-insensitive name search (public)
/// - `POST /api/products` - Create a product (staff)
/// - `PUT /api/products/:id` - Update a product (staff)
/// - `DELETE /api/products/:id` - Delete a product (staff)
///
/// Changing a price never touches existing orders; their lines keep the
/// unit price captured when they were written.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{nullable, MessageResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use sellos_shared::models::product::{max_price, CreateProduct, Product, UpdateProduct};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Product creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub base_price: Decimal,

    /// Promotional price; zero or absent means the base price applies
    pub current_price: Option<Decimal>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Product update; absent fields are kept, `current_price: null` clears it
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub base_price: Option<Decimal>,

    #[serde(default, deserialize_with = "nullable")]
    pub current_price: Option<Option<Decimal>>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    pub available: Option<bool>,
}

fn ensure_price_in_range(field: &str, price: Option<Decimal>) -> ApiResult<()> {
    match price {
        Some(p) if p.is_sign_negative() && !p.is_zero() => {
            Err(ApiError::invalid_field(field, "Price cannot be negative"))
        }
        Some(p) if p > max_price() => Err(ApiError::invalid_field(
            field,
            format!("Price must be at most {}", max_price()),
        )),
        _ => Ok(()),
    }
}

/// List all products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.store.list_products().await?))
}

/// Product detail
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    let product = state
        .store
        .find_product(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Products whose name contains the term, ignoring case
pub async fn search_products(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.store.search_products(term.trim()).await?))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    req.validate()?;
    ensure_price_in_range("base_price", Some(req.base_price))?;
    ensure_price_in_range("current_price", req.current_price)?;

    let product = state
        .store
        .create_product(CreateProduct {
            name: req.name,
            description: req.description,
            base_price: req.base_price,
            current_price: req.current_price,
            image_url: req.image_url,
            available: req.available,
        })
        .await?;

    tracing::info!(product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()?;
    ensure_price_in_range("base_price", req.base_price)?;
    ensure_price_in_range("current_price", req.current_price.flatten())?;

    let product = state
        .store
        .update_product(
            id,
            UpdateProduct {
                name: req.name,
                description: req.description,
                base_price: req.base_price,
                current_price: req.current_price,
                image_url: req.image_url,
                available: req.available,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    tracing::info!(product_id = %product.id, "Product updated");

    Ok(Json(product))
}

/// Delete a product
///
/// Orders keep their snapshot of the product's lines.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.store.delete_product(id).await? {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    tracing::info!(product_id = %id, "Product deleted");

    Ok(Json(MessageResponse::new("Product deleted")))
}
