/// Database models for Sellos G
///
/// Each model owns its row type and the SQL for its table. Handlers never call
/// these directly; they go through the [`crate::store`] traits, which the
/// Postgres store implements by delegating here.
///
/// # Models
///
/// - `identity`: staff and customer credentials, roles, action tokens
/// - `product`: catalogue entries and effective pricing
/// - `order`: orders with priced line items and status
/// - `notification`: back-office feed
///
/// # Example
///
/// ```no_run
/// use sellos_shared::models::product::{CreateProduct, Product};
/// use sellos_shared::db::pool::{create_pool, DatabaseConfig};
/// use rust_decimal::Decimal;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let product = Product::create(&pool, CreateProduct {
///     name: "Sello automático".to_string(),
///     description: None,
///     base_price: Decimal::new(1500, 2),
///     current_price: None,
///     image_url: None,
///     available: true,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod identity;
pub mod notification;
pub mod order;
pub mod product;
