/// Product model and database operations
///
/// Products are the catalogue the order workflow prices against. An order line
/// snapshots the product's effective price at write time; later price changes
/// never touch existing orders.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     base_price NUMERIC(12, 2) NOT NULL CHECK (base_price >= 0),
///     current_price NUMERIC(12, 2) CHECK (current_price >= 0),
///     image_url TEXT,
///     available BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Largest price the price columns (`NUMERIC(12, 2)`) can hold
pub fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Catalogue product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// List price
    pub base_price: Decimal,

    /// Promotional price; a zero or missing value falls back to `base_price`
    pub current_price: Option<Decimal>,

    pub image_url: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price an order line is snapshotted at
    ///
    /// # Example
    ///
    /// ```
    /// # use sellos_shared::models::product::Product;
    /// # use rust_decimal::Decimal;
    /// # use chrono::Utc;
    /// # use uuid::Uuid;
    /// let mut product = Product {
    ///     id: Uuid::new_v4(),
    ///     name: "Sello redondo".into(),
    ///     description: None,
    ///     base_price: Decimal::new(1500, 2),
    ///     current_price: Some(Decimal::new(1000, 2)),
    ///     image_url: None,
    ///     available: true,
    ///     created_at: Utc::now(),
    ///     updated_at: Utc::now(),
    /// };
    /// assert_eq!(product.effective_price(), Decimal::new(1000, 2));
    ///
    /// product.current_price = None;
    /// assert_eq!(product.effective_price(), Decimal::new(1500, 2));
    /// ```
    pub fn effective_price(&self) -> Decimal {
        match self.current_price {
            Some(price) if !price.is_zero() => price,
            _ => self.base_price,
        }
    }
}

/// Short product view embedded in expanded orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub base_price: Decimal,
    pub current_price: Option<Decimal>,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            base_price: product.base_price,
            current_price: product.current_price,
            image_url: product.image_url.clone(),
        }
    }
}

/// Input for creating a product
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub current_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub available: bool,
}

/// Input for updating a product
///
/// `current_price: Some(None)` clears the promotional price.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Decimal>,
    pub current_price: Option<Option<Decimal>>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, base_price, current_price, image_url, available, created_at, updated_at";

impl Product {
    /// Inserts a new product
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, description, base_price, current_price, image_url, available) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PRODUCT_COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.base_price)
            .bind(data.current_price)
            .bind(data.image_url)
            .bind(data.available)
            .fetch_one(pool)
            .await
    }

    /// Finds a product by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists every product, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM products ORDER BY created_at DESC", PRODUCT_COLUMNS);

        sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
    }

    /// Case-insensitive substring search on the product name
    pub async fn search(pool: &PgPool, term: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM products WHERE name ILIKE $1 ORDER BY name ASC",
            PRODUCT_COLUMNS
        );
        let pattern = format!("%{}%", escape_like(term));

        sqlx::query_as::<_, Product>(&query)
            .bind(pattern)
            .fetch_all(pool)
            .await
    }

    /// Updates a product; only `Some` fields are written
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE products SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.base_price.is_some() {
            bind_count += 1;
            query.push_str(&format!(", base_price = ${}", bind_count));
        }
        if data.current_price.is_some() {
            bind_count += 1;
            query.push_str(&format!(", current_price = ${}", bind_count));
        }
        if data.image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image_url = ${}", bind_count));
        }
        if data.available.is_some() {
            bind_count += 1;
            query.push_str(&format!(", available = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", PRODUCT_COLUMNS));

        let mut q = sqlx::query_as::<_, Product>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(base_price) = data.base_price {
            q = q.bind(base_price);
        }
        if let Some(current_price) = data.current_price {
            q = q.bind(current_price);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }
        if let Some(available) = data.available {
            q = q.bind(available);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a product; existing order lines keep their snapshot
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escapes LIKE wildcards so a search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Search predicate shared with the in-memory store
pub fn name_matches(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(base: i64, current: Option<i64>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Sello".to_string(),
            description: None,
            base_price: Decimal::from(base),
            current_price: current.map(Decimal::from),
            image_url: None,
            available: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_current() {
        assert_eq!(product(15, Some(10)).effective_price(), Decimal::from(10));
    }

    #[test]
    fn test_effective_price_falls_back_to_base() {
        assert_eq!(product(15, None).effective_price(), Decimal::from(15));
        assert_eq!(product(15, Some(0)).effective_price(), Decimal::from(15));
    }

    #[test]
    fn test_max_price_matches_column() {
        assert_eq!(max_price().to_string(), "9999999999.99");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("sello"), "sello");
    }

    #[test]
    fn test_name_matches() {
        assert!(name_matches("Sello Automático", "sello"));
        assert!(name_matches("Sello Automático", "AUTO"));
        assert!(!name_matches("Tinta", "sello"));
    }
}
