/// Postgres implementation of the store traits
///
/// A thin adapter: every method delegates to the model's SQL and maps
/// unique-constraint violations to `StoreError::Conflict`.
///
/// # Example
///
/// ```no_run
/// use sellos_shared::db::pg_store::PgStore;
/// use sellos_shared::db::pool::{create_pool, DatabaseConfig};
/// use sellos_shared::store::Store;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::pool::health_check;
use crate::models::identity::{CreateIdentity, Identity, IdentityVariant, Role, UpdateIdentity};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::order::{NewOrder, Order, OrderChanges, OrderFilter, OrderStatus};
use crate::models::product::{CreateProduct, Product, UpdateProduct};
use crate::store::{
    Catalog, IdentityStore, NotificationStore, OrderStore, Store, StoreError, StoreResult,
};

/// Store backed by a Postgres pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn create_identity(&self, data: CreateIdentity) -> StoreResult<Identity> {
        Identity::create(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn find_identity(&self, variant: IdentityVariant, id: Uuid) -> StoreResult<Option<Identity>> {
        Ok(Identity::find_by_id(&self.pool, variant, id).await?)
    }

    async fn find_identity_any(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        Ok(Identity::find_by_id_any(&self.pool, id).await?)
    }

    async fn find_identity_by_email(
        &self,
        variant: IdentityVariant,
        email: &str,
    ) -> StoreResult<Option<Identity>> {
        Ok(Identity::find_by_email(&self.pool, variant, email).await?)
    }

    async fn list_identities(
        &self,
        variant: IdentityVariant,
        role: Option<Role>,
    ) -> StoreResult<Vec<Identity>> {
        Ok(Identity::list(&self.pool, variant, role).await?)
    }

    async fn update_identity(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        data: UpdateIdentity,
    ) -> StoreResult<Option<Identity>> {
        Identity::update(&self.pool, variant, id, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn set_password_hash(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        password_hash: &str,
    ) -> StoreResult<bool> {
        Ok(Identity::set_password_hash(&self.pool, variant, id, password_hash).await?)
    }

    async fn set_reset_token(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(Identity::set_reset_token(&self.pool, variant, id, token_hash, expires_at).await?)
    }

    async fn redeem_verification(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>> {
        Ok(Identity::redeem_verification(&self.pool, token_hash, now).await?)
    }

    async fn redeem_password_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>> {
        Ok(Identity::redeem_password_reset(&self.pool, token_hash, new_password_hash, now).await?)
    }

    async fn delete_identity(&self, variant: IdentityVariant, id: Uuid) -> StoreResult<bool> {
        Ok(Identity::delete(&self.pool, variant, id).await?)
    }
}

#[async_trait]
impl Catalog for PgStore {
    async fn create_product(&self, data: CreateProduct) -> StoreResult<Product> {
        Ok(Product::create(&self.pool, data).await?)
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(Product::find_by_id(&self.pool, id).await?)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(Product::list(&self.pool).await?)
    }

    async fn search_products(&self, term: &str) -> StoreResult<Vec<Product>> {
        Ok(Product::search(&self.pool, term).await?)
    }

    async fn update_product(&self, id: Uuid, data: UpdateProduct) -> StoreResult<Option<Product>> {
        Ok(Product::update(&self.pool, id, data).await?)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Product::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, data: NewOrder) -> StoreResult<Order> {
        Ok(Order::create(&self.pool, data).await?)
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(Order::find_by_id(&self.pool, id).await?)
    }

    async fn list_orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>> {
        Ok(Order::list(&self.pool, filter).await?)
    }

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> StoreResult<Option<Order>> {
        Ok(Order::update(&self.pool, id, changes).await?)
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
        Ok(Order::set_status(&self.pool, id, status).await?)
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Order::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create_notification(&self, data: CreateNotification) -> StoreResult<Notification> {
        Ok(Notification::create(&self.pool, data).await?)
    }

    async fn list_notifications(&self, unread_only: bool) -> StoreResult<Vec<Notification>> {
        Ok(Notification::list(&self.pool, unread_only).await?)
    }

    async fn mark_notification_read(&self, id: Uuid) -> StoreResult<Option<Notification>> {
        Ok(Notification::mark_read(&self.pool, id).await?)
    }

    async fn mark_all_notifications_read(&self) -> StoreResult<u64> {
        Ok(Notification::mark_all_read(&self.pool).await?)
    }

    async fn delete_notification(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Notification::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
