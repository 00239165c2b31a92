/// Persistence seams
///
/// Handlers and the order workflow talk to storage only through these traits.
/// Two implementations exist:
///
/// - [`crate::db::pg_store::PgStore`]: Postgres via sqlx, used by the server
/// - [`memory::MemoryStore`]: in-process maps, used by tests and demos
///
/// Every method is a single logical write or read. Action token redemption is
/// the one compound operation, and each implementation performs it atomically.
///
/// # Example
///
/// ```
/// use sellos_shared::store::{memory::MemoryStore, Catalog};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// assert!(store.list_products().await?.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::identity::{CreateIdentity, Identity, IdentityVariant, Role, UpdateIdentity};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::order::{NewOrder, Order, OrderChanges, OrderFilter, OrderStatus};
use crate::models::product::{CreateProduct, Product, UpdateProduct};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Maps unique violations to `Conflict`, everything else to `Database`
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(constraint) = db_err.constraint() {
                if constraint.contains("email") {
                    return StoreError::Conflict("Email already registered".to_string());
                }
                if constraint.contains("national_id") {
                    return StoreError::Conflict("National id already registered".to_string());
                }
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Staff and customer credentials
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Inserts an identity into the table matching its role
    ///
    /// Fails with `Conflict` if the email is already used within that table.
    async fn create_identity(&self, data: CreateIdentity) -> StoreResult<Identity>;

    async fn find_identity(&self, variant: IdentityVariant, id: Uuid) -> StoreResult<Option<Identity>>;

    /// Looks up an id in staff, then customers
    async fn find_identity_any(&self, id: Uuid) -> StoreResult<Option<Identity>>;

    /// Exact, case-sensitive email match within one table
    async fn find_identity_by_email(
        &self,
        variant: IdentityVariant,
        email: &str,
    ) -> StoreResult<Option<Identity>>;

    /// Newest first, optionally restricted to a role
    async fn list_identities(
        &self,
        variant: IdentityVariant,
        role: Option<Role>,
    ) -> StoreResult<Vec<Identity>>;

    async fn update_identity(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        data: UpdateIdentity,
    ) -> StoreResult<Option<Identity>>;

    async fn set_password_hash(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        password_hash: &str,
    ) -> StoreResult<bool>;

    /// Records a pending reset token digest, replacing any earlier one
    async fn set_reset_token(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Atomically verifies the customer holding an unexpired token and clears it
    async fn redeem_verification(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>>;

    /// Atomically sets the password of the identity holding an unexpired reset
    /// token and clears it
    async fn redeem_password_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>>;

    async fn delete_identity(&self, variant: IdentityVariant, id: Uuid) -> StoreResult<bool>;
}

/// Product catalogue
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn create_product(&self, data: CreateProduct) -> StoreResult<Product>;

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Case-insensitive substring match on the name
    async fn search_products(&self, term: &str) -> StoreResult<Vec<Product>>;

    async fn update_product(&self, id: Uuid, data: UpdateProduct) -> StoreResult<Option<Product>>;

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
}

/// Orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts an already validated and priced order with status `pending`
    async fn insert_order(&self, data: NewOrder) -> StoreResult<Order>;

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>>;

    /// Newest first by `created_at`
    async fn list_orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>>;

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> StoreResult<Option<Order>>;

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>>;

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool>;
}

/// Back-office notifications
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, data: CreateNotification) -> StoreResult<Notification>;

    /// Newest first
    async fn list_notifications(&self, unread_only: bool) -> StoreResult<Vec<Notification>>;

    async fn mark_notification_read(&self, id: Uuid) -> StoreResult<Option<Notification>>;

    async fn mark_all_notifications_read(&self) -> StoreResult<u64>;

    async fn delete_notification(&self, id: Uuid) -> StoreResult<bool>;
}

/// Everything the API needs from storage
#[async_trait]
pub trait Store: IdentityStore + Catalog + OrderStore + NotificationStore {
    /// Cheap liveness probe of the backing storage
    async fn ping(&self) -> StoreResult<()>;
}
