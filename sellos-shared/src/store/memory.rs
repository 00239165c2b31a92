/// In-memory store for tests and local demos
///
/// Holds every table in a `Vec` behind a single `tokio::sync::RwLock`. Each
/// trait method takes the lock once, so compound operations such as token
/// redemption are atomic exactly like their single-statement SQL counterparts.
///
/// Listing order matches Postgres: newest `created_at` first, ties broken by
/// insertion order (later first).
///
/// # Example
///
/// ```
/// use sellos_shared::models::identity::{CreateIdentity, IdentityVariant, Role};
/// use sellos_shared::store::{memory::MemoryStore, IdentityStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let admin = store.create_identity(CreateIdentity {
///     role: Role::Administrator,
///     name: "Ana".into(),
///     last_name: None,
///     national_id: None,
///     phone: None,
///     address: None,
///     email: "ana@sellos-g.com".into(),
///     password_hash: "$argon2id$...".into(),
///     verified: true,
///     verification: None,
/// }).await?;
///
/// let found = store.find_identity_by_email(IdentityVariant::Staff, "ana@sellos-g.com").await?;
/// assert_eq!(found.map(|i| i.id), Some(admin.id));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Catalog, IdentityStore, NotificationStore, OrderStore, Store, StoreError, StoreResult,
};
use crate::models::identity::{CreateIdentity, Identity, IdentityVariant, Role, UpdateIdentity};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::order::{NewOrder, Order, OrderChanges, OrderFilter, OrderStatus};
use crate::models::product::{name_matches, CreateProduct, Product, UpdateProduct};

#[derive(Debug, Default)]
struct Tables {
    staff: Vec<Identity>,
    customers: Vec<Identity>,
    products: Vec<Product>,
    orders: Vec<Order>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn identities(&self, variant: IdentityVariant) -> &Vec<Identity> {
        match variant {
            IdentityVariant::Staff => &self.staff,
            IdentityVariant::Customer => &self.customers,
        }
    }

    fn identities_mut(&mut self, variant: IdentityVariant) -> &mut Vec<Identity> {
        match variant {
            IdentityVariant::Staff => &mut self.staff,
            IdentityVariant::Customer => &mut self.customers,
        }
    }
}

/// Newest first; the stable sort keeps later inserts ahead on equal timestamps
fn newest_first<T: Clone>(rows: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_identity(&self, data: CreateIdentity) -> StoreResult<Identity> {
        let variant = data.role.variant();
        let mut tables = self.tables.write().await;
        let rows = tables.identities_mut(variant);

        if rows.iter().any(|i| i.email == data.email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        if let Some(national_id) = data.national_id.as_deref() {
            if rows.iter().any(|i| i.national_id.as_deref() == Some(national_id)) {
                return Err(StoreError::Conflict("National id already registered".to_string()));
            }
        }

        let now = Utc::now();
        let is_staff = variant == IdentityVariant::Staff;
        let (verification_token_hash, verification_expires_at) = if is_staff {
            (None, None)
        } else {
            data.verification.unzip()
        };

        let identity = Identity {
            id: Uuid::new_v4(),
            variant,
            role: data.role,
            name: data.name,
            last_name: data.last_name.filter(|_| is_staff),
            national_id: data.national_id.filter(|_| is_staff),
            phone: data.phone,
            address: data.address.filter(|_| !is_staff),
            email: data.email,
            password_hash: data.password_hash,
            verified: is_staff || data.verified,
            verification_token_hash,
            verification_expires_at,
            reset_token_hash: None,
            reset_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        rows.push(identity.clone());
        Ok(identity)
    }

    async fn find_identity(&self, variant: IdentityVariant, id: Uuid) -> StoreResult<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.identities(variant).iter().find(|i| i.id == id).cloned())
    }

    async fn find_identity_any(&self, id: Uuid) -> StoreResult<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables
            .staff
            .iter()
            .chain(tables.customers.iter())
            .find(|i| i.id == id)
            .cloned())
    }

    async fn find_identity_by_email(
        &self,
        variant: IdentityVariant,
        email: &str,
    ) -> StoreResult<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.identities(variant).iter().find(|i| i.email == email).cloned())
    }

    async fn list_identities(
        &self,
        variant: IdentityVariant,
        role: Option<Role>,
    ) -> StoreResult<Vec<Identity>> {
        let tables = self.tables.read().await;
        let rows: Vec<Identity> = tables
            .identities(variant)
            .iter()
            .filter(|i| role.map_or(true, |r| i.role == r))
            .cloned()
            .collect();
        Ok(newest_first(&rows, |i| i.created_at))
    }

    async fn update_identity(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        data: UpdateIdentity,
    ) -> StoreResult<Option<Identity>> {
        let mut tables = self.tables.write().await;
        let rows = tables.identities_mut(variant);

        if let Some(email) = data.email.as_deref() {
            if rows.iter().any(|i| i.id != id && i.email == email) {
                return Err(StoreError::Conflict("Email already registered".to_string()));
            }
        }

        let is_staff = variant == IdentityVariant::Staff;
        let Some(identity) = rows.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            identity.name = name;
        }
        if let Some(phone) = data.phone {
            identity.phone = Some(phone);
        }
        if let Some(email) = data.email {
            identity.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            identity.password_hash = password_hash;
        }
        if is_staff {
            if let Some(last_name) = data.last_name {
                identity.last_name = Some(last_name);
            }
            if let Some(national_id) = data.national_id {
                identity.national_id = Some(national_id);
            }
            if let Some(role) = data.role.filter(Role::is_staff) {
                identity.role = role;
            }
        } else if let Some(address) = data.address {
            identity.address = Some(address);
        }
        identity.updated_at = Utc::now();

        Ok(Some(identity.clone()))
    }

    async fn set_password_hash(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        password_hash: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.identities_mut(variant).iter_mut().find(|i| i.id == id) {
            Some(identity) => {
                identity.password_hash = password_hash.to_string();
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_reset_token(
        &self,
        variant: IdentityVariant,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.identities_mut(variant).iter_mut().find(|i| i.id == id) {
            Some(identity) => {
                identity.reset_token_hash = Some(token_hash.to_string());
                identity.reset_expires_at = Some(expires_at);
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn redeem_verification(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>> {
        let mut tables = self.tables.write().await;
        let found = tables.customers.iter_mut().find(|i| {
            i.verification_token_hash.as_deref() == Some(token_hash)
                && i.verification_expires_at.map_or(false, |exp| exp > now)
        });

        Ok(found.map(|identity| {
            identity.verified = true;
            identity.verification_token_hash = None;
            identity.verification_expires_at = None;
            identity.updated_at = Utc::now();
            identity.clone()
        }))
    }

    async fn redeem_password_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>> {
        let mut tables = self.tables.write().await;
        let Tables { staff, customers, .. } = &mut *tables;

        let found = staff.iter_mut().chain(customers.iter_mut()).find(|i| {
            i.reset_token_hash.as_deref() == Some(token_hash)
                && i.reset_expires_at.map_or(false, |exp| exp > now)
        });

        Ok(found.map(|identity| {
            identity.password_hash = new_password_hash.to_string();
            identity.reset_token_hash = None;
            identity.reset_expires_at = None;
            identity.updated_at = Utc::now();
            identity.clone()
        }))
    }

    async fn delete_identity(&self, variant: IdentityVariant, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let rows = tables.identities_mut(variant);
        let before = rows.len();
        rows.retain(|i| i.id != id);
        Ok(rows.len() < before)
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn create_product(&self, data: CreateProduct) -> StoreResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            base_price: data.base_price,
            current_price: data.current_price,
            image_url: data.image_url,
            available: data.available,
            created_at: now,
            updated_at: now,
        };

        self.tables.write().await.products.push(product.clone());
        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.products, |p| p.created_at))
    }

    async fn search_products(&self, term: &str) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Product> = tables
            .products
            .iter()
            .filter(|p| name_matches(&p.name, term))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn update_product(&self, id: Uuid, data: UpdateProduct) -> StoreResult<Option<Product>> {
        let mut tables = self.tables.write().await;
        let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            product.name = name;
        }
        if let Some(description) = data.description {
            product.description = Some(description);
        }
        if let Some(base_price) = data.base_price {
            product.base_price = base_price;
        }
        if let Some(current_price) = data.current_price {
            product.current_price = current_price;
        }
        if let Some(image_url) = data.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(available) = data.available {
            product.available = available;
        }
        product.updated_at = Utc::now();

        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        Ok(tables.products.len() < before)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, data: NewOrder) -> StoreResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            customer_id: data.customer_id,
            assigned_staff_id: data.assigned_staff_id,
            line_items: data.line_items,
            total: data.total,
            status: OrderStatus::Pending,
            staff_note: data.staff_note,
            delivery_date: data.delivery_date,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };

        self.tables.write().await.orders.push(order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>> {
        let tables = self.tables.read().await;
        let rows: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        Ok(newest_first(&rows, |o| o.created_at))
    }

    async fn update_order(&self, id: Uuid, changes: OrderChanges) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.iter_mut().find(|o| o.id == id).map(|order| {
            changes.apply(order);
            order.clone()
        }))
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.iter_mut().find(|o| o.id == id).map(|order| {
            order.status = status;
            order.updated_at = Utc::now();
            order.clone()
        }))
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        Ok(tables.orders.len() < before)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create_notification(&self, data: CreateNotification) -> StoreResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: data.message,
            order_id: data.order_id,
            read: false,
            created_at: Utc::now(),
        };

        self.tables.write().await.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, unread_only: bool) -> StoreResult<Vec<Notification>> {
        let tables = self.tables.read().await;
        let rows: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect();
        Ok(newest_first(&rows, |n| n.created_at))
    }

    async fn mark_notification_read(&self, id: Uuid) -> StoreResult<Option<Notification>> {
        let mut tables = self.tables.write().await;
        Ok(tables.notifications.iter_mut().find(|n| n.id == id).map(|n| {
            n.read = true;
            n.clone()
        }))
    }

    async fn mark_all_notifications_read(&self) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for n in tables.notifications.iter_mut().filter(|n| !n.read) {
            n.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_notification(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.notifications.len();
        tables.notifications.retain(|n| n.id != id);
        Ok(tables.notifications.len() < before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn customer(email: &str, token: Option<(&str, DateTime<Utc>)>) -> CreateIdentity {
        CreateIdentity {
            role: Role::Customer,
            name: "Alice".to_string(),
            last_name: None,
            national_id: None,
            phone: None,
            address: Some("Calle 1".to_string()),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            verified: false,
            verification: token.map(|(h, exp)| (h.to_string(), exp)),
        }
    }

    fn staff(email: &str, role: Role) -> CreateIdentity {
        CreateIdentity {
            role,
            name: "Marta".to_string(),
            last_name: Some("Ruiz".to_string()),
            national_id: None,
            phone: None,
            address: None,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            verified: false,
            verification: None,
        }
    }

    #[tokio::test]
    async fn test_email_unique_per_variant_only() {
        let store = MemoryStore::new();

        store.create_identity(customer("a@x.com", None)).await.unwrap();
        let dup = store.create_identity(customer("a@x.com", None)).await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));

        // Same email is allowed across variants
        let admin = store
            .create_identity(staff("a@x.com", Role::Administrator))
            .await
            .unwrap();
        assert!(admin.verified);

        // Unified lookup prefers staff
        let any = store.find_identity_any(admin.id).await.unwrap().unwrap();
        assert_eq!(any.variant, IdentityVariant::Staff);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = MemoryStore::new();
        store.create_identity(customer("Alice@x.com", None)).await.unwrap();

        assert!(store
            .find_identity_by_email(IdentityVariant::Customer, "alice@x.com")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_identity_by_email(IdentityVariant::Customer, "Alice@x.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_redeem_verification_once() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .create_identity(customer("a@x.com", Some(("digest", now + Duration::hours(1)))))
            .await
            .unwrap();

        let verified = store.redeem_verification("digest", now).await.unwrap().unwrap();
        assert!(verified.verified);
        assert!(verified.verification_token_hash.is_none());

        assert!(store.redeem_verification("digest", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redeem_verification_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .create_identity(customer("a@x.com", Some(("digest", now - Duration::seconds(1)))))
            .await
            .unwrap();

        assert!(store.redeem_verification("digest", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redeem_password_reset_once() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let employee = store
            .create_identity(staff("e@sellos-g.com", Role::Employee))
            .await
            .unwrap();

        store
            .set_reset_token(IdentityVariant::Staff, employee.id, "reset", now + Duration::hours(1))
            .await
            .unwrap();

        let updated = store
            .redeem_password_reset("reset", "new-hash", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert!(updated.reset_token_hash.is_none());

        assert!(store
            .redeem_password_reset("reset", "other-hash", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_identity_ignores_foreign_fields() {
        let store = MemoryStore::new();
        let c = store.create_identity(customer("a@x.com", None)).await.unwrap();

        let updated = store
            .update_identity(
                IdentityVariant::Customer,
                c.id,
                UpdateIdentity {
                    role: Some(Role::Administrator),
                    last_name: Some("Nope".to_string()),
                    address: Some("Calle 2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.role, Role::Customer);
        assert!(updated.last_name.is_none());
        assert_eq!(updated.address.as_deref(), Some("Calle 2"));
    }

    #[tokio::test]
    async fn test_orders_newest_first() {
        let store = MemoryStore::new();
        let customer_id = Uuid::new_v4();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let order = store
                .insert_order(NewOrder {
                    customer_id,
                    assigned_staff_id: None,
                    line_items: vec![],
                    total: Decimal::ZERO,
                    staff_note: None,
                    delivery_date: None,
                    created_by: None,
                })
                .await
                .unwrap();
            ids.push(order.id);
        }

        let listed: Vec<Uuid> = store
            .list_orders(OrderFilter::Customer(customer_id))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);

        assert!(store
            .list_orders(OrderFilter::Customer(Uuid::new_v4()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_notifications_read_flags() {
        let store = MemoryStore::new();
        let a = store
            .create_notification(CreateNotification { message: "a".into(), order_id: None })
            .await
            .unwrap();
        store
            .create_notification(CreateNotification { message: "b".into(), order_id: None })
            .await
            .unwrap();

        store.mark_notification_read(a.id).await.unwrap();
        assert_eq!(store.list_notifications(true).await.unwrap().len(), 1);
        assert_eq!(store.mark_all_notifications_read().await.unwrap(), 1);
        assert!(store.list_notifications(true).await.unwrap().is_empty());
        assert_eq!(store.list_notifications(false).await.unwrap().len(), 2);
        assert!(store.delete_notification(a.id).await.unwrap());
        assert!(!store.delete_notification(a.id).await.unwrap());
    }
}
