/// Order pricing and state workflow
///
/// Creating or re-lining an order resolves every product, snapshots its
/// effective price, and computes subtotals and the total. All validation
/// happens before the first write, so a rejected request leaves nothing behind.
///
/// # Operations
///
/// | Operation | Caller | Notes |
/// |---|---|---|
/// | [`OrderWorkflow::create`] | administrator | status starts `pending`, notification recorded |
/// | [`OrderWorkflow::update`] | administrator | lines re-priced only when a non-empty list is supplied |
/// | [`OrderWorkflow::update_status`] | assigned staff | only `status` changes |
/// | [`OrderWorkflow::delete`] | administrator | hard delete |
/// | [`OrderWorkflow::list`] / [`OrderWorkflow::get`] | any | scoped by role |
///
/// Role guards are applied by the HTTP layer; this module enforces the rules
/// that need the order itself (assignee, ownership).
///
/// # Example
///
/// ```
/// use sellos_shared::store::memory::MemoryStore;
/// use sellos_shared::workflow::orders::{CreateOrder, LineRequest, OrderWorkflow, WorkflowError};
/// use uuid::Uuid;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let workflow = OrderWorkflow::new(&store);
///
/// let result = workflow.create(CreateOrder {
///     customer_id: Uuid::new_v4(),
///     assigned_staff_id: None,
///     line_items: vec![LineRequest { product_id: Uuid::new_v4(), quantity: 1 }],
///     staff_note: None,
///     delivery_date: None,
/// }, None).await;
///
/// assert!(matches!(result, Err(WorkflowError::BadRequest(_))));
/// # }
/// ```

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::authorization::{require_assignee, require_order_access, AuthzError};
use crate::auth::middleware::AuthContext;
use crate::models::identity::IdentityVariant;
use crate::models::notification::CreateNotification;
use crate::models::order::{
    max_order_total, order_total, LineItem, LineItemView, NewOrder, Order, OrderChanges,
    OrderFilter, OrderStatus, OrderView, PartySummary, MAX_LINE_QUANTITY,
};
use crate::models::product::ProductSummary;
use crate::store::{Store, StoreError};

/// Error type for order operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Invalid input or a reference that does not resolve
    #[error("{0}")]
    BadRequest(String),

    /// Caller may not perform this operation on this order
    #[error("{0}")]
    Forbidden(String),

    /// Order does not exist
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthzError> for WorkflowError {
    fn from(err: AuthzError) -> Self {
        WorkflowError::Forbidden(err.to_string())
    }
}

/// Requested order line, before pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Order creation input
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: Uuid,
    pub assigned_staff_id: Option<Uuid>,
    pub line_items: Vec<LineRequest>,
    pub staff_note: Option<String>,
    pub delivery_date: Option<NaiveDate>,
}

/// Full update input; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct UpdateOrder {
    pub customer_id: Option<Uuid>,

    /// `Some(None)` clears the assignment
    pub assigned_staff_id: Option<Option<Uuid>>,

    /// Replaces and re-prices the lines when non-empty
    pub line_items: Option<Vec<LineRequest>>,

    pub status: Option<OrderStatus>,

    /// `Some(None)` clears the note
    pub staff_note: Option<Option<String>>,

    /// `Some(None)` clears the delivery date
    pub delivery_date: Option<Option<NaiveDate>>,
}

/// Order workflow over a store
pub struct OrderWorkflow<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> OrderWorkflow<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolves every line against the catalogue and prices it
    ///
    /// Fails on an empty list, a quantity out of range, an unknown product, or a
    /// total the order columns cannot hold.
    async fn price_lines(&self, requests: &[LineRequest]) -> Result<(Vec<LineItem>, Decimal), WorkflowError> {
        if requests.is_empty() {
            return Err(WorkflowError::BadRequest(
                "An order needs at least one line item".to_string(),
            ));
        }
        if let Some(bad) = requests.iter().find(|line| line.quantity < 1) {
            return Err(WorkflowError::BadRequest(format!(
                "Quantity for product {} must be at least 1",
                bad.product_id
            )));
        }
        if let Some(bad) = requests.iter().find(|line| line.quantity > MAX_LINE_QUANTITY) {
            return Err(WorkflowError::BadRequest(format!(
                "Quantity for product {} must be at most {}",
                bad.product_id, MAX_LINE_QUANTITY
            )));
        }

        let mut lines = Vec::with_capacity(requests.len());
        for request in requests {
            let product = self
                .store
                .find_product(request.product_id)
                .await?
                .ok_or_else(|| {
                    WorkflowError::BadRequest(format!("Product {} not found", request.product_id))
                })?;

            let line = LineItem::priced(product.id, request.quantity, product.effective_price())
                .ok_or_else(|| {
                    WorkflowError::BadRequest(format!(
                        "Line total for product {} is too large",
                        product.id
                    ))
                })?;
            lines.push(line);
        }

        let total = order_total(&lines).ok_or_else(|| {
            WorkflowError::BadRequest(format!(
                "Order total exceeds the maximum of {}",
                max_order_total()
            ))
        })?;
        Ok((lines, total))
    }

    async fn require_customer(&self, customer_id: Uuid) -> Result<PartySummary, WorkflowError> {
        self.store
            .find_identity(IdentityVariant::Customer, customer_id)
            .await?
            .map(|c| PartySummary::from(&c))
            .ok_or_else(|| WorkflowError::BadRequest("Customer not found".to_string()))
    }

    async fn require_staff(&self, staff_id: Uuid) -> Result<(), WorkflowError> {
        match self.store.find_identity(IdentityVariant::Staff, staff_id).await? {
            Some(_) => Ok(()),
            None => Err(WorkflowError::BadRequest("Employee not found".to_string())),
        }
    }

    async fn require_order(&self, id: Uuid) -> Result<Order, WorkflowError> {
        self.store
            .find_order(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("Order not found".to_string()))
    }

    /// Validates, prices and persists a new order
    pub async fn create(&self, input: CreateOrder, created_by: Option<Uuid>) -> Result<OrderView, WorkflowError> {
        let customer = self.require_customer(input.customer_id).await?;
        if let Some(staff_id) = input.assigned_staff_id {
            self.require_staff(staff_id).await?;
        }
        let (line_items, total) = self.price_lines(&input.line_items).await?;

        let order = self
            .store
            .insert_order(NewOrder {
                customer_id: input.customer_id,
                assigned_staff_id: input.assigned_staff_id,
                line_items,
                total,
                staff_note: input.staff_note,
                delivery_date: input.delivery_date,
                created_by,
            })
            .await?;

        tracing::info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            total = %order.total,
            lines = order.line_items.len(),
            "Order created"
        );

        // The order stands even if the feed entry cannot be written
        if let Err(e) = self
            .store
            .create_notification(CreateNotification::order_created(order.id, &customer.name))
            .await
        {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to record order notification");
        }

        self.expand(order).await
    }

    /// Full administrative update
    pub async fn update(&self, id: Uuid, input: UpdateOrder) -> Result<OrderView, WorkflowError> {
        self.require_order(id).await?;

        if let Some(customer_id) = input.customer_id {
            self.require_customer(customer_id).await?;
        }
        if let Some(Some(staff_id)) = input.assigned_staff_id {
            self.require_staff(staff_id).await?;
        }

        let line_items = match input.line_items {
            Some(requests) if !requests.is_empty() => Some(self.price_lines(&requests).await?),
            _ => None,
        };

        let changes = OrderChanges {
            customer_id: input.customer_id,
            assigned_staff_id: input.assigned_staff_id,
            line_items,
            status: input.status,
            staff_note: input.staff_note,
            delivery_date: input.delivery_date,
        };

        let order = self
            .store
            .update_order(id, changes)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("Order not found".to_string()))?;

        tracing::info!(order_id = %order.id, total = %order.total, "Order updated");

        self.expand(order).await
    }

    /// Status change by the assigned staff member
    pub async fn update_status(
        &self,
        auth: &AuthContext,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderView, WorkflowError> {
        let order = self.require_order(id).await?;

        if let Err(e) = require_assignee(auth, &order) {
            tracing::debug!(
                order_id = %id,
                identity_id = %auth.identity_id,
                "Status update by non-assignee rejected"
            );
            return Err(WorkflowError::Forbidden(format!(
                "Only the assigned employee can change this order's status ({})",
                e
            )));
        }

        let order = self
            .store
            .set_order_status(id, status)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("Order not found".to_string()))?;

        tracing::info!(order_id = %order.id, status = status.as_str(), "Order status changed");

        self.expand(order).await
    }

    /// Hard-deletes an order
    pub async fn delete(&self, id: Uuid) -> Result<(), WorkflowError> {
        if self.store.delete_order(id).await? {
            tracing::info!(order_id = %id, "Order deleted");
            Ok(())
        } else {
            Err(WorkflowError::NotFound("Order not found".to_string()))
        }
    }

    /// Single order, visible to admins, its assignee and its customer
    pub async fn get(&self, auth: &AuthContext, id: Uuid) -> Result<OrderView, WorkflowError> {
        let order = self.require_order(id).await?;
        require_order_access(auth, &order)?;
        self.expand(order).await
    }

    /// Orders for a listing, newest first, expanded
    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<OrderView>, WorkflowError> {
        let orders = self.store.list_orders(filter).await?;
        self.expand_many(orders).await
    }

    async fn expand(&self, order: Order) -> Result<OrderView, WorkflowError> {
        let mut views = self.expand_many(vec![order]).await?;
        views
            .pop()
            .ok_or_else(|| WorkflowError::NotFound("Order not found".to_string()))
    }

    /// Populates customer, staff and product references
    ///
    /// Each distinct id is fetched once per call. Dangling references expand to
    /// `None` rather than failing.
    async fn expand_many(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, WorkflowError> {
        let mut customers: HashMap<Uuid, Option<PartySummary>> = HashMap::new();
        let mut staff: HashMap<Uuid, Option<PartySummary>> = HashMap::new();
        let mut products: HashMap<Uuid, Option<ProductSummary>> = HashMap::new();

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            if !customers.contains_key(&order.customer_id) {
                let found = self
                    .store
                    .find_identity(IdentityVariant::Customer, order.customer_id)
                    .await?
                    .map(|c| PartySummary::from(&c));
                customers.insert(order.customer_id, found);
            }
            if let Some(staff_id) = order.assigned_staff_id {
                if !staff.contains_key(&staff_id) {
                    let found = self
                        .store
                        .find_identity(IdentityVariant::Staff, staff_id)
                        .await?
                        .map(|s| PartySummary::from(&s));
                    staff.insert(staff_id, found);
                }
            }
            for line in &order.line_items {
                if !products.contains_key(&line.product_id) {
                    let found = self
                        .store
                        .find_product(line.product_id)
                        .await?
                        .map(|p| ProductSummary::from(&p));
                    products.insert(line.product_id, found);
                }
            }

            let line_items = order
                .line_items
                .iter()
                .map(|line| LineItemView {
                    product_id: line.product_id,
                    product: products.get(&line.product_id).cloned().flatten(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                })
                .collect();

            views.push(OrderView {
                id: order.id,
                customer_id: order.customer_id,
                customer: customers.get(&order.customer_id).cloned().flatten(),
                assigned_staff_id: order.assigned_staff_id,
                assigned_staff: order
                    .assigned_staff_id
                    .and_then(|id| staff.get(&id).cloned().flatten()),
                line_items,
                total: order.total,
                status: order.status,
                staff_note: order.staff_note,
                delivery_date: order.delivery_date,
                created_by: order.created_by,
                created_at: order.created_at,
                updated_at: order.updated_at,
            });
        }

        Ok(views)
    }
}
