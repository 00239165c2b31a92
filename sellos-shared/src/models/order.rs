/// Order model and database operations
///
/// An order belongs to one customer, may be assigned to one staff member, and
/// owns its priced line items. Lines are stored as a JSONB array on the order
/// row so an order is always read and written as a unit.
///
/// # Pricing
///
/// Each line carries a snapshot of the product's effective price at write time:
///
/// ```text
/// subtotal = unit_price × quantity
/// total    = Σ subtotal
/// ```
///
/// Lines are only re-priced when an administrator resupplies them.
///
/// # Status
///
/// ```text
/// pending | in_progress | completed | cancelled
/// ```
///
/// Any status can be set from any other; there is no transition graph.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE order_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled');
///
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     customer_id UUID NOT NULL,
///     assigned_staff_id UUID,
///     line_items JSONB NOT NULL,
///     total NUMERIC(14, 2) NOT NULL,
///     status order_status NOT NULL DEFAULT 'pending',
///     staff_note TEXT,
///     delivery_date DATE,
///     created_by UUID,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::identity::Identity;
use super::product::ProductSummary;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Freshly created, not yet worked on
    Pending,

    /// Being produced by the assigned staff member
    InProgress,

    /// Delivered or ready
    Completed,

    /// Abandoned
    Cancelled,
}

impl OrderStatus {
    /// Converts status to its wire/database name
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "in_progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!(
                "Invalid status '{}': expected pending, in_progress, completed or cancelled",
                other
            )),
        }
    }
}

/// One priced line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,

    /// Always at least 1
    pub quantity: i32,

    /// Effective product price at write time
    pub unit_price: Decimal,

    /// `unit_price × quantity`
    pub subtotal: Decimal,
}

/// Largest quantity accepted on a single line
pub const MAX_LINE_QUANTITY: i32 = 100_000;

/// Largest amount the `total` column (`NUMERIC(14, 2)`) can hold
pub fn max_order_total() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

impl LineItem {
    /// Builds a line, computing its subtotal
    ///
    /// Returns `None` when the subtotal overflows or exceeds [`max_order_total`].
    pub fn priced(product_id: Uuid, quantity: i32, unit_price: Decimal) -> Option<Self> {
        let subtotal = unit_price.checked_mul(Decimal::from(quantity))?;
        if subtotal > max_order_total() {
            return None;
        }

        Some(Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// Sum of line subtotals, `None` past [`max_order_total`]
pub fn order_total(lines: &[LineItem]) -> Option<Decimal> {
    let total = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.subtotal))?;
    (total <= max_order_total()).then_some(total)
}

/// Stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub assigned_staff_id: Option<Uuid>,
    pub line_items: Vec<LineItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub staff_note: Option<String>,
    pub delivery_date: Option<NaiveDate>,

    /// Administrator who created the order
    pub created_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully validated and priced order ready to insert
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub assigned_staff_id: Option<Uuid>,
    pub line_items: Vec<LineItem>,
    pub total: Decimal,
    pub staff_note: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
}

/// Validated changes for a full order update
///
/// `None` leaves a field untouched. The nested options distinguish "clear" from
/// "keep" for nullable columns.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub customer_id: Option<Uuid>,
    pub assigned_staff_id: Option<Option<Uuid>>,

    /// Re-priced lines with their new total
    pub line_items: Option<(Vec<LineItem>, Decimal)>,

    pub status: Option<OrderStatus>,
    pub staff_note: Option<Option<String>>,
    pub delivery_date: Option<Option<NaiveDate>>,
}

impl OrderChanges {
    /// Applies the changes to an in-memory order
    pub fn apply(self, order: &mut Order) {
        if let Some(customer_id) = self.customer_id {
            order.customer_id = customer_id;
        }
        if let Some(assigned) = self.assigned_staff_id {
            order.assigned_staff_id = assigned;
        }
        if let Some((lines, total)) = self.line_items {
            order.line_items = lines;
            order.total = total;
        }
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(note) = self.staff_note {
            order.staff_note = note;
        }
        if let Some(delivery_date) = self.delivery_date {
            order.delivery_date = delivery_date;
        }
        order.updated_at = Utc::now();
    }
}

/// Which orders a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFilter {
    /// Every order
    All,

    /// Orders assigned to a staff member
    AssignedTo(Uuid),

    /// Orders placed for a customer
    Customer(Uuid),
}

impl OrderFilter {
    /// Whether an order belongs in this listing
    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::AssignedTo(staff_id) => order.assigned_staff_id == Some(*staff_id),
            OrderFilter::Customer(customer_id) => order.customer_id == *customer_id,
        }
    }
}

/// Person summary embedded in expanded orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySummary {
    pub id: Uuid,
    pub name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&Identity> for PartySummary {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            last_name: identity.last_name.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
        }
    }
}

/// Line item with its product expanded
///
/// `product` is `None` once the product has been deleted; the snapshot stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemView {
    pub product_id: Uuid,
    pub product: Option<ProductSummary>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Order as returned by the API, references expanded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer: Option<PartySummary>,
    pub assigned_staff_id: Option<Uuid>,
    pub assigned_staff: Option<PartySummary>,
    pub line_items: Vec<LineItemView>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub staff_note: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    assigned_staff_id: Option<Uuid>,
    line_items: Json<Vec<LineItem>>,
    total: Decimal,
    status: OrderStatus,
    staff_note: Option<String>,
    delivery_date: Option<NaiveDate>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            assigned_staff_id: row.assigned_staff_id,
            line_items: row.line_items.0,
            total: row.total,
            status: row.status,
            staff_note: row.staff_note,
            delivery_date: row.delivery_date,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, assigned_staff_id, line_items, total, status, \
     staff_note, delivery_date, created_by, created_at, updated_at";

impl Order {
    /// Inserts a priced order with status `pending`
    pub async fn create(pool: &PgPool, data: NewOrder) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (customer_id, assigned_staff_id, line_items, total, status, \
             staff_note, delivery_date, created_by) \
             VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7) RETURNING {}",
            ORDER_COLUMNS
        );

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(data.customer_id)
            .bind(data.assigned_staff_id)
            .bind(Json(data.line_items))
            .bind(data.total)
            .bind(data.staff_note)
            .bind(data.delivery_date)
            .bind(data.created_by)
            .fetch_one(pool)
            .await?;

        Ok(row.into())
    }

    /// Finds an order by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Lists orders matching a filter, newest first
    pub async fn list(pool: &PgPool, filter: OrderFilter) -> Result<Vec<Self>, sqlx::Error> {
        let rows = match filter {
            OrderFilter::All => {
                let query = format!("SELECT {} FROM orders ORDER BY created_at DESC", ORDER_COLUMNS);
                sqlx::query_as::<_, OrderRow>(&query).fetch_all(pool).await?
            }
            OrderFilter::AssignedTo(staff_id) => {
                let query = format!(
                    "SELECT {} FROM orders WHERE assigned_staff_id = $1 ORDER BY created_at DESC",
                    ORDER_COLUMNS
                );
                sqlx::query_as::<_, OrderRow>(&query)
                    .bind(staff_id)
                    .fetch_all(pool)
                    .await?
            }
            OrderFilter::Customer(customer_id) => {
                let query = format!(
                    "SELECT {} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC",
                    ORDER_COLUMNS
                );
                sqlx::query_as::<_, OrderRow>(&query)
                    .bind(customer_id)
                    .fetch_all(pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Applies a full update in one statement
    ///
    /// Returns `None` if the order does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: OrderChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE orders SET updated_at = NOW()");
        let mut bind_count = 1;

        if changes.customer_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", customer_id = ${}", bind_count));
        }
        if changes.assigned_staff_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_staff_id = ${}", bind_count));
        }
        if changes.line_items.is_some() {
            bind_count += 1;
            query.push_str(&format!(", line_items = ${}", bind_count));
            bind_count += 1;
            query.push_str(&format!(", total = ${}", bind_count));
        }
        if changes.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if changes.staff_note.is_some() {
            bind_count += 1;
            query.push_str(&format!(", staff_note = ${}", bind_count));
        }
        if changes.delivery_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", delivery_date = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", ORDER_COLUMNS));

        let mut q = sqlx::query_as::<_, OrderRow>(&query).bind(id);

        if let Some(customer_id) = changes.customer_id {
            q = q.bind(customer_id);
        }
        if let Some(assigned) = changes.assigned_staff_id {
            q = q.bind(assigned);
        }
        if let Some((lines, total)) = changes.line_items {
            q = q.bind(Json(lines)).bind(total);
        }
        if let Some(status) = changes.status {
            q = q.bind(status);
        }
        if let Some(note) = changes.staff_note {
            q = q.bind(note);
        }
        if let Some(delivery_date) = changes.delivery_date {
            q = q.bind(delivery_date);
        }

        let row = q.fetch_optional(pool).await?;

        Ok(row.map(Into::into))
    }

    /// Sets only the status
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ORDER_COLUMNS
        );
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Hard-deletes an order
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
