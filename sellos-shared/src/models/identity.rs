/// Identity model and database operations
///
/// Staff (administrators and employees) and customers live in two disjoint
/// tables with the same credential shape. Both are loaded into one [`Identity`]
/// type tagged with an [`IdentityVariant`], so authentication code never has to
/// care which table a principal came from.
///
/// Email uniqueness is scoped per table: an administrator and a customer may
/// share an address. Login resolves staff first.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE identity_role AS ENUM ('administrator', 'employee', 'customer');
///
/// CREATE TABLE staff (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     last_name VARCHAR(255),
///     national_id VARCHAR(64) UNIQUE,
///     phone VARCHAR(64),
///     email VARCHAR(255) NOT NULL,
///     role identity_role NOT NULL DEFAULT 'employee',
///     password_hash VARCHAR(255) NOT NULL,
///     reset_token_hash CHAR(64),
///     reset_expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT staff_email_key UNIQUE (email)
/// );
///
/// CREATE TABLE customers (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     phone VARCHAR(64),
///     address TEXT,
///     role identity_role NOT NULL DEFAULT 'customer',
///     password_hash VARCHAR(255) NOT NULL,
///     verified BOOLEAN NOT NULL DEFAULT FALSE,
///     verification_token_hash CHAR(64),
///     verification_expires_at TIMESTAMPTZ,
///     reset_token_hash CHAR(64),
///     reset_expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT customers_email_key UNIQUE (email)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role carried by every identity and embedded in session tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "identity_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full back-office access
    Administrator,

    /// Works assigned orders and the catalogue
    Employee,

    /// Self-registered storefront customer
    Customer,
}

impl Role {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Employee => "employee",
            Role::Customer => "customer",
        }
    }

    /// Table the role is stored in
    pub fn variant(&self) -> IdentityVariant {
        match self {
            Role::Administrator | Role::Employee => IdentityVariant::Staff,
            Role::Customer => IdentityVariant::Customer,
        }
    }

    /// Administrators and employees
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Administrator | Role::Employee)
    }
}

/// Which identity table a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityVariant {
    /// `staff` table
    Staff,

    /// `customers` table
    Customer,
}

impl IdentityVariant {
    /// Table name for this variant
    pub fn table(&self) -> &'static str {
        match self {
            IdentityVariant::Staff => "staff",
            IdentityVariant::Customer => "customers",
        }
    }
}

/// An authenticated principal: a staff member or a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique id (UUID v4)
    pub id: Uuid,

    /// Table the identity lives in
    pub variant: IdentityVariant,

    /// Role (administrator/employee for staff, customer for customers)
    pub role: Role,

    /// Display name
    pub name: String,

    /// Staff only
    pub last_name: Option<String>,

    /// Staff only
    pub national_id: Option<String>,

    /// Contact phone
    pub phone: Option<String>,

    /// Customers only
    pub address: Option<String>,

    /// Email, unique within the variant, matched case-sensitively
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the email was verified; always true for staff
    pub verified: bool,

    /// SHA-256 of the pending verification token
    #[serde(skip_serializing)]
    pub verification_token_hash: Option<String>,

    /// Expiry of the pending verification token
    #[serde(skip_serializing)]
    pub verification_expires_at: Option<DateTime<Utc>>,

    /// SHA-256 of the pending reset token
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,

    /// Expiry of the pending reset token
    #[serde(skip_serializing)]
    pub reset_expires_at: Option<DateTime<Utc>>,

    /// When the identity was created
    pub created_at: DateTime<Utc>,

    /// When the identity was last updated
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Full display name (`name last_name` for staff)
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.name, last),
            _ => self.name.clone(),
        }
    }
}

/// Input for creating an identity
///
/// `password_hash` must already be hashed; see `auth::password`.
#[derive(Debug, Clone)]
pub struct CreateIdentity {
    pub role: Role,
    pub name: String,
    pub last_name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: String,
    pub password_hash: String,

    /// Ignored for staff, who are always verified
    pub verified: bool,

    /// Pending verification token digest and expiry (customers only)
    pub verification: Option<(String, DateTime<Utc>)>,
}

/// Input for updating an identity
///
/// Only `Some` fields are written. `role` only applies to staff.
#[derive(Debug, Clone, Default)]
pub struct UpdateIdentity {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// Column list shared by every staff query
const STAFF_COLUMNS: &str = "id, role, name, last_name, national_id, phone, NULL::text AS address, \
     email, password_hash, TRUE AS verified, NULL::text AS verification_token_hash, \
     NULL::timestamptz AS verification_expires_at, reset_token_hash, reset_expires_at, \
     created_at, updated_at";

/// Column list shared by every customer query
const CUSTOMER_COLUMNS: &str = "id, role, name, NULL::text AS last_name, NULL::text AS national_id, \
     phone, address, email, password_hash, verified, verification_token_hash, \
     verification_expires_at, reset_token_hash, reset_expires_at, created_at, updated_at";

fn columns(variant: IdentityVariant) -> &'static str {
    match variant {
        IdentityVariant::Staff => STAFF_COLUMNS,
        IdentityVariant::Customer => CUSTOMER_COLUMNS,
    }
}

/// Raw row; the variant is known from the table queried
#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    role: Role,
    name: String,
    last_name: Option<String>,
    national_id: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    email: String,
    password_hash: String,
    verified: bool,
    verification_token_hash: Option<String>,
    verification_expires_at: Option<DateTime<Utc>>,
    reset_token_hash: Option<String>,
    reset_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IdentityRow {
    fn into_identity(self, variant: IdentityVariant) -> Identity {
        Identity {
            id: self.id,
            variant,
            role: self.role,
            name: self.name,
            last_name: self.last_name,
            national_id: self.national_id,
            phone: self.phone,
            address: self.address,
            email: self.email,
            password_hash: self.password_hash,
            verified: self.verified,
            verification_token_hash: self.verification_token_hash,
            verification_expires_at: self.verification_expires_at,
            reset_token_hash: self.reset_token_hash,
            reset_expires_at: self.reset_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Identity {
    /// Inserts a new identity into the table matching its role
    ///
    /// # Errors
    ///
    /// Returns a database error on unique violations (email, national id) or
    /// connection failure.
    pub async fn create(pool: &PgPool, data: CreateIdentity) -> Result<Self, sqlx::Error> {
        let variant = data.role.variant();

        let row = match variant {
            IdentityVariant::Staff => {
                let query = format!(
                    "INSERT INTO staff (role, name, last_name, national_id, phone, email, password_hash) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
                    STAFF_COLUMNS
                );
                sqlx::query_as::<_, IdentityRow>(&query)
                    .bind(data.role)
                    .bind(data.name)
                    .bind(data.last_name)
                    .bind(data.national_id)
                    .bind(data.phone)
                    .bind(data.email)
                    .bind(data.password_hash)
                    .fetch_one(pool)
                    .await?
            }
            IdentityVariant::Customer => {
                let (token_hash, expires_at) = data.verification.unzip();
                let query = format!(
                    "INSERT INTO customers (name, phone, address, email, password_hash, verified, \
                     verification_token_hash, verification_expires_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
                    CUSTOMER_COLUMNS
                );
                sqlx::query_as::<_, IdentityRow>(&query)
                    .bind(data.name)
                    .bind(data.phone)
                    .bind(data.address)
                    .bind(data.email)
                    .bind(data.password_hash)
                    .bind(data.verified)
                    .bind(token_hash)
                    .bind(expires_at)
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(row.into_identity(variant))
    }

    /// Finds an identity by id within one table
    pub async fn find_by_id(
        pool: &PgPool,
        variant: IdentityVariant,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", columns(variant), variant.table());
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_identity(variant)))
    }

    /// Finds an identity by id in either table, staff first
    pub async fn find_by_id_any(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        if let Some(staff) = Self::find_by_id(pool, IdentityVariant::Staff, id).await? {
            return Ok(Some(staff));
        }
        Self::find_by_id(pool, IdentityVariant::Customer, id).await
    }

    /// Finds an identity by exact email within one table
    ///
    /// No case folding or trimming is applied.
    pub async fn find_by_email(
        pool: &PgPool,
        variant: IdentityVariant,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM {} WHERE email = $1", columns(variant), variant.table());
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_identity(variant)))
    }

    /// Lists identities of one table, optionally filtered by role, newest first
    pub async fn list(
        pool: &PgPool,
        variant: IdentityVariant,
        role: Option<Role>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} WHERE ($1::identity_role IS NULL OR role = $1) ORDER BY created_at DESC",
            columns(variant),
            variant.table()
        );
        let rows = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(role)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_identity(variant)).collect())
    }

    /// Updates an identity; only `Some` fields are written
    ///
    /// Returns `None` if the identity does not exist.
    pub async fn update(
        pool: &PgPool,
        variant: IdentityVariant,
        id: Uuid,
        data: UpdateIdentity,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = format!("UPDATE {} SET updated_at = NOW()", variant.table());
        let mut bind_count = 1;

        let is_staff = variant == IdentityVariant::Staff;
        let is_customer = variant == IdentityVariant::Customer;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if is_staff && data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${}", bind_count));
        }
        if is_staff && data.national_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", national_id = ${}", bind_count));
        }
        if data.phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone = ${}", bind_count));
        }
        if is_customer && data.address.is_some() {
            bind_count += 1;
            query.push_str(&format!(", address = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        let staff_role = data.role.filter(|r| is_staff && r.is_staff());
        if staff_role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", columns(variant)));

        let mut q = sqlx::query_as::<_, IdentityRow>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if is_staff {
            if let Some(last_name) = data.last_name {
                q = q.bind(last_name);
            }
            if let Some(national_id) = data.national_id {
                q = q.bind(national_id);
            }
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }
        if is_customer {
            if let Some(address) = data.address {
                q = q.bind(address);
            }
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(role) = staff_role {
            q = q.bind(role);
        }

        let row = q.fetch_optional(pool).await?;

        Ok(row.map(|r| r.into_identity(variant)))
    }

    /// Overwrites the password hash
    ///
    /// Returns false if the identity does not exist.
    pub async fn set_password_hash(
        pool: &PgPool,
        variant: IdentityVariant,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET password_hash = $2, updated_at = NOW() WHERE id = $1",
            variant.table()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a pending reset token digest, replacing any previous one
    pub async fn set_reset_token(
        pool: &PgPool,
        variant: IdentityVariant,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET reset_token_hash = $2, reset_expires_at = $3, updated_at = NOW() WHERE id = $1",
            variant.table()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(token_hash)
            .bind(expires_at)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks the customer holding this verification token as verified
    ///
    /// Matching, verifying and clearing the token happen in one statement, so a
    /// token can be redeemed at most once.
    pub async fn redeem_verification(
        pool: &PgPool,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE customers \
             SET verified = TRUE, verification_token_hash = NULL, verification_expires_at = NULL, \
                 updated_at = NOW() \
             WHERE verification_token_hash = $1 AND verification_expires_at > $2 \
             RETURNING {}",
            CUSTOMER_COLUMNS
        );
        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_identity(IdentityVariant::Customer)))
    }

    /// Sets a new password for the identity holding this reset token
    ///
    /// Same single-statement guarantee as [`Identity::redeem_verification`].
    /// Staff are tried before customers.
    pub async fn redeem_password_reset(
        pool: &PgPool,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        for variant in [IdentityVariant::Staff, IdentityVariant::Customer] {
            let query = format!(
                "UPDATE {} \
                 SET password_hash = $3, reset_token_hash = NULL, reset_expires_at = NULL, \
                     updated_at = NOW() \
                 WHERE reset_token_hash = $1 AND reset_expires_at > $2 \
                 RETURNING {}",
                variant.table(),
                columns(variant)
            );
            let row = sqlx::query_as::<_, IdentityRow>(&query)
                .bind(token_hash)
                .bind(now)
                .bind(new_password_hash)
                .fetch_optional(pool)
                .await?;

            if let Some(row) = row {
                return Ok(Some(row.into_identity(variant)));
            }
        }

        Ok(None)
    }

    /// Deletes an identity by id
    ///
    /// Orders referencing the identity are left in place.
    pub async fn delete(pool: &PgPool, variant: IdentityVariant, id: Uuid) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE id = $1", variant.table());
        let result = sqlx::query(&query).bind(id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }
}
