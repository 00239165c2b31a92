/// Role guards and ownership checks
///
/// Guards run after authentication and only look at the caller's role:
///
/// | Guard | Allows |
/// |---|---|
/// | `Admin` | administrator |
/// | `Staff` | administrator, employee |
/// | `Customer` | customer |
///
/// Ownership rules that need the target resource (an order's assignee or
/// customer) are separate functions called by the workflow.
///
/// # Example
///
/// ```
/// use sellos_shared::auth::authorization::Guard;
/// use sellos_shared::models::identity::Role;
///
/// assert!(Guard::Staff.allows(Role::Administrator));
/// assert!(!Guard::Admin.allows(Role::Employee));
/// ```

use super::middleware::AuthContext;
use crate::models::identity::Role;
use crate::models::order::Order;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role is not accepted by the guard
    #[error("Insufficient permissions: requires {required}")]
    InsufficientRole { required: &'static str },

    /// Caller may not touch this resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Role guard applied to a group of routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Admin,
    Staff,
    Customer,
}

impl Guard {
    /// Whether the role passes this guard
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Guard::Admin => role == Role::Administrator,
            Guard::Staff => role.is_staff(),
            Guard::Customer => role == Role::Customer,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Guard::Admin => "administrator",
            Guard::Staff => "staff",
            Guard::Customer => "customer",
        }
    }

    /// Checks the caller against this guard
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InsufficientRole` when the role is not accepted.
    pub fn check(&self, auth: &AuthContext) -> Result<(), AuthzError> {
        if self.allows(auth.role) {
            Ok(())
        } else {
            tracing::debug!(
                identity_id = %auth.identity_id,
                role = auth.role.as_str(),
                required = self.describe(),
                "Guard rejected request"
            );
            Err(AuthzError::InsufficientRole {
                required: self.describe(),
            })
        }
    }
}

/// Requires the caller to be the order's assigned staff member
pub fn require_assignee(auth: &AuthContext, order: &Order) -> Result<(), AuthzError> {
    if order.assigned_staff_id == Some(auth.identity_id) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

/// Read access to a single order
///
/// Administrators see everything, employees what is assigned to them,
/// customers their own orders.
pub fn can_view_order(auth: &AuthContext, order: &Order) -> bool {
    match auth.role {
        Role::Administrator => true,
        Role::Employee => order.assigned_staff_id == Some(auth.identity_id),
        Role::Customer => order.customer_id == auth.identity_id,
    }
}

/// Result form of [`can_view_order`]
pub fn require_order_access(auth: &AuthContext, order: &Order) -> Result<(), AuthzError> {
    if can_view_order(auth, order) {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}
