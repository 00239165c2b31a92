/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and strength checks
/// - [`jwt`]: 24-hour HS256 session tokens
/// - [`action_token`]: single-use verification and reset tokens
/// - [`middleware`]: bearer token resolution into [`middleware::AuthContext`]
/// - [`authorization`]: role guards and order ownership rules
///
/// # Example
///
/// ```
/// use sellos_shared::auth::jwt::{issue_session_token, validate_token};
/// use sellos_shared::auth::password::{hash_password, password_matches};
/// use sellos_shared::models::identity::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(password_matches("user_password", &hash));
///
/// let secret = "a-secret-that-is-at-least-32-bytes!";
/// let token = issue_session_token(Uuid::new_v4(), Role::Customer, secret)?;
/// assert_eq!(validate_token(&token, secret)?.role, Role::Customer);
/// # Ok(())
/// # }
/// ```

pub mod action_token;
pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
