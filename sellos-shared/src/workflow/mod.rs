/// Business workflows on top of the store traits
///
/// - `accounts`: login, registration, verification, password reset/change
/// - `orders`: order pricing, updates, status changes and scoped reads

pub mod accounts;
pub mod orders;
