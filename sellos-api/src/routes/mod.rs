/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, email verification, password reset and change
/// - `customers`: Self-registration and customer administration
/// - `employees`: Staff administration
/// - `products`: Catalogue
/// - `orders`: Order workflow
/// - `notifications`: Back-office notifications

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod customers;
pub mod employees;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;

/// Body for endpoints that only confirm an action
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Deserializes a field where `null` and absent mean different things
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`: absent gives
/// `None`, `null` gives `Some(None)`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
