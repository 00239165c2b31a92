//! # Sellos G Shared Library
//!
//! Domain types, persistence and business rules used by the Sellos G API server.
//!
//! ## Module Organization
//!
//! - `auth`: passwords, session and action tokens, request authentication, role guards
//! - `models`: identities, products, orders, notifications and their SQL
//! - `store`: persistence traits plus an in-memory implementation
//! - `db`: Postgres pool, migrations and the Postgres store
//! - `workflow`: account flows and the order pricing workflow
//! - `mail`: outbound transactional email

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod store;
pub mod workflow;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
