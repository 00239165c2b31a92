//! # Sellos G API Server Library
//!
//! HTTP surface of the Sellos G order backend.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder, session gate and role guards
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
