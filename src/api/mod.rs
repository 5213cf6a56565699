//! API Module
//!
//! HTTP handlers and routing for the store server that network-backed caches
//! talk to through [`HttpStore`](crate::remote::HttpStore).
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /has/:key` - Check whether a key is live
//! - `DELETE /del/:key` - Delete a key
//! - `GET /keys?prefix=` - List live keys
//! - `GET /stats` - Get store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
