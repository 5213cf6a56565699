//! Request and Response models for the store server API
//!
//! This module defines the DTOs (Data Transfer Objects) exchanged between
//! the store server and [`HttpStore`](crate::remote::HttpStore).

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{KeysQuery, SetRequest};
pub use responses::{
    DeleteResponse, ExistsResponse, GetResponse, HealthResponse, KeysResponse, SetResponse,
    StatsResponse,
};
