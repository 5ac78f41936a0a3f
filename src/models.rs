//! Data models and DTOs (Data Transfer Objects)
//!
//! Request/response messages of the community RPC surface.

pub mod community;

pub use community::*;
