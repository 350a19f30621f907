//! 数据库浏览工作台公共模块
//!
//! Shared pieces used by the studio service:
//! - data models (connections, schema metadata, rows, grid)
//! - unified API response wrapper and error type
//! - configuration loading
//! - the persisted connection registry
//! - request-id middleware

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod response;
pub mod utils;

pub use errors::{AppError, AppResult};
