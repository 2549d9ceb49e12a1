//! Core types and shared functionality for stockroom.
//!
//! This crate provides:
//! - File-backed cache with a freshness gate and cache-aside layer
//! - Unified error types
//! - Configuration structures
//! - The normalized catalog model shared by every storefront backend
//! - SEO scoring rules for product listings

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod seo;

pub use cache::{CacheKey, CacheLayer, CacheResult, CacheSource, EntityKind, FileStore, Freshness};
pub use config::{AppConfig, BackendKind, ConfigError};
pub use error::Error;
