//! Storefront clients for stockroom.
//!
//! This crate provides the authenticated HTTP fetcher, one adapter per
//! storefront backend (Etsy, Shopify, Ravelry) and the [`Catalog`] that puts
//! them behind the file cache. Shared by the server and CLI.

pub mod catalog;
pub mod error;
pub mod etsy;
pub mod http;
pub mod ravelry;
pub mod shopify;
pub mod storefront;

pub use catalog::{Catalog, ReviewBatching, SyncFailure, SyncReport};
pub use error::ApiError;
pub use http::{ApiClient, Auth, HttpSettings};
pub use storefront::{Storefront, build_storefront};
