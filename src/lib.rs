//! Librarise storefront core.
//!
//! Keeps catalog and taxonomy data renderable straight from a durable local cache while
//! fresher copies are fetched in the background, and resolves the presentation variant
//! (standard or children) synchronously from whatever is already known locally.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
