//! Application services: loaders, resolution and browsing over the cache layer.

pub mod browse;
pub mod catalog;
pub mod error;
pub mod repos;
pub mod state;
pub mod taxonomy;
pub mod theme;
