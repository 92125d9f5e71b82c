//! Domain entities for the storefront catalog and its taxonomy.

pub mod catalog;
pub mod taxonomy;
