//! Domain types and persistence contract for slug generation and lookup.

pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod store;
pub mod types;
pub mod util;
