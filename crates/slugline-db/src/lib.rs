//! `PostgreSQL` storage for slugged documents.

pub mod db;
pub mod error;
pub mod model;
pub mod store;

pub use store::PgDocumentStore;
