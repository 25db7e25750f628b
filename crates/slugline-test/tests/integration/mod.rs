//! Integration tests for the slug engine.
//!
//! Engine behavior runs against the in-memory store; the `postgres` module
//! repeats the storage-sensitive flows against a real database.

mod helpers;

mod lifecycle;
mod lookup;
mod postgres;
mod scopes;
