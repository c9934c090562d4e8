//! # Postgres
//!
//! Connection pool, connectivity probe and schema bootstrap for the Yatra backend.

/// Database client for the Yatra backend.
pub mod database;
