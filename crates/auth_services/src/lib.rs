//! # Auth Services
//!
//! Authentication and authorization for the Yatra backend.
//! It includes bearer token issuing and verification, the access control gate
//! (middleware plus extractors), and the admin/traveler credential store.

/// Bearer token issuing and verification.
pub mod jwt;
/// Middleware and extractors that attach and check caller identity.
pub mod middleware;
/// Credential store for admins and travelers.
pub mod service;
/// Types and structures used in authentication services.
pub mod types;
