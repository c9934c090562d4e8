//! # Web Handlers for the Yatra Admin API
//!
//! Resource services, request/response types and actix handlers for every
//! `/api` route, plus the route table that wires them together.

/// Error taxonomy shared by every resource endpoint
pub mod error;

/// Lenient parsing helpers for loosely-typed JSON and query input
pub mod fields;

/// Admin login, profile and tag catalogue handlers
pub mod admin_handlers;

/// Traveler login and profile handlers
pub mod traveler_handlers;
/// Database access for travelers
pub mod traveler_service;
/// Request and response types for travelers
pub mod traveler_types;

/// Vehicle handlers
pub mod vehicle_handlers;
/// Database access for vehicles
pub mod vehicle_service;
/// Request and response types for vehicles
pub mod vehicle_types;

/// Itinerary handlers
pub mod itinerary_handlers;
/// Database access for the itinerary
pub mod itinerary_service;
/// Request and response types for the itinerary
pub mod itinerary_types;

/// Post handlers
pub mod post_handlers;
/// Database access for posts
pub mod post_service;
/// Request and response types for posts
pub mod post_types;

/// Hotel and room allotment handlers
pub mod hotel_handlers;
/// Database access for hotels
pub mod hotel_service;
/// Request and response types for hotels
pub mod hotel_types;

/// Room pair handlers
pub mod room_pair_handlers;
/// Database access for room pairs
pub mod room_pair_service;
/// Request and response types for room pairs
pub mod room_pair_types;

/// Vehicle check-in handlers
pub mod check_in_handlers;
/// Database access for check-ins
pub mod check_in_service;
/// Request and response types for check-ins
pub mod check_in_types;

/// Settings handlers
pub mod settings_handlers;
/// Database access for settings
pub mod settings_service;
/// Request and response types for settings
pub mod settings_types;

/// Route table for the `/api` scope
pub mod routes;
pub use routes::{configure_api, health};
