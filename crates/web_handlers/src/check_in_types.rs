use auth_services::types::Claims;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::fields;

/// Check-in row joined with traveler and vehicle names
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Unique identifier for the check-in
    pub id: i64,
    /// Vehicle the traveler boarded
    pub vehicle_id: i64,
    /// Email the check-in was made for
    pub traveler_email: String,
    /// Resolved traveler row, if any
    pub traveler_id: Option<i64>,
    /// False once checked out
    pub active: bool,
    /// When the check-in happened
    pub checked_in_at: DateTime<Utc>,
    /// When the traveler checked out
    pub checked_out_at: Option<DateTime<Utc>>,
    /// Traveler display name, falling back to the email
    pub traveler_name: String,
    /// Vehicle display name
    pub vehicle_name: Option<String>,
}

/// Request structure for creating a check-in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckInRequest {
    /// Vehicle id, as a number or numeric string
    pub vehicle_id: Option<Value>,
    /// Email of the traveler being checked in
    pub traveler_email: Option<String>,
    /// Traveler id; resolved from the email when omitted
    pub traveler_id: Option<Value>,
}

/// A validated check-in request
#[derive(Debug, PartialEq)]
pub struct NewCheckIn {
    /// Positive vehicle id
    pub vehicle_id: i64,
    /// Trimmed, lowercased traveler email
    pub traveler_email: String,
    /// Explicit traveler id
    pub traveler_id: Option<i64>,
}

impl CreateCheckInRequest {
    /// Checks required fields and parses the numeric ones.
    pub fn parse(&self) -> Result<NewCheckIn, ApiError> {
        let traveler_email =
            fields::non_empty(self.traveler_email.as_deref()).map(|email| email.to_lowercase());
        let (Some(_), Some(traveler_email)) = (self.vehicle_id.as_ref(), traveler_email) else {
            return Err(ApiError::invalid("Vehicle ID and traveler email required"));
        };

        let vehicle_id = fields::optional_int("vehicleId", self.vehicle_id.as_ref())
            .ok()
            .flatten()
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::invalid("Invalid vehicle ID"))?;

        let traveler_id = fields::optional_int("travelerId", self.traveler_id.as_ref())?
            .filter(|id| *id > 0);

        Ok(NewCheckIn {
            vehicle_id,
            traveler_email,
            traveler_id,
        })
    }
}

impl NewCheckIn {
    /// Applies the caller's rights: non-admins may only check themselves in,
    /// and their traveler id is always resolved from the email.
    pub fn scoped_to(mut self, caller: &Claims) -> Result<Self, ApiError> {
        caller.ensure_self_or_admin(&self.traveler_email, "check in")?;
        if !caller.is_admin {
            self.traveler_id = None;
        }
        Ok(self)
    }
}

/// Query parameters for listing check-ins
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInQuery {
    /// Restrict to one vehicle
    pub vehicle_id: Option<String>,
    /// `true` for active rows, any other value for inactive rows
    pub active: Option<String>,
    /// Restrict to one traveler email
    pub traveler_email: Option<String>,
}

/// Parsed check-in filters
#[derive(Debug, Default, PartialEq)]
pub struct CheckInFilter {
    /// Restrict to one vehicle
    pub vehicle_id: Option<i64>,
    /// Restrict by active flag
    pub active: Option<bool>,
    /// Restrict to one traveler email
    pub traveler_email: Option<String>,
}

impl CheckInQuery {
    /// Parses the raw query strings.
    pub fn parse(&self) -> Result<CheckInFilter, ApiError> {
        Ok(CheckInFilter {
            vehicle_id: fields::query_int("vehicleId", self.vehicle_id.as_deref())?,
            active: parse_active(self.active.as_deref()),
            traveler_email: fields::non_empty(self.traveler_email.as_deref())
                .map(|email| email.to_lowercase()),
        })
    }
}

/// Query parameters for the vehicle roster
#[derive(Debug, Default, Deserialize)]
pub struct RosterQuery {
    /// Optional active filter
    pub active: Option<String>,
}

/// `"true"` selects active rows; any other present value selects inactive rows.
pub fn parse_active(raw: Option<&str>) -> Option<bool> {
    raw.map(|value| value.trim() == "true")
}

/// One traveler line of a vehicle roster
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// Traveler email
    pub email: String,
    /// Traveler display name
    pub name: String,
    /// Whether the check-in is still active
    pub checked_in: bool,
    /// Check-in time
    pub timestamp: DateTime<Utc>,
}

/// Roster of a vehicle as shown on the boarding screen
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRoster {
    /// Vehicle id
    pub vehicle_id: i64,
    /// False only when the roster was requested with `active=false`
    pub active: bool,
    /// Emails of travelers currently checked in
    pub checked_in: Vec<String>,
    /// Every matching check-in, newest first
    pub travelers: Vec<RosterEntry>,
}

impl VehicleRoster {
    /// Formats check-in rows into a roster.
    pub fn from_check_ins(vehicle_id: i64, active: Option<bool>, rows: Vec<CheckIn>) -> Self {
        let travelers: Vec<RosterEntry> = rows
            .into_iter()
            .map(|row| RosterEntry {
                email: row.traveler_email,
                name: row.traveler_name,
                checked_in: row.active,
                timestamp: row.checked_in_at,
            })
            .collect();

        Self {
            vehicle_id,
            active: active != Some(false),
            checked_in: travelers
                .iter()
                .filter(|t| t.checked_in)
                .map(|t| t.email.clone())
                .collect(),
            travelers,
        }
    }
}
