use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    /// `#RRGGBB` display colour
    pub static ref COLOR_REGEX: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

/// Default display colour for new vehicles
pub const DEFAULT_COLOR: &str = "#FF9933";

/// Vehicle model representing the database schema
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Unique identifier for the vehicle
    pub id: i64,
    /// Display name
    pub name: String,
    /// Vehicle type, e.g. "Tourist Bus"
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub vehicle_type: Option<String>,
    /// Seat count
    pub capacity: Option<i32>,
    /// Registration number
    pub reg_no: Option<String>,
    /// Group leader name
    pub group_leader_name: Option<String>,
    /// Group leader email
    pub group_leader_email: Option<String>,
    /// Driver name
    pub driver_name: Option<String>,
    /// Driver phone
    pub driver_phone: Option<String>,
    /// Display colour
    pub color: String,
    /// `Active` or `Inactive`
    pub status: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Operational status of a vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// In service
    #[default]
    Active,
    /// Out of service
    Inactive,
}

impl VehicleStatus {
    /// Database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "Active",
            VehicleStatus::Inactive => "Inactive",
        }
    }
}

/// Request structure for creating or replacing a vehicle
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Vehicle name is required"))]
    pub name: String,
    /// Vehicle type
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    /// Seat count
    #[validate(range(min = 1, max = 500, message = "Capacity must be between 1 and 500"))]
    pub capacity: Option<i32>,
    /// Registration number
    pub reg_no: Option<String>,
    /// Group leader name
    pub group_leader_name: Option<String>,
    /// Group leader email
    #[validate(email(message = "Group leader email is invalid"))]
    pub group_leader_email: Option<String>,
    /// Driver name
    #[serde(alias = "driver")]
    pub driver_name: Option<String>,
    /// Driver phone
    pub driver_phone: Option<String>,
    /// Display colour, `#RRGGBB`
    #[validate(regex(path = *COLOR_REGEX, message = "Color must be in #RRGGBB format"))]
    pub color: Option<String>,
    /// Status, `Active` when omitted
    #[serde(default)]
    pub status: VehicleStatus,
    /// Free-form notes
    pub notes: Option<String>,
}

impl VehicleRequest {
    /// Display colour to store.
    pub fn color(&self) -> String {
        self.color
            .clone()
            .unwrap_or_else(|| DEFAULT_COLOR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> VehicleRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_valid_vehicle() {
        let vehicle = request(json!({
            "name": "Swift Journey Alpha",
            "type": "Tourist Bus",
            "capacity": 25,
            "regNo": "MH-01-YT-2024",
            "groupLeaderEmail": "aarav@yatra.com",
            "driver": "Rajesh Kumar",
            "color": "#138808",
            "status": "Inactive"
        }));
        assert!(vehicle.validate().is_ok());
        assert_eq!(vehicle.driver_name.as_deref(), Some("Rajesh Kumar"));
        assert_eq!(vehicle.status, VehicleStatus::Inactive);
        assert_eq!(vehicle.color(), "#138808");
    }

    #[test]
    fn test_defaults() {
        let vehicle = request(json!({"name": "Van"}));
        assert!(vehicle.validate().is_ok());
        assert_eq!(vehicle.status, VehicleStatus::Active);
        assert_eq!(vehicle.color(), DEFAULT_COLOR);
    }

    #[test]
    fn test_invalid_vehicles() {
        assert!(request(json!({"name": ""})).validate().is_err());
        assert!(request(json!({"name": "Van", "color": "orange"})).validate().is_err());
        assert!(request(json!({"name": "Van", "color": "#FF99"})).validate().is_err());
        assert!(request(json!({"name": "Van", "capacity": 0})).validate().is_err());
        assert!(
            serde_json::from_value::<VehicleRequest>(json!({"name": "Van", "status": "Parked"}))
                .is_err()
        );
    }
}
