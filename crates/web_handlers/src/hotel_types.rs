use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::fields::{self, present};

/// Hotel model representing the database schema
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    /// Unique identifier for the hotel
    pub id: i64,
    /// Hotel name
    pub name: String,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Latitude
    pub lat: Option<f64>,
    /// Longitude
    pub lng: Option<f64>,
    /// Front desk phone
    pub phone: Option<String>,
    /// Front desk email
    pub email: Option<String>,
    /// Number of floors
    pub total_floors: Option<i32>,
    /// Number of rooms
    pub total_rooms: Option<i32>,
    /// First night of the stay
    pub check_in_date: Option<NaiveDate>,
    /// Departure day
    pub check_out_date: Option<NaiveDate>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Request structure for creating or replacing a hotel.
/// Field names are accepted in both snake_case and camelCase; when a body
/// carries both spellings of a field, the snake_case one wins.
#[derive(Debug, Default, Deserialize)]
pub struct HotelRequest {
    /// Hotel name (required)
    pub name: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Latitude, number or numeric string
    pub lat: Option<Value>,
    /// Longitude, number or numeric string
    pub lng: Option<Value>,
    /// Front desk phone
    pub phone: Option<String>,
    /// Front desk email
    pub email: Option<String>,
    /// Number of floors
    pub total_floors: Option<Value>,
    /// `totalFloors` spelling
    #[serde(rename = "totalFloors")]
    pub total_floors_camel: Option<Value>,
    /// Number of rooms
    pub total_rooms: Option<Value>,
    /// `totalRooms` spelling
    #[serde(rename = "totalRooms")]
    pub total_rooms_camel: Option<Value>,
    /// First night of the stay
    pub check_in_date: Option<String>,
    /// `checkInDate` spelling
    #[serde(rename = "checkInDate")]
    pub check_in_date_camel: Option<String>,
    /// Departure day
    pub check_out_date: Option<String>,
    /// `checkOutDate` spelling
    #[serde(rename = "checkOutDate")]
    pub check_out_date_camel: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Validated hotel fields
#[derive(Debug, PartialEq)]
pub struct HotelInput {
    /// Hotel name
    pub name: String,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Latitude
    pub lat: Option<f64>,
    /// Longitude
    pub lng: Option<f64>,
    /// Front desk phone
    pub phone: Option<String>,
    /// Front desk email
    pub email: Option<String>,
    /// Number of floors
    pub total_floors: Option<i32>,
    /// Number of rooms
    pub total_rooms: Option<i32>,
    /// First night of the stay
    pub check_in_date: Option<NaiveDate>,
    /// Departure day
    pub check_out_date: Option<NaiveDate>,
    /// Free-form notes
    pub notes: Option<String>,
}

fn optional_count(name: &str, value: Option<&Value>) -> Result<Option<i32>, ApiError> {
    fields::optional_int(name, value)?
        .map(|n| fields::to_i32(name, n))
        .transpose()
}

impl HotelRequest {
    /// Checks the name and parses numeric and date fields.
    pub fn parse(&self) -> Result<HotelInput, ApiError> {
        let name = fields::non_empty(self.name.as_deref())
            .ok_or_else(|| ApiError::invalid("Hotel name is required"))?;

        let check_in_date = fields::optional_date(
            "check_in_date",
            self.check_in_date
                .as_deref()
                .or(self.check_in_date_camel.as_deref()),
        )?;
        let check_out_date = fields::optional_date(
            "check_out_date",
            self.check_out_date
                .as_deref()
                .or(self.check_out_date_camel.as_deref()),
        )?;
        if let (Some(arrive), Some(leave)) = (check_in_date, check_out_date) {
            if leave < arrive {
                return Err(ApiError::invalid(
                    "check_out_date must not be before check_in_date",
                ));
            }
        }

        Ok(HotelInput {
            name,
            address: fields::non_empty(self.address.as_deref()),
            city: fields::non_empty(self.city.as_deref()),
            state: fields::non_empty(self.state.as_deref()),
            country: fields::non_empty(self.country.as_deref()),
            lat: fields::optional_float("lat", self.lat.as_ref())?,
            lng: fields::optional_float("lng", self.lng.as_ref())?,
            phone: fields::non_empty(self.phone.as_deref()),
            email: fields::non_empty(self.email.as_deref()),
            total_floors: optional_count(
                "total_floors",
                self.total_floors.as_ref().or(self.total_floors_camel.as_ref()),
            )?,
            total_rooms: optional_count(
                "total_rooms",
                self.total_rooms.as_ref().or(self.total_rooms_camel.as_ref()),
            )?,
            check_in_date,
            check_out_date,
            notes: fields::non_empty(self.notes.as_deref()),
        })
    }
}

/// Room allotment joined with hotel and traveler identity
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoomAllotment {
    /// Unique identifier for the allotment
    pub id: i64,
    /// Hotel the room belongs to
    pub hotel_id: i64,
    /// Traveler staying in the room
    pub traveler_id: i64,
    /// Night of the stay
    pub date: NaiveDate,
    /// Floor label
    pub floor: Option<String>,
    /// Room label
    pub room: Option<String>,
    /// Room pair number, if the room was assigned by pair
    pub pair_no: Option<i32>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Hotel name
    pub hotel_name: Option<String>,
    /// Traveler first name
    pub first_name: Option<String>,
    /// Traveler last name
    pub last_name: Option<String>,
    /// Traveler email
    pub email: Option<String>,
}

/// Request structure for creating a room allotment.
/// Each field takes one spelling per body; sending both is a 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllotmentRequest {
    /// Hotel id (required)
    #[serde(alias = "hotel_id")]
    pub hotel_id: Option<Value>,
    /// Traveler id (required)
    #[serde(alias = "traveler_id")]
    pub traveler_id: Option<Value>,
    /// Night of the stay (required)
    pub date: Option<String>,
    /// Floor label
    pub floor: Option<Value>,
    /// Room label
    pub room: Option<Value>,
    /// Room pair number
    #[serde(alias = "pair_no")]
    pub pair_no: Option<Value>,
}

/// Validated room allotment
#[derive(Debug, PartialEq)]
pub struct NewAllotment {
    /// Hotel id
    pub hotel_id: i64,
    /// Traveler id
    pub traveler_id: i64,
    /// Night of the stay
    pub date: NaiveDate,
    /// Floor label
    pub floor: Option<String>,
    /// Room label
    pub room: Option<String>,
    /// Room pair number
    pub pair_no: Option<i32>,
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn optional_pair_no(value: Option<&Value>) -> Result<Option<i32>, ApiError> {
    fields::optional_int("pairNo", value)?
        .map(|n| fields::to_i32("pairNo", n))
        .transpose()
}

impl CreateAllotmentRequest {
    /// Checks required fields and parses the numeric ones.
    pub fn parse(&self) -> Result<NewAllotment, ApiError> {
        let date = fields::non_empty(self.date.as_deref());
        if is_blank(self.hotel_id.as_ref()) || is_blank(self.traveler_id.as_ref()) || date.is_none()
        {
            return Err(ApiError::invalid("hotelId, travelerId, and date are required"));
        }

        let ids = (
            fields::optional_int("hotelId", self.hotel_id.as_ref()),
            fields::optional_int("travelerId", self.traveler_id.as_ref()),
        );
        let (Ok(Some(hotel_id)), Ok(Some(traveler_id))) = ids else {
            return Err(ApiError::invalid(
                "hotelId and travelerId must be valid numbers",
            ));
        };

        Ok(NewAllotment {
            hotel_id,
            traveler_id,
            date: fields::parse_date("date", date.as_deref().unwrap_or_default())?,
            floor: fields::optional_text("floor", self.floor.as_ref())?,
            room: fields::optional_text("room", self.room.as_ref())?,
            pair_no: optional_pair_no(self.pair_no.as_ref())?,
        })
    }
}

/// Request structure for a partial allotment update. A field sent as `""`
/// or `null` is cleared; an absent field is left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAllotmentRequest {
    /// Floor label
    #[serde(default, deserialize_with = "present")]
    pub floor: Option<Value>,
    /// Room label
    #[serde(default, deserialize_with = "present")]
    pub room: Option<Value>,
    /// Room pair number
    #[serde(default, deserialize_with = "present", alias = "pair_no")]
    pub pair_no: Option<Value>,
}

/// Parsed partial allotment update
#[derive(Debug, Default, PartialEq)]
pub struct AllotmentPatch {
    /// New floor; `Some(None)` clears it
    pub floor: Option<Option<String>>,
    /// New room; `Some(None)` clears it
    pub room: Option<Option<String>>,
    /// New pair number; `Some(None)` clears it
    pub pair_no: Option<Option<i32>>,
}

impl AllotmentPatch {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.floor.is_none() && self.room.is_none() && self.pair_no.is_none()
    }
}

impl UpdateAllotmentRequest {
    /// Parses supplied fields; fails when nothing was supplied.
    pub fn parse(&self) -> Result<AllotmentPatch, ApiError> {
        let patch = AllotmentPatch {
            floor: self
                .floor
                .as_ref()
                .map(|v| fields::optional_text("floor", Some(v)))
                .transpose()?,
            room: self
                .room
                .as_ref()
                .map(|v| fields::optional_text("room", Some(v)))
                .transpose()?,
            pair_no: self
                .pair_no
                .as_ref()
                .map(|v| optional_pair_no(Some(v)))
                .transpose()?,
        };

        if patch.is_empty() {
            return Err(ApiError::invalid("No fields to update"));
        }
        Ok(patch)
    }
}

/// Query parameters for listing allotments
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllotmentQuery {
    /// Restrict to one hotel
    pub hotel_id: Option<String>,
    /// Restrict to one night
    pub date: Option<String>,
    /// Restrict to one traveler
    pub traveler_id: Option<String>,
}

/// Parsed allotment filters
#[derive(Debug, Default, PartialEq)]
pub struct AllotmentFilter {
    /// Restrict to one hotel
    pub hotel_id: Option<i64>,
    /// Restrict to one night
    pub date: Option<NaiveDate>,
    /// Restrict to one traveler
    pub traveler_id: Option<i64>,
}

impl AllotmentQuery {
    /// Parses the raw query strings.
    pub fn parse(&self) -> Result<AllotmentFilter, ApiError> {
        Ok(AllotmentFilter {
            hotel_id: fields::query_int("hotelId", self.hotel_id.as_deref())?,
            date: fields::optional_date("date", self.date.as_deref())?,
            traveler_id: fields::query_int("travelerId", self.traveler_id.as_deref())?,
        })
    }

    /// Parses the mandatory `hotelId` + `date` pair used by bulk deletion.
    pub fn parse_bulk_delete(&self) -> Result<(i64, NaiveDate), ApiError> {
        let hotel_id = fields::non_empty(self.hotel_id.as_deref());
        let date = fields::non_empty(self.date.as_deref());
        let (Some(hotel_id), Some(date)) = (hotel_id, date) else {
            return Err(ApiError::invalid(
                "hotelId and date are required as query parameters",
            ));
        };

        let hotel_id = hotel_id
            .parse::<i64>()
            .map_err(|_| ApiError::invalid("hotelId must be a valid number"))?;
        Ok((hotel_id, fields::parse_date("date", &date)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hotel_request_accepts_both_casings() {
        let snake: HotelRequest = serde_json::from_value(json!({
            "name": "Hotel Ganga",
            "total_floors": "5",
            "check_in_date": "2025-12-14"
        }))
        .unwrap();
        let camel: HotelRequest = serde_json::from_value(json!({
            "name": "Hotel Ganga",
            "totalFloors": 5,
            "checkInDate": "2025-12-14T00:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(snake.parse().unwrap(), camel.parse().unwrap());
        assert_eq!(snake.parse().unwrap().total_floors, Some(5));

        let both: HotelRequest = serde_json::from_value(json!({
            "name": "Hotel Ganga",
            "total_floors": 4,
            "totalFloors": 6,
            "totalRooms": 40,
            "checkOutDate": "2025-12-16"
        }))
        .unwrap();
        let parsed = both.parse().unwrap();
        assert_eq!(parsed.total_floors, Some(4));
        assert_eq!(parsed.total_rooms, Some(40));
        assert_eq!(
            parsed.check_out_date,
            NaiveDate::from_ymd_opt(2025, 12, 16)
        );
    }

    #[test]
    fn test_hotel_request_validation() {
        let missing_name = HotelRequest {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            missing_name.parse(),
            Err(ApiError::Validation(msg)) if msg == "Hotel name is required"
        ));

        let bad_lat = HotelRequest {
            name: Some("Hotel".to_string()),
            lat: Some(json!("north")),
            ..Default::default()
        };
        assert!(bad_lat.parse().is_err());

        let reversed = HotelRequest {
            name: Some("Hotel".to_string()),
            check_in_date: Some("2025-12-20".to_string()),
            check_out_date: Some("2025-12-14".to_string()),
            ..Default::default()
        };
        assert!(reversed.parse().is_err());

        let blank_optionals = HotelRequest {
            name: Some("Hotel".to_string()),
            city: Some(String::new()),
            lat: Some(json!("")),
            ..Default::default()
        };
        let parsed = blank_optionals.parse().unwrap();
        assert_eq!(parsed.city, None);
        assert_eq!(parsed.lat, None);
    }

    #[test]
    fn test_allotment_request_parsing() {
        let request: CreateAllotmentRequest = serde_json::from_value(json!({
            "hotelId": "2",
            "travelerId": 14,
            "date": "2025-12-15",
            "floor": 3,
            "room": "305",
            "pairNo": ""
        }))
        .unwrap();
        let parsed = request.parse().unwrap();
        assert_eq!(parsed.hotel_id, 2);
        assert_eq!(parsed.traveler_id, 14);
        assert_eq!(parsed.floor, Some("3".to_string()));
        assert_eq!(parsed.pair_no, None);
    }

    #[test]
    fn test_allotment_request_rejections() {
        let missing: CreateAllotmentRequest =
            serde_json::from_value(json!({"hotelId": 1, "travelerId": 2})).unwrap();
        assert!(matches!(
            missing.parse(),
            Err(ApiError::Validation(msg)) if msg == "hotelId, travelerId, and date are required"
        ));

        let not_numeric: CreateAllotmentRequest = serde_json::from_value(
            json!({"hotelId": "abc", "travelerId": 2, "date": "2025-12-15"}),
        )
        .unwrap();
        assert!(matches!(
            not_numeric.parse(),
            Err(ApiError::Validation(msg)) if msg == "hotelId and travelerId must be valid numbers"
        ));
    }

    #[test]
    fn test_allotment_patch() {
        let request: UpdateAllotmentRequest =
            serde_json::from_value(json!({"floor": "", "pairNo": "4"})).unwrap();
        let patch = request.parse().unwrap();
        assert_eq!(
            patch,
            AllotmentPatch {
                floor: Some(None),
                room: None,
                pair_no: Some(Some(4)),
            }
        );

        let empty: UpdateAllotmentRequest = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            empty.parse(),
            Err(ApiError::Validation(msg)) if msg == "No fields to update"
        ));
    }

    #[test]
    fn test_bulk_delete_query() {
        let query = AllotmentQuery {
            hotel_id: Some("7".to_string()),
            date: Some("2025-12-15".to_string()),
            traveler_id: None,
        };
        let (hotel_id, date) = query.parse_bulk_delete().unwrap();
        assert_eq!(hotel_id, 7);
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());

        let missing = AllotmentQuery {
            date: Some("2025-12-15".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            missing.parse_bulk_delete(),
            Err(ApiError::Validation(msg)) if msg == "hotelId and date are required as query parameters"
        ));

        let bad = AllotmentQuery {
            hotel_id: Some("x".to_string()),
            date: Some("2025-12-15".to_string()),
            traveler_id: None,
        };
        assert!(bad.parse_bulk_delete().is_err());
    }
}
