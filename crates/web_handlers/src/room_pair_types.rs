use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::fields;

/// Room pair row
#[derive(Debug, sqlx::FromRow)]
pub struct RoomPairRow {
    /// Unique identifier for the pair
    pub id: i64,
    /// Pair number shown to travelers
    pub pair_no: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Traveler summary inside a room pair
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PairTraveler {
    /// Traveler id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Profile image URL
    pub image_url: Option<String>,
}

/// Membership row used to group travelers by pair
#[derive(Debug, sqlx::FromRow)]
pub struct PairMembership {
    /// Pair the traveler belongs to
    pub room_pair_id: i64,
    /// Traveler summary
    #[sqlx(flatten)]
    pub traveler: PairTraveler,
}

/// Room pair with its travelers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPair {
    /// Unique identifier for the pair
    pub id: i64,
    /// Pair number
    pub pair_no: i32,
    /// Member traveler ids, in id order
    pub traveler_ids: Vec<i64>,
    /// Member travelers, in id order
    pub travelers: Vec<PairTraveler>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl RoomPair {
    /// Combines a pair row with its members.
    pub fn new(row: RoomPairRow, travelers: Vec<PairTraveler>) -> Self {
        Self {
            id: row.id,
            pair_no: row.pair_no,
            traveler_ids: travelers.iter().map(|t| t.id).collect(),
            travelers,
            created_at: row.created_at,
        }
    }
}

/// Request structure for creating or updating a room pair
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPairRequest {
    /// Pair number
    pub pair_no: Option<Value>,
    /// Member traveler ids
    pub traveler_ids: Option<Vec<Value>>,
}

/// Validated new room pair
#[derive(Debug, PartialEq)]
pub struct NewRoomPair {
    /// Pair number
    pub pair_no: i32,
    /// Distinct member ids in request order
    pub traveler_ids: Vec<i64>,
}

/// Parsed room pair update
#[derive(Debug, Default, PartialEq)]
pub struct RoomPairPatch {
    /// New pair number
    pub pair_no: Option<i32>,
    /// Replacement member list; replaces the previous members entirely
    pub traveler_ids: Option<Vec<i64>>,
}

fn parse_pair_no(value: Option<&Value>) -> Result<Option<i32>, ApiError> {
    match fields::optional_int("pairNo", value)? {
        Some(n) if n <= 0 => Err(ApiError::invalid("pairNo must be a positive number")),
        Some(n) => fields::to_i32("pairNo", n).map(Some),
        None => Ok(None),
    }
}

fn parse_traveler_ids(values: &[Value]) -> Result<Vec<i64>, ApiError> {
    let mut ids: Vec<i64> = Vec::with_capacity(values.len());
    for value in values {
        let id = fields::required_id("travelerId", Some(value))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

impl RoomPairRequest {
    /// Validates a creation request: a pair number and at least one traveler.
    pub fn parse_new(&self) -> Result<NewRoomPair, ApiError> {
        let pair_no = parse_pair_no(self.pair_no.as_ref())?;
        let ids = self.traveler_ids.as_deref().unwrap_or_default();
        let Some(pair_no) = pair_no.filter(|_| !ids.is_empty()) else {
            return Err(ApiError::invalid(
                "Pair number and at least one traveler required",
            ));
        };

        Ok(NewRoomPair {
            pair_no,
            traveler_ids: parse_traveler_ids(ids)?,
        })
    }

    /// Validates an update request; both fields are optional.
    pub fn parse_patch(&self) -> Result<RoomPairPatch, ApiError> {
        Ok(RoomPairPatch {
            pair_no: parse_pair_no(self.pair_no.as_ref())?,
            traveler_ids: self
                .traveler_ids
                .as_deref()
                .map(parse_traveler_ids)
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> RoomPairRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_new_pair_parsing() {
        let parsed = request(json!({"pairNo": "7", "travelerIds": [1, "2", 1]}))
            .parse_new()
            .unwrap();
        assert_eq!(
            parsed,
            NewRoomPair {
                pair_no: 7,
                traveler_ids: vec![1, 2],
            }
        );
    }

    #[test]
    fn test_new_pair_requires_number_and_travelers() {
        for body in [
            json!({"travelerIds": [1]}),
            json!({"pairNo": 7}),
            json!({"pairNo": 7, "travelerIds": []}),
        ] {
            assert!(matches!(
                request(body).parse_new(),
                Err(ApiError::Validation(msg)) if msg == "Pair number and at least one traveler required"
            ));
        }
        assert!(request(json!({"pairNo": 0, "travelerIds": [1]})).parse_new().is_err());
        assert!(request(json!({"pairNo": 3, "travelerIds": ["x"]})).parse_new().is_err());
    }

    #[test]
    fn test_patch_parsing() {
        let patch = request(json!({"travelerIds": [3]})).parse_patch().unwrap();
        assert_eq!(
            patch,
            RoomPairPatch {
                pair_no: None,
                traveler_ids: Some(vec![3]),
            }
        );

        let patch = request(json!({"travelerIds": []})).parse_patch().unwrap();
        assert_eq!(patch.traveler_ids, Some(Vec::new()));

        let patch = request(json!({})).parse_patch().unwrap();
        assert_eq!(patch, RoomPairPatch::default());
    }

    #[test]
    fn test_pair_response_shape() {
        let row = RoomPairRow {
            id: 4,
            pair_no: 7,
            created_at: Utc::now(),
        };
        let pair = RoomPair::new(
            row,
            vec![PairTraveler {
                id: 3,
                name: "Asha Patel".to_string(),
                email: "asha@x.com".to_string(),
                image_url: None,
            }],
        );
        let body = serde_json::to_value(pair).unwrap();
        assert_eq!(body["pairNo"], 7);
        assert_eq!(body["travelerIds"], json!([3]));
        assert_eq!(body["travelers"][0]["name"], "Asha Patel");
    }
}
