use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::ApiError;
use crate::fields;

/// Itinerary day row
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRow {
    /// Unique identifier for the day
    pub id: i64,
    /// Day index, unique across the trip
    pub day: i32,
    /// Calendar date
    pub date: Option<NaiveDate>,
    /// Main place visited
    pub place: String,
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
    /// Description of the day
    pub description: Option<String>,
}

/// One scheduled activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    /// Time label, e.g. "7:10 AM"
    pub time: String,
    /// What happens
    pub activity: String,
}

/// Activity row tagged with its day
#[derive(Debug, sqlx::FromRow)]
pub struct ActivityRow {
    /// Day the activity belongs to
    pub itinerary_id: i64,
    /// Activity fields
    #[sqlx(flatten)]
    pub activity: Activity,
}

/// Image row tagged with its day
#[derive(Debug, sqlx::FromRow)]
pub struct ImageRow {
    /// Day the image belongs to
    pub itinerary_id: i64,
    /// Image URL
    pub image_url: String,
}

/// Itinerary day with its ordered activities and images
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    /// Day fields
    #[serde(flatten)]
    pub day: ItineraryRow,
    /// Activities in display order
    pub activities: Vec<Activity>,
    /// Image URLs in display order
    pub images: Vec<String>,
}

/// Activity as sent by the admin panel
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    /// Time label
    #[serde(default)]
    pub time: Option<String>,
    /// What happens
    #[serde(default)]
    pub activity: Option<String>,
}

/// Request structure for creating or replacing an itinerary day
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRequest {
    /// Day index
    #[validate(range(min = 1, message = "Day must be a positive number"))]
    pub day: i32,
    /// Calendar date
    pub date: Option<String>,
    /// Main place visited
    #[validate(length(min = 1, message = "Place is required"))]
    pub place: String,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Latitude
    pub lat: Option<Value>,
    /// Longitude
    pub lng: Option<Value>,
    /// Description of the day
    pub description: Option<String>,
    /// Activities; on update, replaces the previous list when present
    pub activities: Option<Vec<ActivityRequest>>,
    /// Image URLs; on update, replaces the previous list when present
    pub images: Option<Vec<String>>,
}

/// Validated itinerary day
#[derive(Debug, PartialEq)]
pub struct ItineraryInput {
    /// Day index
    pub day: i32,
    /// Calendar date
    pub date: Option<NaiveDate>,
    /// Main place visited
    pub place: String,
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
    /// Description
    pub description: Option<String>,
    /// Replacement activities
    pub activities: Option<Vec<Activity>>,
    /// Replacement images
    pub images: Option<Vec<String>>,
}

impl ItineraryRequest {
    /// Validates and normalizes the request.
    pub fn parse(&self) -> Result<ItineraryInput, ApiError> {
        self.validate()?;

        let activities = match &self.activities {
            Some(list) => {
                let mut activities = Vec::with_capacity(list.len());
                for (i, item) in list.iter().enumerate() {
                    let activity = fields::non_empty(item.activity.as_deref()).ok_or_else(|| {
                        ApiError::invalid(format!("Activity {} needs a description", i + 1))
                    })?;
                    activities.push(Activity {
                        time: item.time.as_deref().unwrap_or_default().trim().to_string(),
                        activity,
                    });
                }
                Some(activities)
            }
            None => None,
        };

        let images = self.images.as_ref().map(|urls| {
            urls.iter()
                .filter_map(|url| fields::non_empty(Some(url.as_str())))
                .collect()
        });

        Ok(ItineraryInput {
            day: self.day,
            date: fields::optional_date("date", self.date.as_deref())?,
            place: self.place.trim().to_string(),
            city: fields::non_empty(self.city.as_deref()),
            state: fields::non_empty(self.state.as_deref()),
            country: fields::non_empty(self.country.as_deref()),
            lat: fields::optional_float("lat", self.lat.as_ref())?,
            lng: fields::optional_float("lng", self.lng.as_ref())?,
            description: fields::non_empty(self.description.as_deref()),
            activities,
            images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_day() {
        let request: ItineraryRequest = serde_json::from_value(json!({
            "day": 2,
            "date": "2025-12-15",
            "place": "Biratnagar",
            "country": "Nepal",
            "lat": 26.4525,
            "lng": "87.2718",
            "activities": [
                {"time": "7:10 AM", "activity": "Leave for airport"},
                {"activity": "Transfer to Nepal Border - Jogbani"}
            ],
            "images": ["https://cdn/a.jpg", "  "]
        }))
        .unwrap();

        let parsed = request.parse().unwrap();
        assert_eq!(parsed.day, 2);
        assert_eq!(parsed.lng, Some(87.2718));
        let activities = parsed.activities.unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[1].time, "");
        assert_eq!(parsed.images, Some(vec!["https://cdn/a.jpg".to_string()]));
    }

    #[test]
    fn test_children_left_alone_when_absent() {
        let request: ItineraryRequest =
            serde_json::from_value(json!({"day": 1, "place": "Mumbai"})).unwrap();
        let parsed = request.parse().unwrap();
        assert_eq!(parsed.activities, None);
        assert_eq!(parsed.images, None);
    }

    #[test]
    fn test_rejections() {
        let no_place: ItineraryRequest =
            serde_json::from_value(json!({"day": 1, "place": ""})).unwrap();
        assert!(no_place.parse().is_err());

        let day_zero: ItineraryRequest =
            serde_json::from_value(json!({"day": 0, "place": "Mumbai"})).unwrap();
        assert!(day_zero.parse().is_err());

        let empty_activity: ItineraryRequest = serde_json::from_value(
            json!({"day": 1, "place": "Mumbai", "activities": [{"time": "9:00 PM"}]}),
        )
        .unwrap();
        assert!(matches!(
            empty_activity.parse(),
            Err(ApiError::Validation(msg)) if msg == "Activity 1 needs a description"
        ));
    }

    #[test]
    fn test_day_serializes_flat() {
        let day = ItineraryDay {
            day: ItineraryRow {
                id: 1,
                day: 1,
                date: NaiveDate::from_ymd_opt(2025, 12, 14),
                place: "BAPS Dadar Mandir".to_string(),
                city: Some("Mumbai".to_string()),
                state: None,
                country: None,
                lat: None,
                lng: None,
                description: None,
            },
            activities: vec![Activity {
                time: "2:00 PM".to_string(),
                activity: "Arrive".to_string(),
            }],
            images: Vec::new(),
        };
        let body = serde_json::to_value(day).unwrap();
        assert_eq!(body["place"], "BAPS Dadar Mandir");
        assert_eq!(body["date"], "2025-12-14");
        assert_eq!(body["activities"][0]["time"], "2:00 PM");
    }
}
