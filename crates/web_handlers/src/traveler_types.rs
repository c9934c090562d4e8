use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::ApiError;
use crate::fields::{self, present};

/// Column list for `Traveler`; never includes the password hash.
pub const TRAVELER_COLUMNS: &str = r#"
    id, tirth_id, first_name, middle_name, last_name, email, phone, city, country,
    center, birth_date, age, passport_no, passport_issue_date, passport_expiry_date,
    nationality, gender, hoodi_size, vehicle_id, profile_line, about_me, image_url,
    created_at, updated_at
"#;

/// Traveler profile as stored, without credentials
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Traveler {
    /// Unique identifier for the traveler
    pub id: i64,
    /// External traveler code
    pub tirth_id: String,
    /// Given name
    pub first_name: String,
    /// Middle name
    pub middle_name: Option<String>,
    /// Family name
    pub last_name: String,
    /// Email address, also the login
    pub email: String,
    /// Phone number
    pub phone: Option<String>,
    /// Home city
    pub city: Option<String>,
    /// Home country
    pub country: Option<String>,
    /// Home center
    pub center: Option<String>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
    /// Age in years
    pub age: Option<i32>,
    /// Passport number
    pub passport_no: Option<String>,
    /// Passport issue date
    pub passport_issue_date: Option<NaiveDate>,
    /// Passport expiry date
    pub passport_expiry_date: Option<NaiveDate>,
    /// Nationality
    pub nationality: Option<String>,
    /// Gender
    pub gender: Option<String>,
    /// Hoodie size
    pub hoodi_size: Option<String>,
    /// Assigned vehicle
    pub vehicle_id: Option<i64>,
    /// One-line profile headline
    pub profile_line: Option<String>,
    /// Free-form introduction
    pub about_me: Option<String>,
    /// Profile image URL
    pub image_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Optional profile fields shared by registration and update.
/// A blank string clears the field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    /// Middle name
    pub middle_name: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Home city
    pub city: Option<String>,
    /// Home country
    pub country: Option<String>,
    /// Home center
    pub center: Option<String>,
    /// Date of birth, `YYYY-MM-DD`
    pub birth_date: Option<String>,
    /// Age in years
    pub age: Option<Value>,
    /// Passport number
    pub passport_no: Option<String>,
    /// Passport issue date
    pub passport_issue_date: Option<String>,
    /// Passport expiry date
    pub passport_expiry_date: Option<String>,
    /// Nationality
    pub nationality: Option<String>,
    /// Gender
    pub gender: Option<String>,
    /// Hoodie size
    pub hoodi_size: Option<String>,
    /// One-line profile headline
    pub profile_line: Option<String>,
    /// Free-form introduction
    pub about_me: Option<String>,
    /// Profile image URL
    #[serde(alias = "image")]
    pub image_url: Option<String>,
}

/// A typed value bound to one traveler column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// TEXT column
    Text(Option<String>),
    /// DATE column
    Date(Option<NaiveDate>),
    /// INTEGER column
    Int(Option<i32>),
    /// BIGINT column
    BigInt(Option<i64>),
}

/// Column assignments produced from a request
pub type Assignments = Vec<(&'static str, ColumnValue)>;

fn text(value: &str) -> ColumnValue {
    ColumnValue::Text(fields::non_empty(Some(value)))
}

impl ProfileFields {
    /// Column assignments for every supplied field.
    pub fn assignments(&self) -> Result<Assignments, ApiError> {
        let mut columns: Assignments = Vec::new();

        let texts = [
            ("middle_name", &self.middle_name),
            ("phone", &self.phone),
            ("city", &self.city),
            ("country", &self.country),
            ("center", &self.center),
            ("passport_no", &self.passport_no),
            ("nationality", &self.nationality),
            ("gender", &self.gender),
            ("hoodi_size", &self.hoodi_size),
            ("profile_line", &self.profile_line),
            ("about_me", &self.about_me),
            ("image_url", &self.image_url),
        ];
        for (column, value) in texts {
            if let Some(value) = value {
                columns.push((column, text(value)));
            }
        }

        let dates = [
            ("birth_date", &self.birth_date),
            ("passport_issue_date", &self.passport_issue_date),
            ("passport_expiry_date", &self.passport_expiry_date),
        ];
        for (column, value) in dates {
            if let Some(value) = value {
                let date = fields::optional_date(column, Some(value))?;
                columns.push((column, ColumnValue::Date(date)));
            }
        }

        if let Some(age) = &self.age {
            let age = fields::optional_int("age", Some(age))?
                .map(|n| fields::to_i32("age", n))
                .transpose()?;
            if age.is_some_and(|n| !(0..=150).contains(&n)) {
                return Err(ApiError::invalid("age must be between 0 and 150"));
            }
            columns.push(("age", ColumnValue::Int(age)));
        }

        Ok(columns)
    }
}

/// Request structure for registering a traveler
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTravelerRequest {
    /// External traveler code
    #[validate(length(min = 1, message = "Tirth ID is required"))]
    pub tirth_id: String,
    /// Given name
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Email address
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    /// Initial password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// Assigned vehicle
    pub vehicle_id: Option<Value>,
    /// Optional profile fields
    #[serde(flatten)]
    pub profile: ProfileFields,
}

impl CreateTravelerRequest {
    /// Parses the optional vehicle assignment.
    pub fn vehicle_id(&self) -> Result<Option<i64>, ApiError> {
        fields::optional_int("vehicleId", self.vehicle_id.as_ref())
    }
}

/// Request structure for updating a traveler; absent fields are kept
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTravelerRequest {
    /// External traveler code (admin only)
    #[validate(length(min = 1, message = "Tirth ID cannot be empty"))]
    pub tirth_id: Option<String>,
    /// Given name
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Email address
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    /// New password, re-hashed before storage
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    /// Vehicle assignment (admin only); `null` unassigns
    #[serde(default, deserialize_with = "present")]
    pub vehicle_id: Option<Value>,
    /// Optional profile fields
    #[serde(flatten)]
    pub profile: ProfileFields,
}

impl UpdateTravelerRequest {
    /// Whether the request touches fields only an admin may change.
    pub fn touches_admin_fields(&self) -> bool {
        self.vehicle_id.is_some() || self.tirth_id.is_some()
    }

    /// Column assignments for every supplied field except the password.
    pub fn assignments(&self) -> Result<Assignments, ApiError> {
        let mut columns = Vec::new();

        if let Some(tirth_id) = &self.tirth_id {
            columns.push(("tirth_id", ColumnValue::Text(Some(tirth_id.trim().to_string()))));
        }
        if let Some(first_name) = &self.first_name {
            columns.push(("first_name", ColumnValue::Text(Some(first_name.trim().to_string()))));
        }
        if let Some(last_name) = &self.last_name {
            columns.push(("last_name", ColumnValue::Text(Some(last_name.trim().to_string()))));
        }
        if let Some(email) = &self.email {
            columns.push(("email", ColumnValue::Text(Some(email.trim().to_string()))));
        }
        if let Some(vehicle_id) = &self.vehicle_id {
            let vehicle_id = fields::optional_int("vehicleId", Some(vehicle_id))?;
            columns.push(("vehicle_id", ColumnValue::BigInt(vehicle_id)));
        }

        columns.extend(self.profile.assignments()?);
        Ok(columns)
    }
}

/// Query parameters for listing travelers
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerQuery {
    /// Restrict to the travelers of one vehicle
    pub vehicle_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_validation() {
        let request: CreateTravelerRequest = serde_json::from_value(json!({
            "tirthId": "T001",
            "firstName": "Asha",
            "lastName": "Patel",
            "email": "asha@x.com",
            "password": "secret1",
            "city": "Ahmedabad",
            "age": "34"
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let columns = request.profile.assignments().unwrap();
        assert!(columns.contains(&("city", ColumnValue::Text(Some("Ahmedabad".to_string())))));
        assert!(columns.contains(&("age", ColumnValue::Int(Some(34)))));

        let bad: CreateTravelerRequest = serde_json::from_value(json!({
            "tirthId": "",
            "firstName": "Asha",
            "email": "not-an-email",
            "password": "123"
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_profile_fields_clear_and_reject() {
        let fields: ProfileFields = serde_json::from_value(json!({
            "phone": "",
            "birthDate": "1990-02-03",
            "image": "https://cdn/x.jpg"
        }))
        .unwrap();
        let columns = fields.assignments().unwrap();
        assert!(columns.contains(&("phone", ColumnValue::Text(None))));
        assert!(columns.contains(&(
            "birth_date",
            ColumnValue::Date(NaiveDate::from_ymd_opt(1990, 2, 3))
        )));
        assert!(columns.contains(&(
            "image_url",
            ColumnValue::Text(Some("https://cdn/x.jpg".to_string()))
        )));

        let bad_date: ProfileFields =
            serde_json::from_value(json!({"birthDate": "03/02/1990"})).unwrap();
        assert!(bad_date.assignments().is_err());

        let bad_age: ProfileFields = serde_json::from_value(json!({"age": 400})).unwrap();
        assert!(bad_age.assignments().is_err());
    }

    #[test]
    fn test_update_request_admin_fields() {
        let request: UpdateTravelerRequest =
            serde_json::from_value(json!({"aboutMe": "Hello"})).unwrap();
        assert!(!request.touches_admin_fields());

        let request: UpdateTravelerRequest =
            serde_json::from_value(json!({"vehicleId": null})).unwrap();
        assert!(request.touches_admin_fields());
        assert_eq!(
            request.assignments().unwrap(),
            vec![("vehicle_id", ColumnValue::BigInt(None))]
        );
    }
}
