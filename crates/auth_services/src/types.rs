use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lifetime of every issued bearer token, in seconds.
pub const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

static VERBOSE_ERRORS: AtomicBool = AtomicBool::new(false);

/// Enables or disables the `details` field on internal error responses.
/// Production deployments keep this off so database internals never leak.
pub fn set_verbose_errors(enabled: bool) {
    VERBOSE_ERRORS.store(enabled, Ordering::Relaxed);
}

/// Whether internal error responses carry a `details` field.
pub fn verbose_errors() -> bool {
    VERBOSE_ERRORS.load(Ordering::Relaxed)
}

/// Builds the JSON body shared by every error response.
pub fn error_body(error: &str, message: &str, details: Option<String>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "error": error,
        "message": message
    });
    if let Some(details) = details.filter(|_| verbose_errors()) {
        body["details"] = serde_json::Value::String(details);
    }
    body
}

/// Identity and role payload carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Row id of the admin or traveler
    pub id: i64,
    /// Email address of the caller
    pub email: String,
    /// Display name of the caller
    pub name: String,
    /// Role flag; true only for admin accounts
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// Whether the caller may act on a resource owned by `owner_email`.
    pub fn can_act_for(&self, owner_email: &str) -> bool {
        self.is_admin || self.email.eq_ignore_ascii_case(owner_email)
    }

    /// Self-or-admin check; `action` ends up in the denial message.
    pub fn ensure_self_or_admin(&self, owner_email: &str, action: &str) -> Result<(), AuthError> {
        if self.can_act_for(owner_email) {
            Ok(())
        } else {
            Err(AuthError::AccessDenied(format!(
                "You can only {} yourself",
                action
            )))
        }
    }

    /// Fails with `AdminRequired` unless the role claim is admin.
    pub fn ensure_admin(&self) -> Result<(), AuthError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AuthError::AdminRequired)
        }
    }
}

/// The identity a token is issued for, before timestamps are attached.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    /// Row id of the admin or traveler
    pub id: i64,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Admin role flag
    pub is_admin: bool,
}

/// Request structure for admin login
#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    /// Email address or display name of the admin
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Password for the admin account
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request structure for traveler login
#[derive(Debug, Deserialize, Validate)]
pub struct TravelerLoginRequest {
    /// Email address of the traveler
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password for the traveler account
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Admin model representing the database schema
#[derive(Debug, sqlx::FromRow)]
pub struct AdminUser {
    /// Unique identifier for the admin
    pub id: i64,
    /// Display name, also accepted as login identifier
    pub name: String,
    /// Email address of the admin
    pub email: String,
    /// Hashed password of the admin
    pub password_hash: String,
    /// Profile image URL
    pub image_url: Option<String>,
    /// Whether the admin is listed among contributors
    pub include_in_contributors: bool,
    /// JPEG quality used by the admin panel when compressing uploads
    pub image_compression_quality: f64,
    /// Timestamp when the admin was created
    pub created_at: DateTime<Utc>,
}

/// Admin profile as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    /// Unique identifier for the admin
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Profile image URL, empty when unset
    pub image: String,
    /// Whether the admin is listed among contributors
    pub include_in_contributors: bool,
    /// Upload compression quality
    pub image_compression_quality: f64,
}

impl From<AdminUser> for AdminProfile {
    fn from(admin: AdminUser) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            image: admin.image_url.unwrap_or_default(),
            include_in_contributors: admin.include_in_contributors,
            image_compression_quality: admin.image_compression_quality,
        }
    }
}

/// Request structure for updating the admin profile; absent fields are kept
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminProfileRequest {
    /// New display name
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    /// New profile image URL; empty string clears it
    pub image: Option<String>,
    /// Contributor listing flag
    pub include_in_contributors: Option<bool>,
    /// Upload compression quality
    #[validate(range(
        exclusive_min = 0.0,
        max = 1.0,
        message = "Compression quality must be in (0, 1]"
    ))]
    pub image_compression_quality: Option<f64>,
}

impl UpdateAdminProfileRequest {
    /// True when the request would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image.is_none()
            && self.include_in_contributors.is_none()
            && self.image_compression_quality.is_none()
    }
}

/// Response structure for admin login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    /// Bearer token for the admin
    pub token: String,
    /// Admin profile
    pub admin: AdminProfile,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Traveler login credentials and summary
#[derive(Debug, sqlx::FromRow)]
pub struct TravelerAccount {
    /// Unique identifier for the traveler
    pub id: i64,
    /// External traveler code
    pub tirth_id: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Hashed password
    pub password_hash: String,
    /// Assigned vehicle
    pub vehicle_id: Option<i64>,
    /// Profile image URL
    pub image_url: Option<String>,
}

impl TravelerAccount {
    /// First and last name joined for display.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Traveler summary returned on login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerSession {
    /// Unique identifier for the traveler
    pub id: i64,
    /// External traveler code
    pub tirth_id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Assigned vehicle
    pub vehicle_id: Option<i64>,
    /// Profile image URL, empty when unset
    pub image: String,
}

impl From<TravelerAccount> for TravelerSession {
    fn from(traveler: TravelerAccount) -> Self {
        Self {
            name: traveler.display_name(),
            id: traveler.id,
            tirth_id: traveler.tirth_id,
            email: traveler.email,
            vehicle_id: traveler.vehicle_id,
            image: traveler.image_url.unwrap_or_default(),
        }
    }
}

/// Response structure for traveler login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerLoginResponse {
    /// Bearer token for the traveler
    pub token: String,
    /// Traveler summary
    pub traveler: TravelerSession,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Custom error type for authentication-related errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer token on a route that needs one
    #[error("Authorization token is required")]
    MissingToken,

    /// Bad signature, malformed payload or expired token
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The provided credentials are invalid
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The route requires the admin role
    #[error("Admin access required")]
    AdminRequired,

    /// The caller is neither the owner nor an admin
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The authenticated account no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Token signing secret is missing where it is mandatory
    #[error("JWT_SECRET must be set when APP_ENV is production")]
    MissingSecret,

    /// An internal server error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error occurred while hashing the password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Token signing failed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// An error occurred while validating input data
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AuthError::MissingToken | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken | AuthError::AdminRequired | AuthError::AccessDenied(_) => {
                StatusCode::FORBIDDEN
            }
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let body = match self {
            AuthError::MissingToken => error_body(
                "missing_token",
                "Please login to access this resource",
                None,
            ),
            AuthError::InvalidToken => error_body(
                "invalid_token",
                "Your session has expired. Please login again.",
                None,
            ),
            AuthError::InvalidCredentials => {
                error_body("invalid_credentials", "Invalid username or password", None)
            }
            AuthError::AdminRequired => error_body(
                "admin_required",
                "This action requires administrator privileges",
                None,
            ),
            AuthError::AccessDenied(msg) => error_body("access_denied", msg, None),
            AuthError::UserNotFound => error_body("user_not_found", "User not found", None),
            AuthError::Validation(msg) => error_body("validation_error", msg, None),
            other => {
                log::error!("Auth internal error: {}", other);
                error_body(
                    "internal_error",
                    "An internal error occurred",
                    Some(other.to_string()),
                )
            }
        };

        actix_web::HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    fn claims(email: &str, is_admin: bool) -> Claims {
        Claims {
            id: 1,
            email: email.to_string(),
            name: "Test".to_string(),
            is_admin,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::AdminRequired.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::AccessDenied("no".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::MissingSecret.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_self_or_admin() {
        let alice = claims("alice@x.com", false);
        assert!(alice.can_act_for("alice@x.com"));
        assert!(alice.can_act_for("ALICE@x.com"));
        assert!(!alice.can_act_for("bob@x.com"));
        assert!(matches!(
            alice.ensure_self_or_admin("bob@x.com", "check in"),
            Err(AuthError::AccessDenied(_))
        ));

        let admin = claims("admin@x.com", true);
        assert!(admin.ensure_self_or_admin("bob@x.com", "check in").is_ok());
        assert!(admin.ensure_admin().is_ok());
        assert!(matches!(alice.ensure_admin(), Err(AuthError::AdminRequired)));
    }

    #[test]
    fn test_claims_wire_format_uses_is_admin() {
        let value = serde_json::to_value(claims("a@x.com", true)).unwrap();
        assert_eq!(value["isAdmin"], serde_json::Value::Bool(true));
        assert!(value.get("is_admin").is_none());
    }

    #[test]
    fn test_error_body_hides_details_unless_verbose() {
        set_verbose_errors(false);
        let body = error_body("internal_error", "boom", Some("secret".into()));
        assert!(body.get("details").is_none());
        assert_eq!(body["error"], "internal_error");
    }

    #[test]
    fn test_empty_profile_update() {
        let request: UpdateAdminProfileRequest = serde_json::from_str("{}").unwrap();
        assert!(request.is_empty());

        let request: UpdateAdminProfileRequest =
            serde_json::from_str(r#"{"imageCompressionQuality": 1.5}"#).unwrap();
        assert!(!request.is_empty());
        assert!(request.validate().is_err());
    }
}
