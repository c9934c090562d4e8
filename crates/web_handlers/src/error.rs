use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use auth_services::types::{AuthError, error_body};

const PAIR_NO_CONSTRAINT: &str = "room_pairs_pair_no_key";
const ACTIVE_CHECK_IN_CONSTRAINT: &str = "check_ins_one_active_email_idx";

/// Error taxonomy shared by every resource endpoint.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Authentication or authorization failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The addressed resource does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Another room pair already uses this number
    #[error("Pair number {0} already exists")]
    DuplicatePairNumber(i32),

    /// The traveler already has an active check-in on this vehicle
    #[error("Already checked in")]
    DuplicateCheckIn,

    /// Any other unique-key conflict
    #[error("{0}")]
    Conflict(String),

    /// A stored setting no longer decodes under its type tag
    #[error("Setting '{key}' holds a value that is not a valid {tag}")]
    CorruptSetting {
        /// Setting key
        key: String,
        /// Stored type tag
        tag: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    /// Shorthand for a validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Remaps a database error to `DuplicateCheckIn` / `DuplicatePairNumber`
    /// when it is a violation of the matching unique constraint, to
    /// `Conflict(conflict_message)` for any other unique violation, and
    /// leaves everything else as a database error.
    pub fn from_write(error: sqlx::Error, pair_no: Option<i32>, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db) = error {
            match db.constraint() {
                Some(ACTIVE_CHECK_IN_CONSTRAINT) => return ApiError::DuplicateCheckIn,
                Some(PAIR_NO_CONSTRAINT) => {
                    return ApiError::DuplicatePairNumber(pair_no.unwrap_or_default());
                }
                _ => {}
            }
            if db.is_unique_violation() {
                return ApiError::Conflict(conflict_message.to_string());
            }
        }
        ApiError::Database(error)
    }
}

/// Maps validator output to a single readable message.
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(format!("Validation error: {}", errors))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicatePairNumber(_)
            | ApiError::DuplicateCheckIn
            | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(err) => err.status_code(),
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::CorruptSetting { .. } | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Auth(err) => return err.error_response(),
            ApiError::Validation(msg) => error_body("validation_error", msg, None),
            ApiError::NotFound(_) => error_body("not_found", &self.to_string(), None),
            ApiError::DuplicatePairNumber(_) => {
                error_body("duplicate_pair_number", &self.to_string(), None)
            }
            ApiError::DuplicateCheckIn => error_body("duplicate_check_in", "Already checked in", None),
            ApiError::Conflict(msg) => error_body("conflict", msg, None),
            ApiError::CorruptSetting { .. } => {
                log::error!("{}", self);
                error_body("corrupt_setting", &self.to_string(), None)
            }
            ApiError::Database(err) => {
                log::error!("Database error: {}", err);
                error_body(
                    "internal_error",
                    "An internal error occurred",
                    Some(err.to_string()),
                )
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::invalid("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DuplicateCheckIn.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DuplicatePairNumber(7).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Hotel").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Auth(AuthError::MissingToken).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Auth(AuthError::AdminRequired).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_non_database_errors_pass_through_from_write() {
        let err = ApiError::from_write(sqlx::Error::RowNotFound, Some(3), "dup");
        assert!(matches!(err, ApiError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NotFound("Hotel").to_string(), "Hotel not found");
        assert_eq!(
            ApiError::DuplicatePairNumber(7).to_string(),
            "Pair number 7 already exists"
        );
    }
}
