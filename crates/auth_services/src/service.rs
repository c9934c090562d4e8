use bcrypt::{DEFAULT_COST, hash, verify};
use lazy_static::lazy_static;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::types::{AdminUser, AuthError, TokenSubject, TravelerAccount, UpdateAdminProfileRequest};

lazy_static! {
    // Verified against when the identifier is unknown so both failure paths cost one bcrypt run.
    static ref DUMMY_HASH: String =
        hash("yatra-dummy-password", DEFAULT_COST).unwrap_or_default();
}

const ADMIN_COLUMNS: &str = r#"
    id, name, email, password_hash, image_url, include_in_contributors,
    image_compression_quality, created_at
"#;

/// Hashes a plaintext password with the service-wide bcrypt cost.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// Checks `password` against `stored_hash`, or against a dummy hash when the
/// account does not exist. Always fails uniformly with `InvalidCredentials`.
fn check_password(password: &str, stored_hash: Option<&str>) -> Result<(), AuthError> {
    let candidate = stored_hash.unwrap_or(DUMMY_HASH.as_str());
    let matches = verify(password, candidate).unwrap_or(false);

    if matches && stored_hash.is_some() {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Credential store for admin and traveler accounts.
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    /// Creates a new instance of `AuthService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Authenticates an admin by email OR display name.
    pub async fn authenticate_admin(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        let identifier = identifier.trim();
        let admin = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {} FROM admin_users WHERE LOWER(email) = LOWER($1) OR name = $1 ORDER BY id LIMIT 1",
            ADMIN_COLUMNS
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        check_password(password, admin.as_ref().map(|a| a.password_hash.as_str()))?;

        admin.ok_or(AuthError::InvalidCredentials)
    }

    /// Authenticates a traveler by email.
    pub async fn authenticate_traveler(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TravelerAccount, AuthError> {
        let traveler = sqlx::query_as::<_, TravelerAccount>(
            r#"
            SELECT id, tirth_id, first_name, last_name, email, password_hash, vehicle_id, image_url
            FROM travelers
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        check_password(
            password,
            traveler
                .as_ref()
                .map(|t| t.password_hash.as_str())
                .filter(|h| !h.is_empty()),
        )?;

        traveler.ok_or(AuthError::InvalidCredentials)
    }

    /// Retrieves an admin by id.
    pub async fn get_admin_by_id(&self, admin_id: i64) -> Result<Option<AdminUser>, AuthError> {
        let admin = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {} FROM admin_users WHERE id = $1",
            ADMIN_COLUMNS
        ))
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    /// Applies a partial profile update and returns the stored result.
    pub async fn update_admin_profile(
        &self,
        admin_id: i64,
        request: &UpdateAdminProfileRequest,
    ) -> Result<AdminUser, AuthError> {
        if request.is_empty() {
            return Err(AuthError::Validation("No fields to update".to_string()));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE admin_users SET ");
        let mut fields = builder.separated(", ");

        if let Some(name) = &request.name {
            fields.push("name = ").push_bind_unseparated(name.trim().to_string());
        }
        if let Some(image) = &request.image {
            let image = Some(image.trim().to_string()).filter(|s| !s.is_empty());
            fields.push("image_url = ").push_bind_unseparated(image);
        }
        if let Some(include) = request.include_in_contributors {
            fields
                .push("include_in_contributors = ")
                .push_bind_unseparated(include);
        }
        if let Some(quality) = request.image_compression_quality {
            fields
                .push("image_compression_quality = ")
                .push_bind_unseparated(quality);
        }

        builder.push(" WHERE id = ").push_bind(admin_id);
        builder.push(" RETURNING ").push(ADMIN_COLUMNS);

        let admin = builder
            .build_query_as::<AdminUser>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        log::info!("Admin {} updated their profile", admin.email);
        Ok(admin)
    }
}

impl AdminUser {
    /// Identity to embed in the admin's bearer token.
    pub fn token_subject(&self) -> TokenSubject {
        TokenSubject {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            is_admin: true,
        }
    }
}

impl TravelerAccount {
    /// Identity to embed in the traveler's bearer token.
    pub fn token_subject(&self) -> TokenSubject {
        TokenSubject {
            id: self.id,
            email: self.email.clone(),
            name: self.display_name(),
            is_admin: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_password_uniform_failure() {
        let stored = hash("correct horse", 4).unwrap();

        assert!(check_password("correct horse", Some(&stored)).is_ok());
        assert!(matches!(
            check_password("wrong", Some(&stored)),
            Err(AuthError::InvalidCredentials)
        ));
        // Unknown account: even the dummy password must not authenticate
        assert!(matches!(
            check_password("yatra-dummy-password", None),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_no_hardcoded_fallback_password() {
        let stored = hash("real-password", 4).unwrap();
        assert!(check_password("yatra@2024", Some(&stored)).is_err());
    }

    #[test]
    fn test_malformed_stored_hash_is_invalid_credentials() {
        assert!(matches!(
            check_password("anything", Some("not-a-bcrypt-hash")),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
