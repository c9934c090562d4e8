use auth_services::types::Claims;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::check_in_types::*;
use crate::error::ApiError;

const CHECK_IN_SELECT: &str = r#"
    SELECT
        ci.id, ci.vehicle_id, ci.traveler_email, ci.traveler_id, ci.active,
        ci.checked_in_at, ci.checked_out_at,
        COALESCE(NULLIF(TRIM(CONCAT_WS(' ', t.first_name, t.last_name)), ''), ci.traveler_email)
            AS traveler_name,
        v.name AS vehicle_name
    FROM check_ins ci
    LEFT JOIN travelers t ON ci.traveler_id = t.id
    LEFT JOIN vehicles v ON ci.vehicle_id = v.id
    WHERE 1=1
"#;

/// Service for vehicle boarding check-ins
pub struct CheckInService {
    pool: PgPool,
}

impl CheckInService {
    /// Creates a new instance of `CheckInService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates an active check-in and returns its id.
    ///
    /// The active-row lookup gives a clean error in the common case; the
    /// partial unique index on `(vehicle_id, LOWER(traveler_email)) WHERE active`
    /// closes the race between two concurrent requests.
    pub async fn create(&self, check_in: &NewCheckIn) -> Result<i64, ApiError> {
        let vehicle_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM vehicles WHERE id = $1)")
                .bind(check_in.vehicle_id)
                .fetch_one(&self.pool)
                .await?;
        if !vehicle_exists {
            return Err(ApiError::NotFound("Vehicle"));
        }

        let already_active: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM check_ins
                WHERE vehicle_id = $1 AND LOWER(traveler_email) = LOWER($2) AND active
            )
            "#,
        )
        .bind(check_in.vehicle_id)
        .bind(&check_in.traveler_email)
        .fetch_one(&self.pool)
        .await?;
        if already_active {
            return Err(ApiError::DuplicateCheckIn);
        }

        let traveler_id = match check_in.traveler_id {
            Some(id) => Some(id),
            None => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT id FROM travelers WHERE LOWER(email) = LOWER($1)",
                )
                .bind(&check_in.traveler_email)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO check_ins (vehicle_id, traveler_email, traveler_id, active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id
            "#,
        )
        .bind(check_in.vehicle_id)
        .bind(&check_in.traveler_email)
        .bind(traveler_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::from_write(e, None, "Check-in conflicts with an existing record"))?;

        log::info!(
            "🚌 {} checked in on vehicle {}",
            check_in.traveler_email,
            check_in.vehicle_id
        );
        Ok(id)
    }

    /// Deactivates a check-in. Only the owning traveler or an admin may do so.
    pub async fn checkout(&self, check_in_id: i64, caller: &Claims) -> Result<(), ApiError> {
        let owner: String =
            sqlx::query_scalar("SELECT traveler_email FROM check_ins WHERE id = $1")
                .bind(check_in_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(ApiError::NotFound("Check-in"))?;

        caller.ensure_self_or_admin(&owner, "check out")?;

        sqlx::query(
            "UPDATE check_ins SET active = FALSE, checked_out_at = NOW() WHERE id = $1 AND active",
        )
        .bind(check_in_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists check-ins matching `filter`, newest first.
    pub async fn list(&self, filter: &CheckInFilter) -> Result<Vec<CheckIn>, ApiError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(CHECK_IN_SELECT);

        if let Some(vehicle_id) = filter.vehicle_id {
            builder.push(" AND ci.vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(active) = filter.active {
            builder.push(" AND ci.active = ").push_bind(active);
        }
        if let Some(email) = &filter.traveler_email {
            builder.push(" AND LOWER(ci.traveler_email) = ").push_bind(email.clone());
        }
        builder.push(" ORDER BY ci.checked_in_at DESC, ci.id DESC");

        let check_ins = builder
            .build_query_as::<CheckIn>()
            .fetch_all(&self.pool)
            .await?;

        Ok(check_ins)
    }

    /// Builds the roster of one vehicle.
    pub async fn roster(
        &self,
        vehicle_id: i64,
        active: Option<bool>,
    ) -> Result<VehicleRoster, ApiError> {
        let rows = self
            .list(&CheckInFilter {
                vehicle_id: Some(vehicle_id),
                active,
                traveler_email: None,
            })
            .await?;

        Ok(VehicleRoster::from_check_ins(vehicle_id, active, rows))
    }

    /// Checks out every active traveler of a vehicle and returns how many were cleared.
    pub async fn clear_vehicle(&self, vehicle_id: i64) -> Result<u64, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE check_ins
            SET active = FALSE, checked_out_at = NOW()
            WHERE vehicle_id = $1 AND active
            "#,
        )
        .bind(vehicle_id)
        .execute(&self.pool)
        .await?;

        log::info!(
            "🧹 Cleared {} check-ins for vehicle {}",
            result.rows_affected(),
            vehicle_id
        );
        Ok(result.rows_affected())
    }
}
