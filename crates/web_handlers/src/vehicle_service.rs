use sqlx::PgPool;

use crate::error::ApiError;
use crate::vehicle_types::*;

const VEHICLE_COLUMNS: &str = r#"
    id, name, type, capacity, reg_no, group_leader_name, group_leader_email,
    driver_name, driver_phone, color, status, notes, created_at
"#;

const DUPLICATE_REG_NO: &str = "A vehicle with this registration number already exists";

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Service for the vehicle fleet
pub struct VehicleService {
    pool: PgPool,
}

impl VehicleService {
    /// Creates a new instance of `VehicleService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists vehicles by name.
    pub async fn list(&self) -> Result<Vec<Vehicle>, ApiError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {} FROM vehicles ORDER BY name ASC, id ASC",
            VEHICLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    /// Gets one vehicle, or `NotFound`.
    pub async fn get(&self, vehicle_id: i64) -> Result<Vehicle, ApiError> {
        sqlx::query_as::<_, Vehicle>(&format!(
            "SELECT {} FROM vehicles WHERE id = $1",
            VEHICLE_COLUMNS
        ))
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Vehicle"))
    }

    /// Creates a vehicle.
    pub async fn create(&self, request: &VehicleRequest) -> Result<Vehicle, ApiError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (
                name, type, capacity, reg_no, group_leader_name, group_leader_email,
                driver_name, driver_phone, color, status, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(request.name.trim())
        .bind(trimmed(&request.vehicle_type))
        .bind(request.capacity)
        .bind(trimmed(&request.reg_no))
        .bind(trimmed(&request.group_leader_name))
        .bind(trimmed(&request.group_leader_email))
        .bind(trimmed(&request.driver_name))
        .bind(trimmed(&request.driver_phone))
        .bind(request.color())
        .bind(request.status.as_str())
        .bind(trimmed(&request.notes))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ApiError::from_write(e, None, DUPLICATE_REG_NO))?;

        log::info!("🚌 Vehicle '{}' created with id {}", vehicle.name, vehicle.id);
        Ok(vehicle)
    }

    /// Replaces every field of a vehicle.
    pub async fn update(
        &self,
        vehicle_id: i64,
        request: &VehicleRequest,
    ) -> Result<Vehicle, ApiError> {
        sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            UPDATE vehicles SET
                name = $2, type = $3, capacity = $4, reg_no = $5,
                group_leader_name = $6, group_leader_email = $7,
                driver_name = $8, driver_phone = $9, color = $10, status = $11, notes = $12
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        ))
        .bind(vehicle_id)
        .bind(request.name.trim())
        .bind(trimmed(&request.vehicle_type))
        .bind(request.capacity)
        .bind(trimmed(&request.reg_no))
        .bind(trimmed(&request.group_leader_name))
        .bind(trimmed(&request.group_leader_email))
        .bind(trimmed(&request.driver_name))
        .bind(trimmed(&request.driver_phone))
        .bind(request.color())
        .bind(request.status.as_str())
        .bind(trimmed(&request.notes))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ApiError::from_write(e, None, DUPLICATE_REG_NO))?
        .ok_or(ApiError::NotFound("Vehicle"))
    }

    /// Deletes a vehicle, unassigning its travelers; its check-ins go with it.
    /// Returns how many travelers were unassigned.
    pub async fn delete(&self, vehicle_id: i64) -> Result<u64, ApiError> {
        let mut tx = self.pool.begin().await?;

        let unassigned = sqlx::query(
            "UPDATE travelers SET vehicle_id = NULL, updated_at = NOW() WHERE vehicle_id = $1",
        )
        .bind(vehicle_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(vehicle_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(ApiError::NotFound("Vehicle"));
        }

        tx.commit().await?;

        log::info!(
            "🗑️ Vehicle {} deleted, {} travelers unassigned",
            vehicle_id,
            unassigned
        );
        Ok(unassigned)
    }
}
