use auth_services::service::hash_password;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::ApiError;
use crate::traveler_types::*;

const DUPLICATE_TRAVELER: &str = "A traveler with this email or Tirth ID already exists";

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: ColumnValue) {
    match value {
        ColumnValue::Text(v) => builder.push_bind(v),
        ColumnValue::Date(v) => builder.push_bind(v),
        ColumnValue::Int(v) => builder.push_bind(v),
        ColumnValue::BigInt(v) => builder.push_bind(v),
    };
}

/// Service for traveler registration and profiles
pub struct TravelerService {
    pool: PgPool,
}

impl TravelerService {
    /// Creates a new instance of `TravelerService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists travelers by name, optionally restricted to one vehicle.
    pub async fn list(&self, vehicle_id: Option<i64>) -> Result<Vec<Traveler>, ApiError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(TRAVELER_COLUMNS).push(" FROM travelers");
        if let Some(vehicle_id) = vehicle_id {
            builder.push(" WHERE vehicle_id = ").push_bind(vehicle_id);
        }
        builder.push(" ORDER BY first_name, last_name, id");

        let travelers = builder
            .build_query_as::<Traveler>()
            .fetch_all(&self.pool)
            .await?;

        Ok(travelers)
    }

    /// Gets one traveler, or `NotFound`.
    pub async fn get(&self, traveler_id: i64) -> Result<Traveler, ApiError> {
        sqlx::query_as::<_, Traveler>(&format!(
            "SELECT {} FROM travelers WHERE id = $1",
            TRAVELER_COLUMNS
        ))
        .bind(traveler_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Traveler"))
    }

    /// Gets the traveler registered under `email`, or `NotFound`.
    pub async fn get_by_email(&self, email: &str) -> Result<Traveler, ApiError> {
        sqlx::query_as::<_, Traveler>(&format!(
            "SELECT {} FROM travelers WHERE LOWER(email) = LOWER($1)",
            TRAVELER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Traveler"))
    }

    /// Registers a traveler and returns the stored profile.
    pub async fn create(&self, request: &CreateTravelerRequest) -> Result<Traveler, ApiError> {
        let vehicle_id = request.vehicle_id()?;
        if let Some(vehicle_id) = vehicle_id {
            self.ensure_vehicle_exists(vehicle_id).await?;
        }

        let mut columns: Assignments = vec![
            (
                "tirth_id",
                ColumnValue::Text(Some(request.tirth_id.trim().to_string())),
            ),
            (
                "first_name",
                ColumnValue::Text(Some(request.first_name.trim().to_string())),
            ),
            (
                "last_name",
                ColumnValue::Text(Some(request.last_name.trim().to_string())),
            ),
            (
                "email",
                ColumnValue::Text(Some(request.email.trim().to_string())),
            ),
            (
                "password_hash",
                ColumnValue::Text(Some(hash_password(&request.password)?)),
            ),
            ("vehicle_id", ColumnValue::BigInt(vehicle_id)),
        ];
        columns.extend(request.profile.assignments()?);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO travelers (");
        builder.push(
            columns
                .iter()
                .map(|(column, _)| *column)
                .collect::<Vec<_>>()
                .join(", "),
        );
        builder.push(") VALUES (");
        for (i, (_, value)) in columns.into_iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, value);
        }
        builder.push(") RETURNING ").push(TRAVELER_COLUMNS);

        let traveler = builder
            .build_query_as::<Traveler>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ApiError::from_write(e, None, DUPLICATE_TRAVELER))?;

        log::info!(
            "👤 Traveler {} registered ({})",
            traveler.tirth_id,
            traveler.email
        );
        Ok(traveler)
    }

    /// Applies a partial update and returns the stored profile.
    pub async fn update(
        &self,
        traveler_id: i64,
        request: &UpdateTravelerRequest,
    ) -> Result<Traveler, ApiError> {
        let mut columns = request.assignments()?;
        if let Some(password) = &request.password {
            columns.push((
                "password_hash",
                ColumnValue::Text(Some(hash_password(password)?)),
            ));
        }
        if columns.is_empty() {
            return Err(ApiError::invalid("No fields to update"));
        }

        for (column, value) in &columns {
            if let ("vehicle_id", ColumnValue::BigInt(Some(vehicle_id))) = (*column, value) {
                self.ensure_vehicle_exists(*vehicle_id).await?;
            }
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE travelers SET ");
        for (column, value) in columns {
            builder.push(column).push(" = ");
            push_value(&mut builder, value);
            builder.push(", ");
        }
        builder.push("updated_at = NOW() WHERE id = ").push_bind(traveler_id);
        builder.push(" RETURNING ").push(TRAVELER_COLUMNS);

        builder
            .build_query_as::<Traveler>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ApiError::from_write(e, None, DUPLICATE_TRAVELER))?
            .ok_or(ApiError::NotFound("Traveler"))
    }

    async fn ensure_vehicle_exists(&self, vehicle_id: i64) -> Result<(), ApiError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM vehicles WHERE id = $1)")
                .bind(vehicle_id)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(ApiError::NotFound("Vehicle"))
        }
    }
}
