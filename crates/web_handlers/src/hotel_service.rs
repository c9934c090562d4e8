use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::ApiError;
use crate::hotel_types::*;

const HOTEL_COLUMNS: &str = r#"
    id, name, address, city, state, country, lat, lng, phone, email,
    total_floors, total_rooms, check_in_date, check_out_date, notes, created_at
"#;

/// Service for hotels and their room allotments
pub struct HotelService {
    pool: PgPool,
}

impl HotelService {
    /// Creates a new instance of `HotelService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists hotels by name.
    pub async fn list(&self) -> Result<Vec<Hotel>, ApiError> {
        let hotels = sqlx::query_as::<_, Hotel>(&format!(
            "SELECT {} FROM hotels ORDER BY name ASC",
            HOTEL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(hotels)
    }

    /// Gets one hotel, or `NotFound`.
    pub async fn get(&self, hotel_id: i64) -> Result<Hotel, ApiError> {
        sqlx::query_as::<_, Hotel>(&format!(
            "SELECT {} FROM hotels WHERE id = $1",
            HOTEL_COLUMNS
        ))
        .bind(hotel_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Hotel"))
    }

    /// Creates a hotel and returns its id.
    pub async fn create(&self, hotel: &HotelInput) -> Result<i64, ApiError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO hotels (
                name, address, city, state, country, lat, lng, phone, email,
                total_floors, total_rooms, check_in_date, check_out_date, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(&hotel.name)
        .bind(&hotel.address)
        .bind(&hotel.city)
        .bind(&hotel.state)
        .bind(&hotel.country)
        .bind(hotel.lat)
        .bind(hotel.lng)
        .bind(&hotel.phone)
        .bind(&hotel.email)
        .bind(hotel.total_floors)
        .bind(hotel.total_rooms)
        .bind(hotel.check_in_date)
        .bind(hotel.check_out_date)
        .bind(&hotel.notes)
        .fetch_one(&self.pool)
        .await?;

        log::info!("🏨 Hotel '{}' created with id {}", hotel.name, id);
        Ok(id)
    }

    /// Replaces every field of an existing hotel.
    pub async fn update(&self, hotel_id: i64, hotel: &HotelInput) -> Result<Hotel, ApiError> {
        sqlx::query_as::<_, Hotel>(&format!(
            r#"
            UPDATE hotels SET
                name = $2, address = $3, city = $4, state = $5, country = $6,
                lat = $7, lng = $8, phone = $9, email = $10,
                total_floors = $11, total_rooms = $12,
                check_in_date = $13, check_out_date = $14, notes = $15
            WHERE id = $1
            RETURNING {}
            "#,
            HOTEL_COLUMNS
        ))
        .bind(hotel_id)
        .bind(&hotel.name)
        .bind(&hotel.address)
        .bind(&hotel.city)
        .bind(&hotel.state)
        .bind(&hotel.country)
        .bind(hotel.lat)
        .bind(hotel.lng)
        .bind(&hotel.phone)
        .bind(&hotel.email)
        .bind(hotel.total_floors)
        .bind(hotel.total_rooms)
        .bind(hotel.check_in_date)
        .bind(hotel.check_out_date)
        .bind(&hotel.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Hotel"))
    }

    /// Deletes a hotel together with its allotments.
    ///
    /// The existence check comes first so a missing hotel is reported as
    /// `NotFound` without touching any allotment; the cascade runs in one
    /// transaction.
    pub async fn delete(&self, hotel_id: i64) -> Result<u64, ApiError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM hotels WHERE id = $1 FOR UPDATE")
                .bind(hotel_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound("Hotel"));
        }

        let allotments = sqlx::query("DELETE FROM room_allotments WHERE hotel_id = $1")
            .bind(hotel_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM hotels WHERE id = $1")
            .bind(hotel_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        log::info!(
            "🗑️ Hotel {} deleted along with {} room allotments",
            hotel_id,
            allotments
        );
        Ok(allotments)
    }

    /// Lists allotments ordered by date, hotel, floor and room.
    pub async fn list_allotments(
        &self,
        filter: &AllotmentFilter,
    ) -> Result<Vec<RoomAllotment>, ApiError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT
                ra.id, ra.hotel_id, ra.traveler_id, ra.date, ra.floor, ra.room,
                ra.pair_no, ra.created_at,
                h.name AS hotel_name,
                t.first_name, t.last_name, t.email
            FROM room_allotments ra
            LEFT JOIN hotels h ON ra.hotel_id = h.id
            LEFT JOIN travelers t ON ra.traveler_id = t.id
            WHERE 1=1
            "#,
        );

        if let Some(hotel_id) = filter.hotel_id {
            builder.push(" AND ra.hotel_id = ").push_bind(hotel_id);
        }
        if let Some(date) = filter.date {
            builder.push(" AND ra.date = ").push_bind(date);
        }
        if let Some(traveler_id) = filter.traveler_id {
            builder.push(" AND ra.traveler_id = ").push_bind(traveler_id);
        }
        builder.push(" ORDER BY ra.date, ra.hotel_id, ra.floor, ra.room");

        let allotments = builder
            .build_query_as::<RoomAllotment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(allotments)
    }

    /// Creates a room allotment and returns its id.
    pub async fn create_allotment(&self, allotment: &NewAllotment) -> Result<i64, ApiError> {
        let hotel_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM hotels WHERE id = $1)")
                .bind(allotment.hotel_id)
                .fetch_one(&self.pool)
                .await?;
        if !hotel_exists {
            return Err(ApiError::NotFound("Hotel"));
        }

        let traveler_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM travelers WHERE id = $1)")
                .bind(allotment.traveler_id)
                .fetch_one(&self.pool)
                .await?;
        if !traveler_exists {
            return Err(ApiError::NotFound("Traveler"));
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO room_allotments (hotel_id, traveler_id, date, floor, room, pair_no)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(allotment.hotel_id)
        .bind(allotment.traveler_id)
        .bind(allotment.date)
        .bind(&allotment.floor)
        .bind(&allotment.room)
        .bind(allotment.pair_no)
        .fetch_one(&self.pool)
        .await?;

        log::debug!(
            "Room allotment {} created for traveler {} at hotel {} on {}",
            id,
            allotment.traveler_id,
            allotment.hotel_id,
            allotment.date
        );
        Ok(id)
    }

    /// Applies a partial update to one allotment.
    pub async fn update_allotment(
        &self,
        allotment_id: i64,
        patch: &AllotmentPatch,
    ) -> Result<(), ApiError> {
        if patch.is_empty() {
            return Err(ApiError::invalid("No fields to update"));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE room_allotments SET ");
        let mut fields = builder.separated(", ");

        if let Some(floor) = &patch.floor {
            fields.push("floor = ");
            fields.push_bind_unseparated(floor.clone());
        }
        if let Some(room) = &patch.room {
            fields.push("room = ");
            fields.push_bind_unseparated(room.clone());
        }
        if let Some(pair_no) = patch.pair_no {
            fields.push("pair_no = ");
            fields.push_bind_unseparated(pair_no);
        }

        builder.push(" WHERE id = ").push_bind(allotment_id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Room allotment"));
        }
        Ok(())
    }

    /// Deletes one allotment.
    pub async fn delete_allotment(&self, allotment_id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM room_allotments WHERE id = $1")
            .bind(allotment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Room allotment"));
        }
        Ok(())
    }

    /// Deletes every allotment of a hotel on one night and returns how many were removed.
    pub async fn delete_allotments_for_night(
        &self,
        hotel_id: i64,
        date: NaiveDate,
    ) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM room_allotments WHERE hotel_id = $1 AND date = $2")
            .bind(hotel_id)
            .bind(date)
            .execute(&self.pool)
            .await?;

        log::info!(
            "🗑️ Deleted {} room allotments for hotel {} on {}",
            result.rows_affected(),
            hotel_id,
            date
        );
        Ok(result.rows_affected())
    }
}
