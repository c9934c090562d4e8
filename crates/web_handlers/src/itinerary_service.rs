use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ApiError;
use crate::itinerary_types::*;

const ITINERARY_COLUMNS: &str =
    "id, day, date, place, city, state, country, lat, lng, description";

/// Service for the trip itinerary
pub struct ItineraryService {
    pool: PgPool,
}

impl ItineraryService {
    /// Creates a new instance of `ItineraryService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists every day in day order, with activities and images.
    pub async fn list(&self) -> Result<Vec<ItineraryDay>, ApiError> {
        let rows = sqlx::query_as::<_, ItineraryRow>(&format!(
            "SELECT {} FROM itinerary ORDER BY day ASC",
            ITINERARY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let activities = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT itinerary_id, time, activity
            FROM itinerary_activities
            ORDER BY itinerary_id, display_order
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let images = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT itinerary_id, image_url
            FROM itinerary_images
            ORDER BY itinerary_id, display_order
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut activities_by_day: HashMap<i64, Vec<Activity>> = HashMap::new();
        for row in activities {
            activities_by_day
                .entry(row.itinerary_id)
                .or_default()
                .push(row.activity);
        }
        let mut images_by_day: HashMap<i64, Vec<String>> = HashMap::new();
        for row in images {
            images_by_day
                .entry(row.itinerary_id)
                .or_default()
                .push(row.image_url);
        }

        Ok(rows
            .into_iter()
            .map(|day| ItineraryDay {
                activities: activities_by_day.remove(&day.id).unwrap_or_default(),
                images: images_by_day.remove(&day.id).unwrap_or_default(),
                day,
            })
            .collect())
    }

    /// Gets one day, or `NotFound`.
    pub async fn get(&self, itinerary_id: i64) -> Result<ItineraryDay, ApiError> {
        let day = sqlx::query_as::<_, ItineraryRow>(&format!(
            "SELECT {} FROM itinerary WHERE id = $1",
            ITINERARY_COLUMNS
        ))
        .bind(itinerary_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Itinerary day"))?;

        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT time, activity FROM itinerary_activities
            WHERE itinerary_id = $1
            ORDER BY display_order
            "#,
        )
        .bind(itinerary_id)
        .fetch_all(&self.pool)
        .await?;

        let images: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT image_url FROM itinerary_images
            WHERE itinerary_id = $1
            ORDER BY display_order
            "#,
        )
        .bind(itinerary_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ItineraryDay {
            day,
            activities,
            images,
        })
    }

    /// Creates a day with its activities and images in one transaction.
    pub async fn create(&self, input: &ItineraryInput) -> Result<ItineraryDay, ApiError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO itinerary (day, date, place, city, state, country, lat, lng, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(input.day)
        .bind(input.date)
        .bind(&input.place)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.country)
        .bind(input.lat)
        .bind(input.lng)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_day(e, input.day))?;

        if let Some(activities) = &input.activities {
            insert_activities(&mut tx, id, activities).await?;
        }
        if let Some(images) = &input.images {
            insert_images(&mut tx, id, images).await?;
        }

        tx.commit().await?;

        log::info!("🗺️ Itinerary day {} ({}) created", input.day, input.place);
        self.get(id).await
    }

    /// Replaces a day's fields; supplied activities/images replace the old lists.
    pub async fn update(
        &self,
        itinerary_id: i64,
        input: &ItineraryInput,
    ) -> Result<ItineraryDay, ApiError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE itinerary SET
                day = $2, date = $3, place = $4, city = $5, state = $6,
                country = $7, lat = $8, lng = $9, description = $10
            WHERE id = $1
            "#,
        )
        .bind(itinerary_id)
        .bind(input.day)
        .bind(input.date)
        .bind(&input.place)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.country)
        .bind(input.lat)
        .bind(input.lng)
        .bind(&input.description)
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_day(e, input.day))?;
        if updated.rows_affected() == 0 {
            return Err(ApiError::NotFound("Itinerary day"));
        }

        if let Some(activities) = &input.activities {
            sqlx::query("DELETE FROM itinerary_activities WHERE itinerary_id = $1")
                .bind(itinerary_id)
                .execute(&mut *tx)
                .await?;
            insert_activities(&mut tx, itinerary_id, activities).await?;
        }
        if let Some(images) = &input.images {
            sqlx::query("DELETE FROM itinerary_images WHERE itinerary_id = $1")
                .bind(itinerary_id)
                .execute(&mut *tx)
                .await?;
            insert_images(&mut tx, itinerary_id, images).await?;
        }

        tx.commit().await?;

        self.get(itinerary_id).await
    }

    /// Deletes a day; its activities and images go with it.
    pub async fn delete(&self, itinerary_id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM itinerary WHERE id = $1")
            .bind(itinerary_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Itinerary day"));
        }
        Ok(())
    }
}

fn duplicate_day(error: sqlx::Error, day: i32) -> ApiError {
    ApiError::from_write(
        error,
        None,
        &format!("Itinerary day {} already exists", day),
    )
}

async fn insert_activities(
    tx: &mut Transaction<'_, Postgres>,
    itinerary_id: i64,
    activities: &[Activity],
) -> Result<(), ApiError> {
    for (order, activity) in activities.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO itinerary_activities (itinerary_id, time, activity, display_order)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(itinerary_id)
        .bind(&activity.time)
        .bind(&activity.activity)
        .bind(order as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn insert_images(
    tx: &mut Transaction<'_, Postgres>,
    itinerary_id: i64,
    images: &[String],
) -> Result<(), ApiError> {
    for (order, url) in images.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO itinerary_images (itinerary_id, image_url, display_order)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(itinerary_id)
        .bind(url)
        .bind(order as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
