use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ApiError;
use crate::room_pair_types::*;

const MEMBER_SELECT: &str = r#"
    SELECT
        rpt.room_pair_id,
        t.id,
        TRIM(CONCAT_WS(' ', t.first_name, t.last_name)) AS name,
        t.email,
        t.image_url
    FROM room_pair_travelers rpt
    INNER JOIN travelers t ON t.id = rpt.traveler_id
"#;

/// Service for room pairs and their traveler memberships
pub struct RoomPairService {
    pool: PgPool,
}

impl RoomPairService {
    /// Creates a new instance of `RoomPairService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists every pair with its travelers, ordered by pair number.
    pub async fn list(&self) -> Result<Vec<RoomPair>, ApiError> {
        let rows = sqlx::query_as::<_, RoomPairRow>(
            "SELECT id, pair_no, created_at FROM room_pairs ORDER BY pair_no ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let members = sqlx::query_as::<_, PairMembership>(&format!(
            "{} ORDER BY rpt.room_pair_id, t.id",
            MEMBER_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_pair: HashMap<i64, Vec<PairTraveler>> = HashMap::new();
        for member in members {
            by_pair
                .entry(member.room_pair_id)
                .or_default()
                .push(member.traveler);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let travelers = by_pair.remove(&row.id).unwrap_or_default();
                RoomPair::new(row, travelers)
            })
            .collect())
    }

    /// Gets one pair with its travelers, or `NotFound`.
    pub async fn get(&self, pair_id: i64) -> Result<RoomPair, ApiError> {
        let row = sqlx::query_as::<_, RoomPairRow>(
            "SELECT id, pair_no, created_at FROM room_pairs WHERE id = $1",
        )
        .bind(pair_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Room pair"))?;

        let members = sqlx::query_as::<_, PairMembership>(&format!(
            "{} WHERE rpt.room_pair_id = $1 ORDER BY t.id",
            MEMBER_SELECT
        ))
        .bind(pair_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RoomPair::new(
            row,
            members.into_iter().map(|m| m.traveler).collect(),
        ))
    }

    /// Creates a pair and its memberships atomically.
    pub async fn create(&self, pair: &NewRoomPair) -> Result<i64, ApiError> {
        let mut tx = self.pool.begin().await?;

        let pair_id: i64 =
            sqlx::query_scalar("INSERT INTO room_pairs (pair_no) VALUES ($1) RETURNING id")
                .bind(pair.pair_no)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    ApiError::from_write(e, Some(pair.pair_no), "Pair number already exists")
                })?;

        replace_members(&mut tx, pair_id, &pair.traveler_ids).await?;

        tx.commit().await?;

        log::info!(
            "🛏️ Room pair {} created with {} travelers",
            pair.pair_no,
            pair.traveler_ids.len()
        );
        Ok(pair_id)
    }

    /// Renumbers a pair and/or fully replaces its members, atomically.
    pub async fn update(&self, pair_id: i64, patch: &RoomPairPatch) -> Result<RoomPair, ApiError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM room_pairs WHERE id = $1 FOR UPDATE")
                .bind(pair_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound("Room pair"));
        }

        if let Some(pair_no) = patch.pair_no {
            sqlx::query("UPDATE room_pairs SET pair_no = $1 WHERE id = $2")
                .bind(pair_no)
                .bind(pair_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| ApiError::from_write(e, Some(pair_no), "Pair number already exists"))?;
        }

        if let Some(traveler_ids) = &patch.traveler_ids {
            sqlx::query("DELETE FROM room_pair_travelers WHERE room_pair_id = $1")
                .bind(pair_id)
                .execute(&mut *tx)
                .await?;
            replace_members(&mut tx, pair_id, traveler_ids).await?;
        }

        tx.commit().await?;

        self.get(pair_id).await
    }

    /// Deletes a pair; memberships go with it.
    pub async fn delete(&self, pair_id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM room_pairs WHERE id = $1")
            .bind(pair_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Room pair"));
        }
        Ok(())
    }
}

/// Inserts memberships for `traveler_ids`, rejecting ids that match no traveler.
async fn replace_members(
    tx: &mut Transaction<'_, Postgres>,
    pair_id: i64,
    traveler_ids: &[i64],
) -> Result<(), ApiError> {
    if traveler_ids.is_empty() {
        return Ok(());
    }

    let known: Vec<i64> = sqlx::query_scalar("SELECT id FROM travelers WHERE id = ANY($1)")
        .bind(traveler_ids)
        .fetch_all(&mut **tx)
        .await?;
    let unknown: Vec<String> = traveler_ids
        .iter()
        .filter(|id| !known.contains(id))
        .map(i64::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(ApiError::invalid(format!(
            "Unknown traveler id(s): {}",
            unknown.join(", ")
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO room_pair_travelers (room_pair_id, traveler_id)
        SELECT $1, UNNEST($2::BIGINT[])
        "#,
    )
    .bind(pair_id)
    .bind(traveler_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
