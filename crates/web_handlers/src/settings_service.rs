use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::ApiError;
use crate::settings_types::*;

const UPSERT_SETTING: &str = r#"
    INSERT INTO settings (setting_key, setting_value, setting_type, updated_at)
    VALUES ($1, $2, $3, NOW())
    ON CONFLICT (setting_key)
    DO UPDATE SET setting_value = EXCLUDED.setting_value,
                  setting_type = EXCLUDED.setting_type,
                  updated_at = NOW()
"#;

/// Typed key/value settings store.
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    /// Creates a new instance of `SettingsService` with the provided database connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns every setting as a `key -> typed value` object.
    pub async fn get_all(&self) -> Result<Map<String, Value>, ApiError> {
        let rows = sqlx::query_as::<_, StoredSetting>(
            "SELECT setting_key, setting_value, setting_type FROM settings ORDER BY setting_key",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut settings = Map::new();
        for row in rows {
            let value = row.to_json_lenient();
            settings.insert(row.setting_key, value);
        }
        Ok(settings)
    }

    /// Returns one setting, or `NotFound`.
    pub async fn get(&self, key: &str) -> Result<SettingResponse, ApiError> {
        let row = sqlx::query_as::<_, StoredSetting>(
            "SELECT setting_key, setting_value, setting_type FROM settings WHERE setting_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("Setting"))?;

        let value = row.decode()?;
        Ok(SettingResponse {
            key: row.setting_key,
            setting_type: value.setting_type(),
            value: value.to_json(),
        })
    }

    /// Upserts one setting. Last writer wins.
    pub async fn put(&self, key: &str, value: SettingValue) -> Result<SettingResponse, ApiError> {
        sqlx::query(UPSERT_SETTING)
            .bind(key)
            .bind(value.encode())
            .bind(value.setting_type().as_str())
            .execute(&self.pool)
            .await?;

        log::info!("⚙️ Setting '{}' updated", key);

        Ok(SettingResponse {
            key: key.to_string(),
            setting_type: value.setting_type(),
            value: value.to_json(),
        })
    }

    /// Upserts every entry of `settings` in one transaction.
    pub async fn put_many(&self, settings: Vec<(String, SettingValue)>) -> Result<usize, ApiError> {
        let mut tx: Transaction<'_, Postgres> = self.pool.begin().await?;

        for (key, value) in &settings {
            sqlx::query(UPSERT_SETTING)
                .bind(key)
                .bind(value.encode())
                .bind(value.setting_type().as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        log::info!("⚙️ {} settings updated", settings.len());
        Ok(settings.len())
    }
}
