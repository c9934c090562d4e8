use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

/// Idempotent schema applied on startup.
pub const SCHEMA: &str = include_str!("../sql/schema.sql");

/// Creates a connection pool to the PostgreSQL database.
pub async fn create_connection_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Tests the database connection by executing a simple query.
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    let row = sqlx::query("SELECT 1 as test").fetch_one(pool).await?;

    let test_value: i32 = row.get("test");
    log::info!(
        "✅ Database connection successful! Test value: {}",
        test_value
    );

    Ok(())
}

/// Creates any missing tables and indexes.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    log::info!("🗃️ Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_uniqueness_constraints() {
        for constraint in [
            "travelers_email_key",
            "vehicles_reg_no_key",
            "room_pairs_pair_no_key",
            "check_ins_one_active_email_idx",
        ] {
            assert!(SCHEMA.contains(constraint), "missing {}", constraint);
        }
        assert!(SCHEMA.contains("(vehicle_id, LOWER(traveler_email))"));
    }

    #[test]
    fn test_schema_is_idempotent_ddl() {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let ddl: String = statement
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join(" ");
            assert!(
                ddl.contains("IF NOT EXISTS") || ddl.contains("IF EXISTS"),
                "not idempotent: {}",
                ddl
            );
        }
    }

    #[tokio::test]
    async fn test_apply_schema_against_live_database() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let pool = create_connection_pool(&url, 1).await.unwrap();
        apply_schema(&pool).await.unwrap();
        // Running twice must be harmless
        apply_schema(&pool).await.unwrap();
        test_connection(&pool).await.unwrap();
    }
}
