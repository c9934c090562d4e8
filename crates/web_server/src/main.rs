//! Main entry point for the Yatra admin backend.
//! Serves the REST API under `/api` plus the admin panel and public website.

mod config;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, http::header, middleware::Logger, web};
use auth_services::jwt::JwtService;
use auth_services::middleware::AuthMiddleware;
use auth_services::types::set_verbose_errors;
use postgres::database::*;
use std::path::Path;
use web_handlers::{configure_api, health};

use crate::config::{AppConfig, CorsOrigins};

fn build_cors(origins: &CorsOrigins) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    match origins {
        CorsOrigins::Any => cors.allow_any_origin(),
        CorsOrigins::List(list) => list
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin)),
    }
}

fn static_dir(dir: &str, label: &str) -> Option<String> {
    if Path::new(dir).is_dir() {
        log::info!("📁 Serving {} from {}", label, dir);
        Some(dir.to_string())
    } else {
        log::info!("❌ {} directory {} not found, not serving it", label, dir);
        None
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    log::info!(
        "🚀 Starting Yatra admin server ({} mode)...",
        config.app_env
    );

    set_verbose_errors(!config.is_production());

    let jwt_service = match JwtService::from_secret(config.jwt_secret.clone(), config.is_production())
    {
        Ok(service) => service,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // Create database connection pool
    let pool = match create_connection_pool(&config.database_url, config.database_max_connections)
        .await
    {
        Ok(pool) => {
            log::info!("🗃️ Database pool created successfully");
            pool
        }
        Err(e) => {
            log::error!("❌ Failed to create database pool: {}", e);
            log::error!("💡 Check DATABASE_URL and that PostgreSQL is running");
            std::process::exit(1);
        }
    };

    if let Err(e) = test_connection(&pool).await {
        log::error!("❌ Database connection test failed: {}", e);
    }
    if let Err(e) = apply_schema(&pool).await {
        log::error!("❌ Failed to apply database schema: {}", e);
        std::process::exit(1);
    }

    let admin_dir = static_dir(&config.admin_static_dir, "admin panel");
    let public_dir = static_dir(&config.public_static_dir, "public website");

    let bind_address = config.bind_address();
    log::info!("🌐 Server will be available at: http://{}", bind_address);

    let cors_origins = config.cors_origins.clone();
    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .wrap(build_cors(&cors_origins))
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(jwt_service.clone()))
                    .configure(configure_api),
            )
            .route("/health", web::get().to(health));

        if let Some(dir) = &admin_dir {
            app = app.service(Files::new("/admin", dir).index_file("index.html"));
        }
        if let Some(dir) = &public_dir {
            app = app.service(Files::new("/", dir).index_file("index.html"));
        }
        app
    })
    .bind(bind_address)?
    .run()
    .await
}
