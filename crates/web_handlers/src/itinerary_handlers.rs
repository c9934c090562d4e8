use actix_web::{HttpResponse, Result, web};
use serde_json::json;
use sqlx::PgPool;

use auth_services::middleware::AdminUser;

use crate::error::ApiError;
use crate::itinerary_service::ItineraryService;
use crate::itinerary_types::*;

/// Lists the itinerary in day order
pub async fn list_itinerary(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let itinerary_service = ItineraryService::new(pool.get_ref().clone());
    let days = itinerary_service.list().await?;

    Ok(HttpResponse::Ok().json(days))
}

/// Gets one itinerary day
pub async fn get_itinerary_day(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let itinerary_service = ItineraryService::new(pool.get_ref().clone());
    let day = itinerary_service.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(day))
}

/// Creates an itinerary day
pub async fn create_itinerary_day(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<ItineraryRequest>,
) -> Result<HttpResponse, ApiError> {
    let input = request.parse()?;
    let itinerary_service = ItineraryService::new(pool.get_ref().clone());
    let day = itinerary_service.create(&input).await?;

    Ok(HttpResponse::Created().json(day))
}

/// Replaces an itinerary day
pub async fn update_itinerary_day(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<ItineraryRequest>,
) -> Result<HttpResponse, ApiError> {
    let input = request.parse()?;
    let itinerary_service = ItineraryService::new(pool.get_ref().clone());
    let day = itinerary_service.update(path.into_inner(), &input).await?;

    Ok(HttpResponse::Ok().json(day))
}

/// Deletes an itinerary day
pub async fn delete_itinerary_day(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let itinerary_service = ItineraryService::new(pool.get_ref().clone());
    itinerary_service.delete(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Itinerary day deleted successfully"
    })))
}
