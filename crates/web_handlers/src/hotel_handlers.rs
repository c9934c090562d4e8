use actix_web::{HttpResponse, Result, web};
use serde_json::json;
use sqlx::PgPool;

use auth_services::middleware::{AdminUser, AuthenticatedUser};

use crate::error::ApiError;
use crate::hotel_service::HotelService;
use crate::hotel_types::*;

/// Lists every hotel
pub async fn list_hotels(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let hotels = hotel_service.list().await?;

    Ok(HttpResponse::Ok().json(hotels))
}

/// Gets one hotel
pub async fn get_hotel(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let hotel = hotel_service.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(hotel))
}

/// Creates a hotel
pub async fn create_hotel(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<HotelRequest>,
) -> Result<HttpResponse, ApiError> {
    let hotel = request.parse()?;
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let id = hotel_service.create(&hotel).await?;

    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "message": "Hotel created successfully"
    })))
}

/// Replaces a hotel's details
pub async fn update_hotel(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<HotelRequest>,
) -> Result<HttpResponse, ApiError> {
    let hotel = request.parse()?;
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let updated = hotel_service.update(path.into_inner(), &hotel).await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes a hotel and its room allotments
pub async fn delete_hotel(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let removed = hotel_service.delete(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Hotel deleted successfully",
        "deletedAllotments": removed
    })))
}

/// Lists room allotments filtered by hotel, date and traveler
pub async fn list_allotments(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
    query: web::Query<AllotmentQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.parse()?;
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let allotments = hotel_service.list_allotments(&filter).await?;

    Ok(HttpResponse::Ok().json(allotments))
}

/// Creates a room allotment
pub async fn create_allotment(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<CreateAllotmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let allotment = request.parse()?;
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let id = hotel_service.create_allotment(&allotment).await?;

    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "message": "Room allotment created successfully"
    })))
}

/// Updates floor, room or pair number of an allotment
pub async fn update_allotment(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<UpdateAllotmentRequest>,
) -> Result<HttpResponse, ApiError> {
    let patch = request.parse()?;
    let hotel_service = HotelService::new(pool.get_ref().clone());
    hotel_service
        .update_allotment(path.into_inner(), &patch)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Room allotment updated successfully"
    })))
}

/// Deletes one allotment
pub async fn delete_allotment(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let hotel_service = HotelService::new(pool.get_ref().clone());
    hotel_service.delete_allotment(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Room allotment deleted successfully"
    })))
}

/// Deletes every allotment of a hotel on one night
pub async fn delete_allotments_for_night(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    query: web::Query<AllotmentQuery>,
) -> Result<HttpResponse, ApiError> {
    let (hotel_id, date) = query.parse_bulk_delete()?;
    let hotel_service = HotelService::new(pool.get_ref().clone());
    let deleted = hotel_service
        .delete_allotments_for_night(hotel_id, date)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Room allotments deleted successfully",
        "deletedCount": deleted
    })))
}
