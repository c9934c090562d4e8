use actix_web::{HttpResponse, Result, web};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use auth_services::middleware::{AdminUser, AuthenticatedUser};

use crate::error::ApiError;
use crate::traveler_service::TravelerService;
use crate::vehicle_service::VehicleService;
use crate::vehicle_types::*;

/// Lists every vehicle
pub async fn list_vehicles(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let vehicle_service = VehicleService::new(pool.get_ref().clone());
    let vehicles = vehicle_service.list().await?;

    Ok(HttpResponse::Ok().json(vehicles))
}

/// Gets one vehicle
pub async fn get_vehicle(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let vehicle_service = VehicleService::new(pool.get_ref().clone());
    let vehicle = vehicle_service.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(vehicle))
}

/// Lists the travelers assigned to a vehicle
pub async fn get_vehicle_travelers(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let vehicle_id = path.into_inner();
    let vehicle_service = VehicleService::new(pool.get_ref().clone());
    vehicle_service.get(vehicle_id).await?;

    let traveler_service = TravelerService::new(pool.get_ref().clone());
    let travelers = traveler_service.list(Some(vehicle_id)).await?;

    Ok(HttpResponse::Ok().json(travelers))
}

/// Creates a vehicle
pub async fn create_vehicle(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<VehicleRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let vehicle_service = VehicleService::new(pool.get_ref().clone());
    let vehicle = vehicle_service.create(&request).await?;

    Ok(HttpResponse::Created().json(vehicle))
}

/// Replaces a vehicle's details
pub async fn update_vehicle(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<VehicleRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let vehicle_service = VehicleService::new(pool.get_ref().clone());
    let vehicle = vehicle_service.update(path.into_inner(), &request).await?;

    Ok(HttpResponse::Ok().json(vehicle))
}

/// Deletes a vehicle
pub async fn delete_vehicle(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let vehicle_service = VehicleService::new(pool.get_ref().clone());
    let unassigned = vehicle_service.delete(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Vehicle deleted successfully",
        "unassignedTravelers": unassigned
    })))
}
