use actix_web::{HttpResponse, Result, web};
use serde_json::json;
use sqlx::PgPool;

use auth_services::middleware::{AdminUser, AuthenticatedUser};

use crate::check_in_service::CheckInService;
use crate::check_in_types::*;
use crate::error::ApiError;

/// Lists check-ins filtered by vehicle, active flag and traveler email
pub async fn list_check_ins(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    query: web::Query<CheckInQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.parse()?;
    let check_in_service = CheckInService::new(pool.get_ref().clone());
    let check_ins = check_in_service.list(&filter).await?;

    Ok(HttpResponse::Ok().json(check_ins))
}

/// Gets the boarding roster of one vehicle
pub async fn get_vehicle_roster(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
    query: web::Query<RosterQuery>,
) -> Result<HttpResponse, ApiError> {
    let vehicle_id = path.into_inner();
    let check_in_service = CheckInService::new(pool.get_ref().clone());
    let roster = check_in_service
        .roster(vehicle_id, parse_active(query.active.as_deref()))
        .await?;

    Ok(HttpResponse::Ok().json(roster))
}

/// Checks a traveler in. Non-admins may only check themselves in.
pub async fn create_check_in(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    request: web::Json<CreateCheckInRequest>,
) -> Result<HttpResponse, ApiError> {
    let check_in = request.parse()?.scoped_to(&user.0)?;

    let check_in_service = CheckInService::new(pool.get_ref().clone());
    let id = check_in_service.create(&check_in).await?;

    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "message": "Checked in successfully"
    })))
}

/// Checks a traveler out of a vehicle
pub async fn checkout(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let check_in_id = path.into_inner();
    let check_in_service = CheckInService::new(pool.get_ref().clone());
    check_in_service.checkout(check_in_id, &user.0).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully"
    })))
}

/// Clears every active check-in of a vehicle
pub async fn clear_vehicle_check_ins(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let vehicle_id = path.into_inner();
    let check_in_service = CheckInService::new(pool.get_ref().clone());
    let cleared = check_in_service.clear_vehicle(vehicle_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "All check-ins cleared for vehicle",
        "clearedCount": cleared
    })))
}
