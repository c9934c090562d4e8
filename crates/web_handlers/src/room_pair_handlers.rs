use actix_web::{HttpResponse, Result, web};
use serde_json::json;
use sqlx::PgPool;

use auth_services::middleware::{AdminUser, AuthenticatedUser};

use crate::error::ApiError;
use crate::room_pair_service::RoomPairService;
use crate::room_pair_types::*;

/// Lists room pairs with their travelers
pub async fn list_room_pairs(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let room_pair_service = RoomPairService::new(pool.get_ref().clone());
    let pairs = room_pair_service.list().await?;

    Ok(HttpResponse::Ok().json(pairs))
}

/// Gets one room pair with its travelers
pub async fn get_room_pair(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let room_pair_service = RoomPairService::new(pool.get_ref().clone());
    let pair = room_pair_service.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// Creates a room pair
pub async fn create_room_pair(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<RoomPairRequest>,
) -> Result<HttpResponse, ApiError> {
    let pair = request.parse_new()?;
    let room_pair_service = RoomPairService::new(pool.get_ref().clone());
    let id = room_pair_service.create(&pair).await?;

    Ok(HttpResponse::Created().json(json!({
        "id": id,
        "message": "Room pair created successfully"
    })))
}

/// Renumbers a room pair and/or replaces its travelers
pub async fn update_room_pair(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<RoomPairRequest>,
) -> Result<HttpResponse, ApiError> {
    let patch = request.parse_patch()?;
    let room_pair_service = RoomPairService::new(pool.get_ref().clone());
    let pair = room_pair_service.update(path.into_inner(), &patch).await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// Deletes a room pair
pub async fn delete_room_pair(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let room_pair_service = RoomPairService::new(pool.get_ref().clone());
    room_pair_service.delete(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Room pair deleted successfully"
    })))
}
