use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;
use validator::Validate;

use auth_services::jwt::JwtService;
use auth_services::middleware::{AdminUser, AuthenticatedUser};
use auth_services::service::AuthService;
use auth_services::types::{
    AuthError, TOKEN_TTL_SECONDS, TravelerLoginRequest, TravelerLoginResponse,
};

use crate::error::ApiError;
use crate::fields;
use crate::traveler_service::TravelerService;
use crate::traveler_types::*;

/// Handles traveler login and issues a non-admin bearer token
pub async fn traveler_login(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<TravelerLoginRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let auth_service = AuthService::new(pool.get_ref().clone());
    let traveler = auth_service
        .authenticate_traveler(&request.email, &request.password)
        .await?;

    let token = jwt_service.issue(&traveler.token_subject())?;
    log::info!("🔑 Traveler {} logged in", traveler.email);

    Ok(HttpResponse::Ok().json(TravelerLoginResponse {
        token,
        traveler: traveler.into(),
        expires_in: TOKEN_TTL_SECONDS,
    }))
}

/// Lists travelers, optionally those of one vehicle
pub async fn list_travelers(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
    query: web::Query<TravelerQuery>,
) -> Result<HttpResponse, ApiError> {
    let vehicle_id = fields::query_int("vehicleId", query.vehicle_id.as_deref())?;
    let traveler_service = TravelerService::new(pool.get_ref().clone());
    let travelers = traveler_service.list(vehicle_id).await?;

    Ok(HttpResponse::Ok().json(travelers))
}

/// Gets the caller's own traveler profile
pub async fn get_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let traveler_service = TravelerService::new(pool.get_ref().clone());
    let traveler = traveler_service.get_by_email(&user.0.email).await?;

    Ok(HttpResponse::Ok().json(traveler))
}

/// Gets one traveler
pub async fn get_traveler(
    pool: web::Data<PgPool>,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let traveler_service = TravelerService::new(pool.get_ref().clone());
    let traveler = traveler_service.get(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(traveler))
}

/// Registers a traveler
pub async fn create_traveler(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<CreateTravelerRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;

    let traveler_service = TravelerService::new(pool.get_ref().clone());
    let traveler = traveler_service.create(&request).await?;

    Ok(HttpResponse::Created().json(traveler))
}

/// Updates a traveler. Travelers may edit their own profile; vehicle
/// assignment and Tirth ID are admin-only.
pub async fn update_traveler(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<UpdateTravelerRequest>,
) -> Result<HttpResponse, ApiError> {
    request.validate()?;
    if request.touches_admin_fields() && !user.0.is_admin {
        return Err(AuthError::AccessDenied(
            "Only admins can change vehicle assignment or Tirth ID".to_string(),
        )
        .into());
    }

    let traveler_id = path.into_inner();
    let traveler_service = TravelerService::new(pool.get_ref().clone());
    let target = traveler_service.get(traveler_id).await?;
    user.0.ensure_self_or_admin(&target.email, "update")?;

    let traveler = traveler_service.update(traveler_id, &request).await?;

    Ok(HttpResponse::Ok().json(traveler))
}
