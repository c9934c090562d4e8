use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use auth_services::jwt::JwtService;
use auth_services::middleware::AdminUser;
use auth_services::service::AuthService;
use auth_services::types::{
    AdminLoginRequest, AdminLoginResponse, AdminProfile, AuthError, TOKEN_TTL_SECONDS,
    UpdateAdminProfileRequest,
};

use crate::error::ApiError;
use crate::fields;
use crate::post_service::PostService;

/// Request structure for adding a tag to the catalogue
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTagRequest {
    /// Tag name
    pub tag_name: Option<String>,
}

/// Handles admin login by email or display name
pub async fn admin_login(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let auth_service = AuthService::new(pool.get_ref().clone());
    let admin = auth_service
        .authenticate_admin(&request.username, &request.password)
        .await?;

    let token = jwt_service.issue(&admin.token_subject())?;
    log::info!("🔑 Admin {} logged in", admin.email);

    Ok(HttpResponse::Ok().json(AdminLoginResponse {
        token,
        admin: admin.into(),
        expires_in: TOKEN_TTL_SECONDS,
    }))
}

/// Returns the profile of the calling admin
pub async fn get_admin_profile(
    pool: web::Data<PgPool>,
    admin: AdminUser,
) -> Result<HttpResponse, AuthError> {
    let auth_service = AuthService::new(pool.get_ref().clone());
    let profile: AdminProfile = auth_service
        .get_admin_by_id(admin.0.id)
        .await?
        .ok_or(AuthError::UserNotFound)?
        .into();

    Ok(HttpResponse::Ok().json(profile))
}

/// Partially updates the profile of the calling admin
pub async fn update_admin_profile(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    request: web::Json<UpdateAdminProfileRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let auth_service = AuthService::new(pool.get_ref().clone());
    let updated = auth_service
        .update_admin_profile(admin.0.id, &request)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Admin profile updated successfully",
        "admin": AdminProfile::from(updated)
    })))
}

/// Lists the tag catalogue
pub async fn list_tags(pool: web::Data<PgPool>) -> Result<HttpResponse, ApiError> {
    let post_service = PostService::new(pool.get_ref().clone());
    let tags = post_service.list_tags().await?;

    Ok(HttpResponse::Ok().json(tags))
}

/// Adds a tag to the catalogue
pub async fn add_tag(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<AddTagRequest>,
) -> Result<HttpResponse, ApiError> {
    let tag_name = fields::non_empty(request.tag_name.as_deref())
        .ok_or_else(|| ApiError::invalid("Tag name required"))?;

    let post_service = PostService::new(pool.get_ref().clone());
    post_service.add_tag(&tag_name).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Tag added successfully",
        "tagName": tag_name
    })))
}
