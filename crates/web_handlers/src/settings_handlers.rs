use actix_web::{HttpResponse, Result, web};
use serde_json::{Map, Value, json};
use sqlx::PgPool;

use auth_services::middleware::{AdminUser, OptionalUser};

use crate::error::ApiError;
use crate::settings_service::SettingsService;
use crate::settings_types::*;

fn validate_key(key: &str) -> Result<&str, ApiError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ApiError::invalid("Setting key is required"));
    }
    Ok(key)
}

/// Lists every setting as a `key -> value` object
pub async fn get_settings(
    pool: web::Data<PgPool>,
    _user: OptionalUser,
) -> Result<HttpResponse, ApiError> {
    let settings_service = SettingsService::new(pool.get_ref().clone());
    let settings = settings_service.get_all().await?;

    Ok(HttpResponse::Ok().json(settings))
}

/// Gets one setting as `{key, value, type}`
pub async fn get_setting(
    pool: web::Data<PgPool>,
    _user: OptionalUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    let settings_service = SettingsService::new(pool.get_ref().clone());
    let setting = settings_service.get(validate_key(&key)?).await?;

    Ok(HttpResponse::Ok().json(setting))
}

/// Creates or replaces one setting
pub async fn put_setting(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateSettingRequest>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    let key = validate_key(&key)?;
    let request = request.into_inner();
    let value = SettingValue::from_request(request.value, request.setting_type.as_deref())?;

    let settings_service = SettingsService::new(pool.get_ref().clone());
    let setting = settings_service.put(key, value).await?;

    Ok(HttpResponse::Ok().json(setting))
}

/// Upserts a whole `key -> value` object in one transaction
pub async fn put_settings(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    request: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ApiError> {
    let mut settings = Vec::new();
    for (key, value) in request.into_inner() {
        let key = validate_key(&key)?.to_string();
        settings.push((key, SettingValue::infer(value)));
    }
    if settings.is_empty() {
        return Err(ApiError::invalid("No settings to update"));
    }

    let settings_service = SettingsService::new(pool.get_ref().clone());
    let updated = settings_service.put_many(settings).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Settings updated successfully",
        "updated": updated
    })))
}
