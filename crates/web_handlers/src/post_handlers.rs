use actix_web::{HttpResponse, Result, web};
use serde_json::json;
use sqlx::PgPool;

use auth_services::middleware::{AdminUser, AuthenticatedUser, OptionalUser};

use crate::error::ApiError;
use crate::post_service::PostService;
use crate::post_types::*;

/// Lists the posts visible to the caller
pub async fn list_posts(
    pool: web::Data<PgPool>,
    user: OptionalUser,
    query: web::Query<PostQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.parse()?;
    let viewer = Viewer::from_claims(user.0.as_ref());

    let post_service = PostService::new(pool.get_ref().clone());
    let posts = post_service.list(&viewer, &filter).await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Gets one post if the caller may see it
pub async fn get_post(
    pool: web::Data<PgPool>,
    user: OptionalUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let viewer = Viewer::from_claims(user.0.as_ref());

    let post_service = PostService::new(pool.get_ref().clone());
    let post = post_service.get(path.into_inner(), &viewer).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Submits a post as the caller
pub async fn create_post(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    request: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, ApiError> {
    let post = request.parse()?;

    let post_service = PostService::new(pool.get_ref().clone());
    let created = post_service.create(&user.0, &post).await?;

    Ok(HttpResponse::Created().json(created))
}

/// Approves or hides a post
pub async fn approve_post(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<ApproveRequest>,
) -> Result<HttpResponse, ApiError> {
    let post_service = PostService::new(pool.get_ref().clone());
    post_service
        .set_approved(path.into_inner(), request.approved)
        .await?;

    let message = if request.approved {
        "Post approved"
    } else {
        "Post unapproved"
    };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "approved": request.approved
    })))
}

/// Deletes one of the caller's posts, or any post for admins
pub async fn delete_post(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let post_service = PostService::new(pool.get_ref().clone());
    post_service.delete(path.into_inner(), &user.0).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Post deleted successfully"
    })))
}
