use actix_web::{HttpResponse, Result, web};

use crate::admin_handlers::*;
use crate::check_in_handlers::*;
use crate::hotel_handlers::*;
use crate::itinerary_handlers::*;
use crate::post_handlers::*;
use crate::room_pair_handlers::*;
use crate::settings_handlers::*;
use crate::traveler_handlers::*;
use crate::vehicle_handlers::*;

/// Liveness probe
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Yatra admin API is running",
        "timestamp": chrono::Utc::now()
    })))
}

/// Registers every `/api` resource. Numeric ids are constrained with `\d+`
/// so literal segments such as `/allotments` or `/me` never match an id.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::scope("/admin")
                .route("/login", web::post().to(admin_login))
                .route("/profile", web::get().to(get_admin_profile))
                .route("/profile", web::put().to(update_admin_profile))
                .route("/tags", web::get().to(list_tags))
                .route("/tags", web::post().to(add_tag)),
        )
        .service(
            web::scope("/travelers")
                .route("/login", web::post().to(traveler_login))
                .route("/me", web::get().to(get_me))
                .route("", web::get().to(list_travelers))
                .route("", web::post().to(create_traveler))
                .route(r"/{id:\d+}", web::get().to(get_traveler))
                .route(r"/{id:\d+}", web::put().to(update_traveler)),
        )
        .service(
            web::scope("/vehicles")
                .route("", web::get().to(list_vehicles))
                .route("", web::post().to(create_vehicle))
                .route(r"/{id:\d+}", web::get().to(get_vehicle))
                .route(r"/{id:\d+}", web::put().to(update_vehicle))
                .route(r"/{id:\d+}", web::delete().to(delete_vehicle))
                .route(r"/{id:\d+}/travelers", web::get().to(get_vehicle_travelers)),
        )
        .service(
            web::scope("/itinerary")
                .route("", web::get().to(list_itinerary))
                .route("", web::post().to(create_itinerary_day))
                .route(r"/{id:\d+}", web::get().to(get_itinerary_day))
                .route(r"/{id:\d+}", web::put().to(update_itinerary_day))
                .route(r"/{id:\d+}", web::delete().to(delete_itinerary_day)),
        )
        .service(
            web::scope("/posts")
                .route("", web::get().to(list_posts))
                .route("", web::post().to(create_post))
                .route(r"/{id:\d+}", web::get().to(get_post))
                .route(r"/{id:\d+}", web::delete().to(delete_post))
                .route(r"/{id:\d+}/approve", web::put().to(approve_post)),
        )
        .service(
            web::scope("/hotels")
                .route("/allotments", web::get().to(list_allotments))
                .route("/allotments", web::post().to(create_allotment))
                .route("/allotments", web::delete().to(delete_allotments_for_night))
                .route(r"/allotments/{id:\d+}", web::put().to(update_allotment))
                .route(r"/allotments/{id:\d+}", web::delete().to(delete_allotment))
                .route("", web::get().to(list_hotels))
                .route("", web::post().to(create_hotel))
                .route(r"/{id:\d+}", web::get().to(get_hotel))
                .route(r"/{id:\d+}", web::put().to(update_hotel))
                .route(r"/{id:\d+}", web::delete().to(delete_hotel)),
        )
        .service(
            web::scope("/room-pairs")
                .route("", web::get().to(list_room_pairs))
                .route("", web::post().to(create_room_pair))
                .route(r"/{id:\d+}", web::get().to(get_room_pair))
                .route(r"/{id:\d+}", web::put().to(update_room_pair))
                .route(r"/{id:\d+}", web::delete().to(delete_room_pair)),
        )
        .service(
            web::scope("/check-ins")
                .route("", web::get().to(list_check_ins))
                .route("", web::post().to(create_check_in))
                .route(r"/vehicle/{vehicle_id:\d+}", web::get().to(get_vehicle_roster))
                .route(
                    r"/vehicle/{vehicle_id:\d+}",
                    web::delete().to(clear_vehicle_check_ins),
                )
                .route(r"/{id:\d+}/checkout", web::post().to(checkout)),
        )
        .service(
            web::scope("/settings")
                .route("", web::get().to(get_settings))
                .route("", web::put().to(put_settings))
                .route("/{key}", web::get().to(get_setting))
                .route("/{key}", web::put().to(put_setting)),
        );
}
