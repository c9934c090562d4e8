//! End-to-end service scenarios against a real Postgres.
//! Each test returns early unless `TEST_DATABASE_URL` is set.

use std::time::{SystemTime, UNIX_EPOCH};

use auth_services::types::Claims;
use serde_json::json;
use sqlx::PgPool;

use web_handlers::check_in_service::CheckInService;
use web_handlers::check_in_types::{CheckInFilter, CreateCheckInRequest};
use web_handlers::error::ApiError;
use web_handlers::hotel_service::HotelService;
use web_handlers::hotel_types::{AllotmentQuery, CreateAllotmentRequest, HotelRequest};
use web_handlers::post_service::PostService;
use web_handlers::post_types::{CreatePostRequest, PostFilter, Viewer};
use web_handlers::room_pair_service::RoomPairService;
use web_handlers::room_pair_types::RoomPairRequest;
use web_handlers::settings_service::SettingsService;
use web_handlers::settings_types::SettingValue;
use web_handlers::traveler_service::TravelerService;
use web_handlers::traveler_types::CreateTravelerRequest;
use web_handlers::vehicle_service::VehicleService;
use web_handlers::vehicle_types::VehicleRequest;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = postgres::database::create_connection_pool(&url, 2)
        .await
        .unwrap();
    postgres::database::apply_schema(&pool).await.unwrap();
    Some(pool)
}

fn unique() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

fn claims(email: &str, is_admin: bool) -> Claims {
    Claims {
        id: 1,
        email: email.to_string(),
        name: "Scenario".to_string(),
        is_admin,
        iat: 0,
        exp: 0,
    }
}

async fn new_vehicle(pool: &PgPool, tag: u128) -> i64 {
    let request: VehicleRequest =
        serde_json::from_value(json!({"name": format!("Bus {}", tag)})).unwrap();
    VehicleService::new(pool.clone())
        .create(&request)
        .await
        .unwrap()
        .id
}

async fn new_traveler(pool: &PgPool, tag: u128, n: u32) -> (i64, String) {
    let email = format!("traveler{}-{}@example.com", n, tag);
    let request: CreateTravelerRequest = serde_json::from_value(json!({
        "tirthId": format!("T{}-{}", n, tag),
        "firstName": "Scenario",
        "lastName": format!("Traveler {}", n),
        "email": email,
        "password": "secret123"
    }))
    .unwrap();
    let traveler = TravelerService::new(pool.clone())
        .create(&request)
        .await
        .unwrap();
    (traveler.id, email)
}

#[tokio::test]
async fn test_duplicate_check_in_then_checkout() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let vehicle_id = new_vehicle(&pool, tag).await;
    let (_, email) = new_traveler(&pool, tag, 1).await;
    let service = CheckInService::new(pool.clone());

    let request: CreateCheckInRequest =
        serde_json::from_value(json!({"vehicleId": vehicle_id, "travelerEmail": email})).unwrap();
    let check_in = request.parse().unwrap();

    let id = service.create(&check_in).await.unwrap();
    assert!(matches!(
        service.create(&check_in).await,
        Err(ApiError::DuplicateCheckIn)
    ));

    // Someone else may not check this traveler out
    assert!(
        service
            .checkout(id, &claims("intruder@example.com", false))
            .await
            .is_err()
    );
    service.checkout(id, &claims(&email, false)).await.unwrap();

    // After checkout a fresh check-in is allowed again
    service.create(&check_in).await.unwrap();
    assert_eq!(service.clear_vehicle(vehicle_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_check_in_email_case_does_not_open_second_row() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let vehicle_id = new_vehicle(&pool, tag).await;
    let (traveler_id, email) = new_traveler(&pool, tag, 1).await;
    let service = CheckInService::new(pool.clone());
    let traveler = claims(&email, false);

    let check_in = |address: String| {
        let request: CreateCheckInRequest =
            serde_json::from_value(json!({"vehicleId": vehicle_id, "travelerEmail": address}))
                .unwrap();
        request.parse().unwrap().scoped_to(&traveler).unwrap()
    };

    service.create(&check_in(email.clone())).await.unwrap();
    assert!(matches!(
        service.create(&check_in(email.to_uppercase())).await,
        Err(ApiError::DuplicateCheckIn)
    ));

    // A legacy row stored in upper case still blocks a new one
    service.clear_vehicle(vehicle_id).await.unwrap();
    sqlx::query(
        "INSERT INTO check_ins (vehicle_id, traveler_email, traveler_id, active) VALUES ($1, $2, $3, TRUE)",
    )
    .bind(vehicle_id)
    .bind(email.to_uppercase())
    .bind(traveler_id)
    .execute(&pool)
    .await
    .unwrap();
    assert!(service.create(&check_in(email.clone())).await.is_err());

    let active = service
        .list(&CheckInFilter {
            vehicle_id: Some(vehicle_id),
            active: Some(true),
            traveler_email: Some(email.clone()),
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(service.clear_vehicle(vehicle_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_traveler_cannot_claim_another_traveler_id() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let vehicle_id = new_vehicle(&pool, tag).await;
    let (alice_id, alice) = new_traveler(&pool, tag, 1).await;
    let (bob_id, _) = new_traveler(&pool, tag, 2).await;
    let service = CheckInService::new(pool.clone());

    let request: CreateCheckInRequest = serde_json::from_value(json!({
        "vehicleId": vehicle_id,
        "travelerEmail": alice,
        "travelerId": bob_id
    }))
    .unwrap();
    let check_in = request.parse().unwrap().scoped_to(&claims(&alice, false)).unwrap();
    service.create(&check_in).await.unwrap();

    let rows = service
        .list(&CheckInFilter {
            vehicle_id: Some(vehicle_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].traveler_id, Some(alice_id));
    assert_eq!(rows[0].traveler_name, "Scenario Traveler 1");

    service.clear_vehicle(vehicle_id).await.unwrap();
}

#[tokio::test]
async fn test_hotel_delete_cascades_to_allotments() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let (traveler_id, _) = new_traveler(&pool, tag, 1).await;
    let service = HotelService::new(pool.clone());

    let hotel: HotelRequest =
        serde_json::from_value(json!({"name": format!("Hotel {}", tag)})).unwrap();
    let hotel_id = service.create(&hotel.parse().unwrap()).await.unwrap();

    for date in ["2025-12-15", "2025-12-16"] {
        let allotment: CreateAllotmentRequest = serde_json::from_value(json!({
            "hotelId": hotel_id,
            "travelerId": traveler_id,
            "date": date,
            "room": 101
        }))
        .unwrap();
        service
            .create_allotment(&allotment.parse().unwrap())
            .await
            .unwrap();
    }

    assert_eq!(service.delete(hotel_id).await.unwrap(), 2);

    let query = AllotmentQuery {
        hotel_id: Some(hotel_id.to_string()),
        date: None,
        traveler_id: None,
    };
    let remaining = service
        .list_allotments(&query.parse().unwrap())
        .await
        .unwrap();
    assert!(remaining.is_empty());
    assert!(matches!(
        service.get(hotel_id).await,
        Err(ApiError::NotFound("Hotel"))
    ));
}

#[tokio::test]
async fn test_room_pair_update_replaces_members() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let (first, _) = new_traveler(&pool, tag, 1).await;
    let (second, _) = new_traveler(&pool, tag, 2).await;
    let (third, _) = new_traveler(&pool, tag, 3).await;
    let service = RoomPairService::new(pool.clone());

    let pair_no = (tag % 1_000_000_000) as i64 + 1;
    let request: RoomPairRequest = serde_json::from_value(json!({
        "pairNo": pair_no,
        "travelerIds": [first, second]
    }))
    .unwrap();
    let pair_id = service.create(&request.parse_new().unwrap()).await.unwrap();

    let pair = service.get(pair_id).await.unwrap();
    let mut ids = pair.traveler_ids.clone();
    ids.sort();
    assert_eq!(ids, vec![first, second]);

    // Reusing the number is rejected
    assert!(matches!(
        service.create(&request.parse_new().unwrap()).await,
        Err(ApiError::DuplicatePairNumber(_))
    ));

    let patch: RoomPairRequest =
        serde_json::from_value(json!({"travelerIds": [third]})).unwrap();
    let updated = service
        .update(pair_id, &patch.parse_patch().unwrap())
        .await
        .unwrap();
    assert_eq!(updated.traveler_ids, vec![third]);

    service.delete(pair_id).await.unwrap();
    assert!(matches!(
        service.get(pair_id).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_settings_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let service = SettingsService::new(pool.clone());
    let key = format!("scenario_{}", tag);

    let value = SettingValue::from_request(json!("42"), Some("number")).unwrap();
    service.put(&key, value).await.unwrap();
    let stored = service.get(&key).await.unwrap();
    assert_eq!(stored.value, json!(42));

    let flag_key = format!("{}_flag", key);
    let updated = service
        .put_many(vec![
            (key.clone(), SettingValue::infer(json!({"theme": "saffron"}))),
            (flag_key.clone(), SettingValue::infer(json!(true))),
        ])
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let all = service.get_all().await.unwrap();
    assert_eq!(all[&key], json!({"theme": "saffron"}));
    assert_eq!(all[&flag_key], json!(true));
}

#[tokio::test]
async fn test_undecodable_setting_does_not_break_listing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let service = SettingsService::new(pool.clone());
    let legacy = format!("legacy_{}", tag);

    sqlx::query(
        "INSERT INTO settings (setting_key, setting_value, setting_type) VALUES ($1, '{not json', 'json')",
    )
    .bind(&legacy)
    .execute(&pool)
    .await
    .unwrap();

    let all = service.get_all().await;
    let single = service.get(&legacy).await;
    sqlx::query("DELETE FROM settings WHERE setting_key = $1")
        .bind(&legacy)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(all.unwrap()[&legacy], json!("{not json"));
    assert!(matches!(single, Err(ApiError::CorruptSetting { .. })));
}

#[tokio::test]
async fn test_post_visibility_and_ownership() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let tag = unique();
    let author = format!("author-{}@example.com", tag);
    let service = PostService::new(pool.clone());
    let section = format!("section-{}", tag);

    let request: CreatePostRequest = serde_json::from_value(json!({
        "place": "Janakpur",
        "section": section,
        "media": ["https://cdn/1.jpg", "https://cdn/2.jpg"],
        "tags": [format!("tag-{}", tag)]
    }))
    .unwrap();
    let created = service
        .create(&claims(&author, false), &request.parse().unwrap())
        .await
        .unwrap();
    assert!(!created.post.approved);
    assert_eq!(created.media, vec!["https://cdn/1.jpg", "https://cdn/2.jpg"]);

    let filter = PostFilter {
        section: Some(section.clone()),
        ..Default::default()
    };
    assert!(service.list(&Viewer::Anonymous, &filter).await.unwrap().is_empty());
    assert_eq!(
        service
            .list(&Viewer::Member(author.clone()), &filter)
            .await
            .unwrap()
            .len(),
        1
    );

    service.set_approved(created.post.id, true).await.unwrap();
    assert_eq!(service.list(&Viewer::Anonymous, &filter).await.unwrap().len(), 1);
    assert!(service.list_tags().await.unwrap().contains(&format!("tag-{}", tag)));

    assert!(
        service
            .delete(created.post.id, &claims("someone@example.com", false))
            .await
            .is_err()
    );
    service
        .delete(created.post.id, &claims(&author, false))
        .await
        .unwrap();
}
