use mongodb::bson::{doc, oid::ObjectId, DateTime};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{default_rating, CreateProProfileDto, ProProfile, ProProfileResponse};
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Pro")]
#[post("/pro/create", data = "<dto>")]
pub async fn create_pro_profile(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateProProfileDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.display_name.trim().is_empty() {
        return Err(ApiError::bad_request("Display name is required"));
    }
    if dto.categories.is_empty() {
        return Err(ApiError::bad_request("At least one category is required"));
    }

    let existing = db
        .collection::<ProProfile>("pros")
        .find_one(doc! { "user_id": auth.user_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

    if existing.is_some() {
        return Err(ApiError::bad_request("You already have a pro profile"));
    }

    let now = DateTime::now();
    let profile = ProProfile {
        id: None,
        user_id: auth.user_id,
        display_name: dto.display_name.clone(),
        categories: dto.categories.clone(),
        description: dto.description.clone(),
        hourly_rate: dto.hourly_rate,
        service_areas: dto.service_areas.clone(),
        is_available: true,
        rating: default_rating(),
        reviews_count: 0,
        jobs_completed: 0,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<ProProfile>("pros")
        .insert_one(&profile, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create profile: {}", e)))?;

    let pro_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Invalid pro ID"))?
        .to_hex();

    Ok(Json(ApiResponse::success_with_message(
        "Pro profile created".to_string(),
        serde_json::json!({ "pro_id": pro_id }),
    )))
}

#[openapi(tag = "Pro")]
#[get("/pro/<pro_id>")]
pub async fn get_pro_profile(
    db: &State<DbConn>,
    pro_id: String,
) -> Result<Json<ApiResponse<ProProfileResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&pro_id)
        .map_err(|_| ApiError::bad_request("Invalid pro ID"))?;

    let profile = db
        .collection::<ProProfile>("pros")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;

    Ok(Json(ApiResponse::success(profile.into())))
}
