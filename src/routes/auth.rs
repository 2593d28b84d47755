use mongodb::bson::oid::ObjectId;
use rocket::serde::json::Json;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;

use crate::config::Config;
use crate::services::JwtService;
use crate::utils::{ApiError, ApiResponse};

#[derive(Debug, serde::Deserialize, JsonSchema)]
pub struct DevTokenDto {
    pub name: String,
    pub user_id: Option<String>,
}

/// Issues a signed access token without any identity verification. Only
/// served under the development profile; production deployments get their
/// tokens from the identity provider in front of this API.
#[openapi(tag = "Auth")]
#[post("/auth/dev-token", data = "<dto>")]
pub async fn issue_dev_token(
    dto: Json<DevTokenDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if !Config::is_development() {
        return Err(ApiError::not_found("Resource not found"));
    }
    if dto.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    let user_id = match &dto.user_id {
        Some(raw) => ObjectId::parse_str(raw)
            .map_err(|_| ApiError::bad_request("Invalid user ID"))?,
        None => ObjectId::new(),
    };

    let access_token = JwtService::generate_access_token(&user_id, &dto.name)
        .map_err(|e| ApiError::internal_error(format!("Failed to sign token: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "user_id": user_id.to_hex(),
        "access_token": access_token
    }))))
}
