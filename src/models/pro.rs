use mongodb::bson::{oid::ObjectId, DateTime};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Starting point for a professional with no reviews yet. The first submitted
/// review replaces it entirely (5.0 * 0 contributes nothing to the fold).
pub fn default_rating() -> f64 {
    5.0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub display_name: String,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub hourly_rate: Option<f64>,
    pub service_areas: Vec<String>,
    pub is_available: bool,

    // Aggregate maintained by the review transaction. These two fields are
    // only ever written together.
    #[serde(default = "default_rating")]
    pub rating: f64,
    #[serde(default)]
    pub reviews_count: i32,

    pub jobs_completed: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProProfileDto {
    pub display_name: String,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub hourly_rate: Option<f64>,
    pub service_areas: Vec<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ProProfileResponse {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub hourly_rate: Option<f64>,
    pub service_areas: Vec<String>,
    pub is_available: bool,
    pub rating: f64,
    pub reviews_count: i32,
    pub jobs_completed: i32,
}

impl From<ProProfile> for ProProfileResponse {
    fn from(profile: ProProfile) -> Self {
        ProProfileResponse {
            id: profile.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: profile.user_id.to_hex(),
            display_name: profile.display_name,
            categories: profile.categories,
            description: profile.description,
            hourly_rate: profile.hourly_rate,
            service_areas: profile.service_areas,
            is_available: profile.is_available,
            rating: profile.rating,
            reviews_count: profile.reviews_count,
            jobs_completed: profile.jobs_completed,
        }
    }
}
