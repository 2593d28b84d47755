use mongodb::bson::{oid::ObjectId, DateTime};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One client's rating of one completed job. Append-only: never updated or
/// deleted once written.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub job_id: ObjectId,
    pub pro_id: ObjectId,
    pub client_id: Option<ObjectId>,
    pub client_name: String,
    pub rating: i32, // 1-5
    pub comment: Option<String>,
    pub created_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubmitReviewDto {
    pub job_id: String,
    pub pro_id: String,
    pub rating: i32,
    pub comment: Option<String>,
}
