use mongodb::bson::{oid::ObjectId, DateTime};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub client_id: ObjectId,
    pub pro_id: ObjectId,
    pub category: String,
    pub description: Option<String>,
    pub status: JobStatus,

    // Set exactly once, by the review transaction.
    #[serde(default)]
    pub has_review: bool,
    pub review_id: Option<ObjectId>,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateJobDto {
    pub pro_id: String,
    pub category: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct JobResponse {
    pub id: String,
    pub client_id: String,
    pub pro_id: String,
    pub category: String,
    pub description: Option<String>,
    pub status: JobStatus,
    pub has_review: bool,
    pub review_id: Option<String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        JobResponse {
            id: job.id.map(|id| id.to_hex()).unwrap_or_default(),
            client_id: job.client_id.to_hex(),
            pro_id: job.pro_id.to_hex(),
            category: job.category,
            description: job.description,
            status: job.status,
            has_review: job.has_review,
            review_id: job.review_id.map(|id| id.to_hex()),
        }
    }
}
