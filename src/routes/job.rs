use mongodb::bson::{doc, oid::ObjectId, DateTime};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{CreateJobDto, Job, JobResponse, JobStatus, ProProfile};
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Job")]
#[post("/job/create", data = "<dto>")]
pub async fn create_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    dto: Json<CreateJobDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let pro_id = ObjectId::parse_str(&dto.pro_id)
        .map_err(|_| ApiError::bad_request("Invalid pro ID"))?;

    let pro = db
        .collection::<ProProfile>("pros")
        .find_one(doc! { "_id": pro_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;

    if !pro.is_available {
        return Err(ApiError::bad_request("Professional is not available"));
    }

    let now = DateTime::now();
    let job = Job {
        id: None,
        client_id: auth.user_id,
        pro_id,
        category: dto.category.clone(),
        description: dto.description.clone(),
        status: JobStatus::Pending,
        has_review: false,
        review_id: None,
        created_at: now,
        updated_at: now,
    };

    let result = db
        .collection::<Job>("jobs")
        .insert_one(&job, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to create job: {}", e)))?;

    let job_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::internal_error("Invalid job ID"))?
        .to_hex();

    Ok(Json(ApiResponse::success_with_message(
        "Job created".to_string(),
        serde_json::json!({ "job_id": job_id }),
    )))
}

#[openapi(tag = "Job")]
#[post("/job/<job_id>/complete")]
pub async fn complete_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    job_id: String,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let object_id = ObjectId::parse_str(&job_id)
        .map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let job = db
        .collection::<Job>("jobs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    // Only the professional assigned to the job may mark it complete.
    let pro = db
        .collection::<ProProfile>("pros")
        .find_one(doc! { "_id": job.pro_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Professional not found"))?;

    if pro.user_id != auth.user_id {
        return Err(ApiError::unauthorized(
            "Only the assigned professional can complete this job",
        ));
    }

    match job.status {
        JobStatus::Pending | JobStatus::InProgress => {}
        JobStatus::Completed => return Err(ApiError::bad_request("Job is already completed")),
        JobStatus::Cancelled => return Err(ApiError::bad_request("Job was cancelled")),
    }

    db.collection::<Job>("jobs")
        .update_one(
            doc! { "_id": object_id },
            doc! { "$set": { "status": "completed", "updated_at": DateTime::now() } },
            None,
        )
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to update job: {}", e)))?;

    db.collection::<ProProfile>("pros")
        .update_one(
            doc! { "_id": job.pro_id },
            doc! {
                "$inc": { "jobs_completed": 1 },
                "$set": { "updated_at": DateTime::now() }
            },
            None,
        )
        .await
        .ok();

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Job marked as completed"
    }))))
}

#[openapi(tag = "Job")]
#[get("/job/<job_id>")]
pub async fn get_job(
    db: &State<DbConn>,
    auth: AuthGuard,
    job_id: String,
) -> Result<Json<ApiResponse<JobResponse>>, ApiError> {
    let object_id = ObjectId::parse_str(&job_id)
        .map_err(|_| ApiError::bad_request("Invalid job ID"))?;

    let job = db
        .collection::<Job>("jobs")
        .find_one(doc! { "_id": object_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if job.client_id != auth.user_id {
        let pro = db
            .collection::<ProProfile>("pros")
            .find_one(doc! { "_id": job.pro_id }, None)
            .await
            .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?;

        let is_assigned_pro = pro.map(|p| p.user_id == auth.user_id).unwrap_or(false);
        if !is_assigned_pro {
            return Err(ApiError::unauthorized("Not authorized to view this job"));
        }
    }

    Ok(Json(ApiResponse::success(job.into())))
}
