use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::FindOptions;
use rocket::futures::TryStreamExt;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{Job, JobStatus, Review, SubmitReviewDto};
use crate::services::review::{NewReview, ReviewError, ReviewService};
use crate::store::mongo::MongoStore;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Review")]
#[post("/review/submit", data = "<dto>")]
pub async fn submit_review(
    db: &State<DbConn>,
    reviews: &State<ReviewService<MongoStore>>,
    auth: AuthGuard,
    dto: Json<SubmitReviewDto>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    if dto.rating < 1 || dto.rating > 5 {
        return Err(ApiError::bad_request("Rating must be between 1 and 5"));
    }

    let job_id = ObjectId::parse_str(&dto.job_id)
        .map_err(|_| ApiError::bad_request("Invalid job ID"))?;
    let pro_id = ObjectId::parse_str(&dto.pro_id)
        .map_err(|_| ApiError::bad_request("Invalid pro ID"))?;

    // Caller-side preconditions. The transaction re-checks the review flag;
    // these exist to give a precise error without burning a transaction.
    let job = db
        .collection::<Job>("jobs")
        .find_one(doc! { "_id": job_id }, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if job.client_id != auth.user_id {
        return Err(ApiError::unauthorized(
            "Only the job's client can leave a review",
        ));
    }
    if job.pro_id != pro_id {
        return Err(ApiError::bad_request(
            "Job does not belong to this professional",
        ));
    }
    if job.status != JobStatus::Completed {
        return Err(ApiError::bad_request(
            "Job must be completed before it can be reviewed",
        ));
    }
    if job.has_review {
        return Err(ApiError::conflict("Job has already been reviewed"));
    }

    let input = NewReview {
        job_id,
        pro_id,
        client_id: Some(auth.user_id),
        client_name: auth.name.clone(),
        rating: dto.rating,
        comment: dto.comment.clone(),
    };

    let review_id = reviews.submit_review(&input).await.map_err(|e| match e {
        ReviewError::ProNotFound => ApiError::not_found("Professional not found"),
        ReviewError::JobNotFound => ApiError::not_found("Job not found"),
        ReviewError::AlreadyReviewed => ApiError::conflict("Job has already been reviewed"),
        ReviewError::Exhausted { .. } => {
            ApiError::conflict("Review could not be recorded due to concurrent updates, please retry")
        }
        ReviewError::Store(err) => ApiError::internal_error(format!("Store error: {}", err)),
    })?;

    Ok(Json(ApiResponse::success_with_message(
        "Review submitted successfully".to_string(),
        serde_json::json!({
            "review_id": review_id.to_hex()
        }),
    )))
}

#[openapi(tag = "Review")]
#[get("/review/pro/<pro_id>?<page>&<limit>")]
pub async fn get_pro_reviews(
    db: &State<DbConn>,
    pro_id: String,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    let skip = (page - 1) * limit;

    let object_id = ObjectId::parse_str(&pro_id)
        .map_err(|_| ApiError::bad_request("Invalid pro ID"))?;

    let filter = doc! { "pro_id": object_id };

    let find_options = FindOptions::builder()
        .skip(skip as u64)
        .limit(limit)
        .sort(doc! { "created_at": -1 })
        .build();

    let reviews: Vec<Review> = db
        .collection::<Review>("reviews")
        .find(filter.clone(), find_options)
        .await
        .map_err(|e| ApiError::internal_error(format!("Database error: {}", e)))?
        .try_collect()
        .await
        .map_err(|e| ApiError::internal_error(format!("Cursor error: {}", e)))?;

    let total = db
        .collection::<Review>("reviews")
        .count_documents(filter, None)
        .await
        .map_err(|e| ApiError::internal_error(format!("Count error: {}", e)))?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "reviews": reviews,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total as f64 / limit as f64).ceil() as i64,
        }
    }))))
}
