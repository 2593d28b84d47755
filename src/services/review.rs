//! Review submission: folds one rating into a professional's running average
//! inside a single atomic transaction.
//!
//! All reads happen before any write. The job's review flag is re-checked
//! inside the transaction, so two near-simultaneous submissions for the same
//! job cannot both count even if both passed the caller's pre-check. Commit
//! conflicts are retried from fresh reads a bounded number of times with
//! jittered exponential backoff; infrastructure failures are not retried.

use std::time::Duration;

use log::warn;
use mongodb::bson::{oid::ObjectId, DateTime};
use rand::Rng;
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::config::Config;
use crate::models::Review;
use crate::store::{ReviewStore, ReviewTxn, StoreError};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("professional not found")]
    ProNotFound,
    #[error("job not found")]
    JobNotFound,
    #[error("job has already been reviewed")]
    AlreadyReviewed,
    #[error("review transaction conflicted {attempts} times, giving up")]
    Exhausted { attempts: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub job_id: ObjectId,
    pub pro_id: ObjectId,
    pub client_id: Option<ObjectId>,
    pub client_name: String,
    pub rating: i32, // 1-5, validated by the caller
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config() -> Self {
        RetryPolicy {
            max_attempts: Config::review_txn_max_attempts().max(1),
            base_backoff: Duration::from_millis(Config::review_txn_backoff_ms()),
            attempt_timeout: Duration::from_millis(Config::review_txn_timeout_ms()),
        }
    }

    /// Doubles per attempt, with ±50% jitter so colliding submitters spread
    /// out instead of conflicting again in lockstep.
    fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_backoff
            .saturating_mul(1u32 << (attempt - 1).min(8));
        exp.mul_f64(rand::thread_rng().gen_range(0.5..1.5))
    }
}

/// Folds one submitted rating into the stored aggregate.
pub fn fold_rating(rating: f64, reviews_count: i32, submitted: i32) -> (f64, i32) {
    let new_count = reviews_count + 1;
    let new_rating = (rating * reviews_count as f64 + submitted as f64) / new_count as f64;
    (round2(new_rating), new_count)
}

// Round-half-away-from-zero to 2 decimal places, matching f64::round.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct ReviewService<S: ReviewStore> {
    store: S,
    retry: RetryPolicy,
}

impl<S: ReviewStore> ReviewService<S> {
    pub fn new(store: S, retry: RetryPolicy) -> Self {
        ReviewService { store, retry }
    }

    /// Submits a review and returns the id of the created review record.
    ///
    /// Preconditions (rating in 1..=5, job completed and owned by the caller)
    /// are the caller's responsibility; the review flag is still re-checked
    /// here inside the transaction.
    pub async fn submit_review(&self, input: &NewReview) -> Result<ObjectId, ReviewError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let outcome = match timeout(self.retry.attempt_timeout, self.try_submit(input)).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(StoreError::Timeout.into()),
            };

            match outcome {
                Err(ReviewError::Store(StoreError::Conflict))
                    if attempt < self.retry.max_attempts =>
                {
                    warn!(
                        "review submission for job {} conflicted (attempt {}/{}), retrying",
                        input.job_id.to_hex(),
                        attempt,
                        self.retry.max_attempts
                    );
                    sleep(self.retry.delay(attempt)).await;
                }
                Err(ReviewError::Store(StoreError::Conflict)) => {
                    return Err(ReviewError::Exhausted { attempts: attempt });
                }
                other => return other,
            }
        }
    }

    async fn try_submit(&self, input: &NewReview) -> Result<ObjectId, ReviewError> {
        let mut txn = self.store.begin().await?;

        // Reads complete before any write.
        let pro = txn
            .read_pro(&input.pro_id)
            .await?
            .ok_or(ReviewError::ProNotFound)?;
        let job = txn
            .read_job(&input.job_id)
            .await?
            .ok_or(ReviewError::JobNotFound)?;
        if job.has_review {
            return Err(ReviewError::AlreadyReviewed);
        }

        let (new_rating, new_count) = fold_rating(pro.rating, pro.reviews_count, input.rating);

        let review_id = ObjectId::new();
        let review = Review {
            id: Some(review_id),
            job_id: input.job_id,
            pro_id: input.pro_id,
            client_id: input.client_id,
            client_name: input.client_name.clone(),
            rating: input.rating,
            comment: input.comment.clone(),
            created_at: DateTime::now(),
        };

        txn.insert_review(&review).await?;
        txn.write_pro(&input.pro_id, new_rating, new_count).await?;
        txn.write_job(&input.job_id, &review_id).await?;

        self.store.commit(txn).await?;
        Ok(review_id)
    }
}
