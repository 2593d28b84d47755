//! Transactional access to the three records touched by a review submission.
//!
//! A `ReviewTxn` is one atomic attempt: reads first, then buffered writes,
//! then a commit that either applies everything or nothing. Dropping a handle
//! without committing aborts it. Conflicting concurrent writes to any record
//! the transaction touched surface as `StoreError::Conflict` and are safe to
//! retry from fresh reads.

pub mod mongo;

#[cfg(test)]
pub mod memory;

use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::Review;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write conflict detected at commit")]
    Conflict,
    #[error("transaction attempt timed out")]
    Timeout,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The aggregate pair owned by the review transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProRating {
    pub rating: f64,
    pub reviews_count: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct JobReviewState {
    pub has_review: bool,
}

#[rocket::async_trait]
pub trait ReviewTxn: Send {
    async fn read_pro(&mut self, pro_id: &ObjectId) -> Result<Option<ProRating>, StoreError>;

    async fn read_job(&mut self, job_id: &ObjectId) -> Result<Option<JobReviewState>, StoreError>;

    async fn insert_review(&mut self, review: &Review) -> Result<(), StoreError>;

    async fn write_pro(
        &mut self,
        pro_id: &ObjectId,
        rating: f64,
        reviews_count: i32,
    ) -> Result<(), StoreError>;

    async fn write_job(&mut self, job_id: &ObjectId, review_id: &ObjectId)
        -> Result<(), StoreError>;
}

#[rocket::async_trait]
pub trait ReviewStore: Send + Sync {
    type Txn: ReviewTxn;

    async fn begin(&self) -> Result<Self::Txn, StoreError>;

    async fn commit(&self, txn: Self::Txn) -> Result<(), StoreError>;
}
