//! In-memory store used by the service tests. Commits use version stamps per
//! record: a transaction remembers the version of everything it read and the
//! commit is rejected with `Conflict` if any of those versions moved, which
//! mirrors the optimistic behavior of the MongoDB backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mongodb::bson::oid::ObjectId;

use crate::models::Review;
use crate::store::{JobReviewState, ProRating, ReviewStore, ReviewTxn, StoreError};

#[derive(Debug, Clone, Copy)]
struct JobRecord {
    has_review: bool,
    review_id: Option<ObjectId>,
}

#[derive(Default)]
struct Inner {
    pros: HashMap<ObjectId, (ProRating, u64)>,
    jobs: HashMap<ObjectId, (JobRecord, u64)>,
    reviews: Vec<Review>,
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail_job_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            inner: Arc::new(Mutex::new(Inner::default())),
            fail_job_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn insert_pro(&self, pro_id: ObjectId, rating: f64, reviews_count: i32) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .pros
            .insert(pro_id, (ProRating { rating, reviews_count }, 0));
    }

    pub fn insert_job(&self, job_id: ObjectId) {
        let mut inner = self.inner.lock().unwrap();
        inner.jobs.insert(
            job_id,
            (
                JobRecord {
                    has_review: false,
                    review_id: None,
                },
                0,
            ),
        );
    }

    pub fn mark_reviewed(&self, job_id: ObjectId, review_id: ObjectId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some((record, version)) = inner.jobs.get_mut(&job_id) {
            record.has_review = true;
            record.review_id = Some(review_id);
            *version += 1;
        }
    }

    /// Makes every subsequent job write fail as an infrastructure error.
    pub fn fail_job_writes(&self) {
        self.fail_job_writes.store(true, Ordering::SeqCst);
    }

    pub fn pro(&self, pro_id: &ObjectId) -> Option<ProRating> {
        self.inner.lock().unwrap().pros.get(pro_id).map(|(p, _)| *p)
    }

    pub fn job_review_id(&self, job_id: &ObjectId) -> Option<ObjectId> {
        self.inner
            .lock()
            .unwrap()
            .jobs
            .get(job_id)
            .and_then(|(j, _)| j.review_id)
    }

    pub fn review_count(&self) -> usize {
        self.inner.lock().unwrap().reviews.len()
    }
}

pub struct MemoryTxn {
    inner: Arc<Mutex<Inner>>,
    fail_job_writes: Arc<AtomicBool>,
    observed_pros: Vec<(ObjectId, u64)>,
    observed_jobs: Vec<(ObjectId, u64)>,
    staged_reviews: Vec<Review>,
    staged_pro: Option<(ObjectId, ProRating)>,
    staged_job: Option<(ObjectId, ObjectId)>,
}

#[rocket::async_trait]
impl ReviewStore for MemoryStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn, StoreError> {
        Ok(MemoryTxn {
            inner: Arc::clone(&self.inner),
            fail_job_writes: Arc::clone(&self.fail_job_writes),
            observed_pros: Vec::new(),
            observed_jobs: Vec::new(),
            staged_reviews: Vec::new(),
            staged_pro: None,
            staged_job: None,
        })
    }

    async fn commit(&self, txn: MemoryTxn) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        for (id, seen) in &txn.observed_pros {
            if inner.pros.get(id).map(|(_, v)| *v) != Some(*seen) {
                return Err(StoreError::Conflict);
            }
        }
        for (id, seen) in &txn.observed_jobs {
            if inner.jobs.get(id).map(|(_, v)| *v) != Some(*seen) {
                return Err(StoreError::Conflict);
            }
        }

        inner.reviews.extend(txn.staged_reviews);
        if let Some((pro_id, rating)) = txn.staged_pro {
            if let Some((record, version)) = inner.pros.get_mut(&pro_id) {
                *record = rating;
                *version += 1;
            }
        }
        if let Some((job_id, review_id)) = txn.staged_job {
            if let Some((record, version)) = inner.jobs.get_mut(&job_id) {
                record.has_review = true;
                record.review_id = Some(review_id);
                *version += 1;
            }
        }

        Ok(())
    }
}

#[rocket::async_trait]
impl ReviewTxn for MemoryTxn {
    async fn read_pro(&mut self, pro_id: &ObjectId) -> Result<Option<ProRating>, StoreError> {
        let inner = self.inner.lock().unwrap();
        match inner.pros.get(pro_id) {
            Some((record, version)) => {
                self.observed_pros.push((*pro_id, *version));
                Ok(Some(*record))
            }
            None => Ok(None),
        }
    }

    async fn read_job(&mut self, job_id: &ObjectId) -> Result<Option<JobReviewState>, StoreError> {
        let inner = self.inner.lock().unwrap();
        match inner.jobs.get(job_id) {
            Some((record, version)) => {
                self.observed_jobs.push((*job_id, *version));
                Ok(Some(JobReviewState {
                    has_review: record.has_review,
                }))
            }
            None => Ok(None),
        }
    }

    async fn insert_review(&mut self, review: &Review) -> Result<(), StoreError> {
        self.staged_reviews.push(review.clone());
        Ok(())
    }

    async fn write_pro(
        &mut self,
        pro_id: &ObjectId,
        rating: f64,
        reviews_count: i32,
    ) -> Result<(), StoreError> {
        self.staged_pro = Some((
            *pro_id,
            ProRating {
                rating,
                reviews_count,
            },
        ));
        Ok(())
    }

    async fn write_job(
        &mut self,
        job_id: &ObjectId,
        review_id: &ObjectId,
    ) -> Result<(), StoreError> {
        if self.fail_job_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected job write failure".into()));
        }
        self.staged_job = Some((*job_id, *review_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_rejects_stale_reads() {
        let store = MemoryStore::new();
        let pro_id = ObjectId::new();
        store.insert_pro(pro_id, 5.0, 0);

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.read_pro(&pro_id).await.unwrap().unwrap();
        second.read_pro(&pro_id).await.unwrap().unwrap();

        first.write_pro(&pro_id, 4.0, 1).await.unwrap();
        second.write_pro(&pro_id, 2.0, 1).await.unwrap();

        store.commit(first).await.unwrap();
        assert!(matches!(
            store.commit(second).await,
            Err(StoreError::Conflict)
        ));

        // The losing transaction left no trace.
        assert_eq!(
            store.pro(&pro_id).unwrap(),
            ProRating {
                rating: 4.0,
                reviews_count: 1
            }
        );
    }

    #[tokio::test]
    async fn dropping_a_txn_discards_staged_writes() {
        let store = MemoryStore::new();
        let pro_id = ObjectId::new();
        store.insert_pro(pro_id, 4.5, 2);

        let mut txn = store.begin().await.unwrap();
        txn.read_pro(&pro_id).await.unwrap().unwrap();
        txn.write_pro(&pro_id, 1.0, 3).await.unwrap();
        drop(txn);

        assert_eq!(
            store.pro(&pro_id).unwrap(),
            ProRating {
                rating: 4.5,
                reviews_count: 2
            }
        );
    }
}
