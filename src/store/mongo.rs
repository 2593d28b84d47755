use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::error::{TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT};
use mongodb::options::{Acknowledgment, ReadConcern, TransactionOptions, WriteConcern};
use mongodb::{Client, ClientSession, Database};

use crate::models::{Job, ProProfile, Review};
use crate::store::{JobReviewState, ProRating, ReviewStore, ReviewTxn, StoreError};

/// MongoDB-backed store. Each transaction handle wraps a `ClientSession` with
/// an open multi-document transaction; the driver aborts the transaction if
/// the session is dropped uncommitted.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, db: Database) -> Self {
        MongoStore { client, db }
    }
}

pub struct MongoTxn {
    session: ClientSession,
    db: Database,
}

fn map_error(e: mongodb::error::Error) -> StoreError {
    if e.contains_label(TRANSIENT_TRANSACTION_ERROR)
        || e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
    {
        StoreError::Conflict
    } else {
        StoreError::Unavailable(e.to_string())
    }
}

#[rocket::async_trait]
impl ReviewStore for MongoStore {
    type Txn = MongoTxn;

    async fn begin(&self) -> Result<MongoTxn, StoreError> {
        let mut session = self
            .client
            .start_session(None)
            .await
            .map_err(map_error)?;

        let options = TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
            .build();

        session
            .start_transaction(options)
            .await
            .map_err(map_error)?;

        Ok(MongoTxn {
            session,
            db: self.db.clone(),
        })
    }

    async fn commit(&self, mut txn: MongoTxn) -> Result<(), StoreError> {
        txn.session.commit_transaction().await.map_err(map_error)
    }
}

#[rocket::async_trait]
impl ReviewTxn for MongoTxn {
    async fn read_pro(&mut self, pro_id: &ObjectId) -> Result<Option<ProRating>, StoreError> {
        let profile = self
            .db
            .collection::<ProProfile>("pros")
            .find_one_with_session(doc! { "_id": *pro_id }, None, &mut self.session)
            .await
            .map_err(map_error)?;

        Ok(profile.map(|p| ProRating {
            rating: p.rating,
            reviews_count: p.reviews_count,
        }))
    }

    async fn read_job(&mut self, job_id: &ObjectId) -> Result<Option<JobReviewState>, StoreError> {
        let job = self
            .db
            .collection::<Job>("jobs")
            .find_one_with_session(doc! { "_id": *job_id }, None, &mut self.session)
            .await
            .map_err(map_error)?;

        Ok(job.map(|j| JobReviewState {
            has_review: j.has_review,
        }))
    }

    async fn insert_review(&mut self, review: &Review) -> Result<(), StoreError> {
        self.db
            .collection::<Review>("reviews")
            .insert_one_with_session(review, None, &mut self.session)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn write_pro(
        &mut self,
        pro_id: &ObjectId,
        rating: f64,
        reviews_count: i32,
    ) -> Result<(), StoreError> {
        self.db
            .collection::<ProProfile>("pros")
            .update_one_with_session(
                doc! { "_id": *pro_id },
                doc! {
                    "$set": {
                        "rating": rating,
                        "reviews_count": reviews_count,
                        "updated_at": DateTime::now()
                    }
                },
                None,
                &mut self.session,
            )
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn write_job(
        &mut self,
        job_id: &ObjectId,
        review_id: &ObjectId,
    ) -> Result<(), StoreError> {
        self.db
            .collection::<Job>("jobs")
            .update_one_with_session(
                doc! { "_id": *job_id },
                doc! {
                    "$set": {
                        "has_review": true,
                        "review_id": *review_id,
                        "updated_at": DateTime::now()
                    }
                },
                None,
                &mut self.session,
            )
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
