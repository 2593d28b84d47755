pub mod auth;
pub mod job;
pub mod pro;
pub mod review;
