pub mod job;
pub mod pro;
pub mod review;

pub use job::*;
pub use pro::*;
pub use review::*;
