pub mod jwt;
pub mod review;

pub use jwt::JwtService;
