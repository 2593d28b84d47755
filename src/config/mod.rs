use rocket::figment::{Figment, providers::{Env, Format, Toml}};
use rocket::Config as RocketConfig;
use std::env;

pub struct Config;

impl Config {
    fn figment() -> Figment {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

        Figment::from(RocketConfig::default())
            .merge(Toml::file("Rocket.toml").nested())
            .select(&profile)
            .merge(Env::prefixed("ROCKET_").split("_"))
    }

    pub fn jwt_secret() -> String {
        Self::figment()
            .extract_inner("jwt_secret")
            .unwrap_or_else(|_| "default-secret".to_string())
    }

    pub fn jwt_expiry() -> i64 {
        Self::figment()
            .extract_inner("jwt_expiry")
            .unwrap_or(900)
    }

    pub fn mongodb_uri() -> String {
        Self::figment()
            .extract_inner("mongodb_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017/promarket".to_string())
    }

    /// Bounded attempts for the review transaction before the conflict is
    /// surfaced to the caller.
    pub fn review_txn_max_attempts() -> u32 {
        Self::figment()
            .extract_inner("review_txn_max_attempts")
            .unwrap_or(3)
    }

    pub fn review_txn_backoff_ms() -> u64 {
        Self::figment()
            .extract_inner("review_txn_backoff_ms")
            .unwrap_or(50)
    }

    pub fn review_txn_timeout_ms() -> u64 {
        Self::figment()
            .extract_inner("review_txn_timeout_ms")
            .unwrap_or(5000)
    }

    pub fn is_development() -> bool {
        let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());
        profile == "development"
    }
}
