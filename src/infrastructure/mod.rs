// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod credentials;
pub mod earth_engine;
pub mod expression_encoding;
#[cfg(test)]
pub mod fake_google_api;
