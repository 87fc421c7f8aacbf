pub mod db;
pub mod domain;
pub mod forms;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
pub mod token;

/// Role required for merchant-side operations (promotion management,
/// voucher verification and confirmation).
pub const MERCHANT_ROLE: &str = "merchant";

/// Role required to request voucher redemption tokens.
pub const CONSUMER_ROLE: &str = "consumer";
