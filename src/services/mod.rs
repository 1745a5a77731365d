pub mod auth_service;
pub mod prediction_service;
pub mod user_service;
