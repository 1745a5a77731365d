use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Battery Lab Service API",
        version = "1.0.0",
        description = "Backend for the battery-materials demo UI.\n\n**Features:**\n- File-backed user accounts (register, verify, login, password reset, profile)\n- Early-life cycle-life prediction for battery cycling data\n- Health monitoring and metrics"
    ),
    paths(
        // Auth endpoints
        crate::api::auth::login,
        crate::api::auth::register,
        crate::api::auth::forgot_password,
        crate::api::auth::reset_password,
        crate::api::auth::verify_email,
        crate::api::auth::verify_token,

        // Users
        crate::api::users::get_user,
        crate::api::users::update_user,

        // Prediction
        crate::api::prediction::early_life_prediction,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::ForgotPasswordRequest,
            crate::services::auth_service::ResetPasswordRequest,
            crate::services::auth_service::VerifyEmailRequest,
            crate::services::auth_service::LoginResponse,
            crate::services::auth_service::MessageResponse,
            crate::services::auth_service::VerifyTokenResponse,

            // Users
            crate::models::UserProfile,
            crate::models::UserSummary,
            crate::services::user_service::UpdateProfileRequest,

            // Prediction
            crate::models::PredictionRequest,
            crate::models::PredictionFeatures,
            crate::models::PredictionResult,
            crate::models::PredictionSummary,
            crate::models::PredictionResponse,

            // Health
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, email verification, login and password reset."),
        (name = "Users", description = "Profile read and update, keyed by email."),
        (name = "Prediction", description = "Heuristic early-life cycle-life estimates for battery cycling rows."),
        (name = "Health", description = "Health check and metrics endpoints."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/login"))
                        .build()
                ),
            );
        }
    }
}
