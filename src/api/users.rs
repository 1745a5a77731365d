use actix_web::{web, HttpResponse, ResponseError};
use crate::{database::UserRepository, models::UserProfile, services::user_service};
use crate::services::user_service::UpdateProfileRequest;

#[utoipa::path(
    get,
    path = "/api/user/{email}",
    tag = "Users",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 200, description = "User profile (no password or reset fields)", body = UserProfile),
        (status = 404, description = "User does not exist")
    )
)]
pub async fn get_user(repo: web::Data<UserRepository>, path: web::Path<String>) -> HttpResponse {
    let email = path.into_inner();
    log::info!("👤 GET /api/user/{}", email);

    match user_service::get_profile(&repo, &email).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => {
            log::warn!("❌ Profile lookup failed: {} - {}", email, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/user/{email}",
    tag = "Users",
    params(("email" = String, Path, description = "Account email")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "User information updated"),
        (status = 404, description = "User does not exist")
    )
)]
pub async fn update_user(
    repo: web::Data<UserRepository>,
    path: web::Path<String>,
    request: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    let email = path.into_inner();
    log::info!("✏️  PUT /api/user/{}", email);

    match user_service::update_profile(&repo, &email, &request).await {
        Ok(profile) => {
            log::info!("✅ Profile updated: {}", email);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "User information updated",
                "user": profile
            }))
        }
        Err(e) => {
            log::warn!("❌ Profile update failed: {} - {}", email, e);
            e.error_response()
        }
    }
}
