use crate::{
    database::UserRepository,
    models::UserProfile,
    utils::AppError,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// Get user profile (password and reset fields stripped)
pub async fn get_profile(repo: &UserRepository, email: &str) -> Result<UserProfile, AppError> {
    repo.find_by_email(email)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))
}

// Update name fields; empty values are ignored
pub async fn update_profile(
    repo: &UserRepository,
    email: &str,
    request: &UpdateProfileRequest,
) -> Result<UserProfile, AppError> {
    let first_name = request.first_name.as_deref().filter(|v| !v.trim().is_empty());
    let last_name = request.last_name.as_deref().filter(|v| !v.trim().is_empty());

    repo.update(email, |user| {
        if let Some(first_name) = first_name {
            user.first_name = first_name.to_string();
        }
        if let Some(last_name) = last_name {
            user.last_name = last_name.to_string();
        }
        Ok(())
    })
    .await?;

    get_profile(repo, email).await
}
