use actix_web::{get, put, web, HttpResponse};
use log::debug;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::quest_service::QuestService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgeRequest {
    pub age: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    pub count: i64,
}

/// Identity resolved from the bearer token
#[get("/me")]
pub async fn get_me(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(user)
}

#[get("")]
pub async fn get_profile(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
) -> Result<HttpResponse, AppError> {
    let profile = quests.profile(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[put("/age")]
pub async fn update_age(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
    payload: web::Json<UpdateAgeRequest>,
) -> Result<HttpResponse, AppError> {
    debug!("Updating age for user {}", user.user_id);
    let profile = quests.set_age(&user.user_id, payload.age).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Sets today's task goal and returns the refreshed board, which may now carry a hero.
#[put("/goal")]
pub async fn update_goal(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
    payload: web::Json<UpdateGoalRequest>,
) -> Result<HttpResponse, AppError> {
    debug!("Updating task goal for user {}", user.user_id);
    let board = quests.set_goal(&user.user_id, payload.count).await?;
    Ok(HttpResponse::Ok().json(board))
}
