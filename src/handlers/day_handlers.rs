use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::quest_service::QuestService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsRequest {
    #[serde(default)]
    pub age: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub task: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStepRequest {
    pub task: String,
    pub step_id: u32,
}

#[post("/suggestions")]
pub async fn get_suggestions(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
    payload: Option<web::Json<SuggestionsRequest>>,
) -> Result<HttpResponse, AppError> {
    let age = payload.and_then(|p| p.age);
    let suggestions = quests.suggest(&user.user_id, age).await?;
    Ok(HttpResponse::Ok().json(suggestions))
}

#[get("")]
pub async fn get_day(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(quests.board(&user.user_id).await?))
}

#[delete("")]
pub async fn clear_day(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(quests.clear_tasks(&user.user_id).await?))
}

#[post("/tasks")]
pub async fn add_task(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
    payload: web::Json<TaskRequest>,
) -> Result<HttpResponse, AppError> {
    let board = quests.add_task(&user.user_id, &payload.task).await?;
    Ok(HttpResponse::Created().json(board))
}

#[post("/tasks/remove")]
pub async fn remove_task(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
    payload: web::Json<TaskRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(quests.remove_task(&user.user_id, &payload.task).await?))
}

#[post("/steps/toggle")]
pub async fn toggle_step(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
    payload: web::Json<ToggleStepRequest>,
) -> Result<HttpResponse, AppError> {
    let board = quests
        .toggle_step(&user.user_id, &payload.task, payload.step_id)
        .await?;
    Ok(HttpResponse::Ok().json(board))
}

#[post("/hero/image")]
pub async fn reveal_hero_image(
    user: AuthenticatedUser,
    quests: web::Data<QuestService>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(quests.reveal_hero_image(&user.user_id).await?))
}

#[cfg(test)]
mod tests {
    use crate::config::settings::QuestConfig;
    use crate::db::MemoryProgressStore;
    use crate::middleware::firebase_auth::testing::StaticTokenVerifier;
    use crate::middleware::FirebaseAuthentication;
    use crate::routes::configure_routes;
    use crate::services::ai_flows::testing::{flows, ScriptedModel};
    use crate::services::clock::SystemClock;
    use crate::services::quest_service::QuestService;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body_json, TestRequest};
    use actix_web::{web, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    const STEPS: &str = r#"{"steps": [{"instruction": "Pull up the blanket", "encouragement": "Cozy!"}]}"#;
    const HERO: &str = r#"{"name": "Captain Tidy", "description": "Neat and kind", "imagePrompt": "A hero with a broom"}"#;

    macro_rules! quest_app {
        ($model:expr) => {{
            let flows = Arc::new(flows($model));
            let quests = QuestService::new(
                Arc::new(MemoryProgressStore::new()),
                flows.clone(),
                Arc::new(SystemClock),
                &QuestConfig {
                    day_utc_offset_minutes: 0,
                    default_task_goal: 3,
                    task_goal_ttl_hours: 24,
                    age_screen_min_age: 12,
                },
            )
            .unwrap();
            init_service(
                App::new()
                    .app_data(web::Data::from(flows))
                    .app_data(web::Data::new(quests))
                    .service(
                        web::scope("/api")
                            .wrap(FirebaseAuthentication::new(Arc::new(StaticTokenVerifier)))
                            .configure(configure_routes),
                    ),
            )
            .await
        }};
    }

    fn as_kid(req: TestRequest) -> TestRequest {
        req.insert_header((AUTHORIZATION, "Bearer kid-7"))
    }

    #[actix_web::test]
    async fn test_day_flow_end_to_end() {
        let app = quest_app!(Arc::new(ScriptedModel::new().reply_text(STEPS).reply_text(HERO)));

        let resp = call_service(
            &app,
            as_kid(TestRequest::put().uri("/api/profile/age").set_json(json!({ "age": 8 }))).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = call_service(
            &app,
            as_kid(TestRequest::put().uri("/api/profile/goal").set_json(json!({ "count": 1 }))).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = call_service(
            &app,
            as_kid(TestRequest::post().uri("/api/day/tasks").set_json(json!({ "task": "Make your bed" }))).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let board: Value = read_body_json(resp).await;
        assert_eq!(board["tasks"][0]["steps"][0]["instruction"], "Pull up the blanket");
        assert_eq!(board["profile"]["goal"], 1);

        let resp = call_service(
            &app,
            as_kid(TestRequest::post().uri("/api/day/steps/toggle").set_json(json!({ "task": "Make your bed", "stepId": 0 }))).to_request(),
        )
        .await;
        let board: Value = read_body_json(resp).await;
        assert_eq!(board["goalReached"], true);
        assert_eq!(board["overallProgress"], 100.0);
        assert_eq!(board["hero"]["name"], "Captain Tidy");
        assert_eq!(board["hero"]["imageUrl"], Value::Null);

        let resp = call_service(
            &app,
            as_kid(TestRequest::delete().uri("/api/day")).to_request(),
        )
        .await;
        let board: Value = read_body_json(resp).await;
        assert_eq!(board["tasks"], json!([]));
        assert_eq!(board["hero"], Value::Null);
    }

    #[actix_web::test]
    async fn test_errors_are_json() {
        let app = quest_app!(Arc::new(ScriptedModel::new()));

        let resp = call_service(
            &app,
            as_kid(TestRequest::post().uri("/api/day/tasks").set_json(json!({ "task": "Feed the cat" }))).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["message"], "Bad request: Please set your age first.");
        assert_eq!(body["error_type"], "bad_request");

        let resp = call_service(
            &app,
            as_kid(TestRequest::post().uri("/api/day/hero/image")).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = call_service(
            &app,
            as_kid(TestRequest::put().uri("/api/profile/goal").set_json(json!({ "count": 42 }))).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_suggestions_and_identity() {
        let app = quest_app!(Arc::new(ScriptedModel::new().reply_text("[]")));

        let resp = call_service(
            &app,
            as_kid(TestRequest::post().uri("/api/suggestions").set_json(json!({ "age": 5 }))).to_request(),
        )
        .await;
        let body: Value = read_body_json(resp).await;
        assert_eq!(body, json!({ "tasks": [], "message": "No suggestions found for this age." }));

        let resp = call_service(
            &app,
            as_kid(TestRequest::get().uri("/api/me")).to_request(),
        )
        .await;
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["userId"], "7");
        assert_eq!(body["signInProvider"], "google.com");
    }
}
