use actix_web::{post, web, HttpResponse};
use log::{debug, error};

use crate::error::AppError;
use crate::models::{
    AuthenticatedUser, GenerateImageInput, GenerateImageOutput, MagicalPersonalityInput,
    PersonalizeInstructionsInput, SuggestTasksInput,
};
use crate::services::ai_flows::AiFlowService;

/// Image generation endpoint used by the hero reveal.
///
/// Keeps the `{imageUrl, error}` envelope even for failures so clients only
/// have one shape to handle.
#[post("/generate-image")]
pub async fn generate_image(
    user: AuthenticatedUser,
    flows: web::Data<AiFlowService>,
    body: web::Bytes,
) -> HttpResponse {
    let input: GenerateImageInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(e) => {
            error!("Unreadable generate-image request from user {}: {}", user.user_id, e);
            return HttpResponse::InternalServerError()
                .json(GenerateImageOutput::failed(format!("API Error: {}", e)));
        }
    };

    // Whitespace-only prompts are rejected; anything else reaches the model untouched
    let prompt = match input.prompt.as_deref() {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => return HttpResponse::BadRequest().json(GenerateImageOutput::failed("Prompt is required")),
    };

    debug!("Generating image for user {}", user.user_id);
    HttpResponse::Ok().json(flows.generate_image_from_prompt(prompt).await)
}

#[post("/suggest-tasks")]
pub async fn suggest_tasks(
    _user: AuthenticatedUser,
    flows: web::Data<AiFlowService>,
    payload: web::Json<SuggestTasksInput>,
) -> Result<HttpResponse, AppError> {
    if payload.age == 0 {
        return Err(AppError::Validation("Age must be a positive number".to_string()));
    }
    Ok(HttpResponse::Ok().json(flows.suggest_age_appropriate_tasks(&payload).await))
}

#[post("/personalize-instructions")]
pub async fn personalize_instructions(
    _user: AuthenticatedUser,
    flows: web::Data<AiFlowService>,
    payload: web::Json<PersonalizeInstructionsInput>,
) -> Result<HttpResponse, AppError> {
    if payload.task.trim().is_empty() {
        return Err(AppError::BadRequest("Task is required".to_string()));
    }
    Ok(HttpResponse::Ok().json(flows.personalize_task_instructions(&payload).await))
}

#[post("/magical-personality")]
pub async fn magical_personality(
    _user: AuthenticatedUser,
    flows: web::Data<AiFlowService>,
    payload: web::Json<MagicalPersonalityInput>,
) -> HttpResponse {
    HttpResponse::Ok().json(flows.generate_magical_personality(&payload).await)
}
