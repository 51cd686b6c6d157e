//! Prompt-driven flows backed by a hosted generative model.
//!
//! Every flow is infallible from the caller's point of view: upstream errors,
//! empty candidates and malformed JSON are logged and replaced by a fixed
//! fallback payload.

mod image_generation;
mod magical_personality;
mod suggest_tasks;
mod task_instructions;

use std::sync::Arc;

use crate::clients::GenerativeModel;
use crate::config::settings::GeminiConfig;
use crate::services::age_appropriateness::AgeAppropriatenessChecker;

pub use image_generation::{NO_IMAGE_MESSAGE, IMAGE_STYLE_SUFFIX};

pub struct AiFlowService {
    model: Arc<dyn GenerativeModel>,
    text_model: String,
    image_model: String,
    age_checker: Arc<dyn AgeAppropriatenessChecker>,
}

impl AiFlowService {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        config: &GeminiConfig,
        age_checker: Arc<dyn AgeAppropriatenessChecker>,
    ) -> Self {
        Self {
            model,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            age_checker,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::clients::{GoogleGenerateResponse, ResponseModality};
    use crate::error::AppError;
    use crate::services::age_appropriateness::HazardKeywordScreen;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub model: String,
        pub prompt: String,
        pub modalities: Vec<ResponseModality>,
    }

    /// Replays queued responses in order and records every call.
    #[derive(Default)]
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Result<GoogleGenerateResponse, AppError>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, reply: Result<GoogleGenerateResponse, AppError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        pub fn reply_text(self, text: &str) -> Self {
            self.reply(Ok(GoogleGenerateResponse::text_response(text)))
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate_content(
            &self,
            model: &str,
            prompt: &str,
            modalities: &[ResponseModality],
        ) -> Result<GoogleGenerateResponse, AppError> {
            self.calls.lock().unwrap().push(RecordedCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
                modalities: modalities.to_vec(),
            });
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AppError::External("no scripted reply left".to_string())))
        }
    }

    pub fn gemini_config() -> GeminiConfig {
        GeminiConfig {
            api_keys: vec!["test-key".to_string()],
            base_url: "http://localhost".to_string(),
            text_model: "text-model".to_string(),
            image_model: "image-model".to_string(),
        }
    }

    pub fn flows(model: Arc<ScriptedModel>) -> AiFlowService {
        AiFlowService::new(model, &gemini_config(), Arc::new(HazardKeywordScreen::new(12)))
    }
}
