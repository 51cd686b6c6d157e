use log::{debug, error, info, warn};
use serde_json::Value;

use super::AiFlowService;
use crate::models::{SuggestTasksInput, SuggestTasksOutput};
use crate::prompts::generate_suggest_tasks_prompt;
use crate::prompts::suggest_tasks::MAX_SUGGESTED_TASKS;
use crate::services::age_appropriateness::AgeRange;
use crate::utils::json_extraction::{extract_json_value, strip_json_fence};

/// Strings of a JSON array in the model output. Non-string items are dropped.
fn parse_task_list(text: &str) -> Vec<String> {
    let cleaned = strip_json_fence(text);
    let parsed = serde_json::from_str::<Value>(&cleaned).ok().or_else(|| {
        extract_json_value(text).and_then(|candidate| serde_json::from_str::<Value>(&candidate).ok())
    });

    match parsed {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(task) if !task.trim().is_empty() => Some(task),
                other => {
                    warn!("Skipping non-string task found in array: {}", other);
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!("Parsed output is not an array, using empty array: {}", other);
            Vec::new()
        }
        None => {
            error!("Failed to parse JSON array from model response. Raw text: {}", text);
            Vec::new()
        }
    }
}

impl AiFlowService {
    pub async fn suggest_age_appropriate_tasks(&self, input: &SuggestTasksInput) -> SuggestTasksOutput {
        info!("Suggesting tasks for age: {}", input.age);

        let prompt = generate_suggest_tasks_prompt(input.age);
        let response = match self.model.generate_content(&self.text_model, &prompt, &[]).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error in suggest_age_appropriate_tasks: {}", e);
                return SuggestTasksOutput::default();
            }
        };

        if response.first_content().is_none() {
            error!("Suggest age appropriate tasks returned no candidates or content");
            return SuggestTasksOutput::default();
        }

        let Some(text) = response.first_text() else {
            error!("Suggest age appropriate tasks returned no text");
            return SuggestTasksOutput::default();
        };

        debug!("Raw text response: {}", text);
        let suggested = parse_task_list(text);
        debug!("Parsed suggested tasks: {:?}", suggested);

        let age_range = AgeRange::exact(input.age);
        let mut refined = Vec::with_capacity(suggested.len());
        for task in suggested {
            let result = self.age_checker.check_age_appropriateness(&task, age_range).await;
            if result.is_appropriate {
                refined.push(task);
            } else {
                info!("Dropping suggestion '{}': {}", task, result.message.unwrap_or_default());
            }
        }

        refined.truncate(MAX_SUGGESTED_TASKS);
        SuggestTasksOutput { tasks: refined }
    }
}
