use log::{debug, error, info, warn};
use serde_json::Value;

use super::AiFlowService;
use crate::models::{InstructionStep, PersonalizeInstructionsInput, PersonalizeInstructionsOutput};
use crate::prompts::generate_task_instructions_prompt;
use crate::utils::json_extraction::extract_json_value;
use crate::utils::text::truncate_chars;

enum StepsShape {
    Valid(Vec<InstructionStep>),
    /// A `null` entry reached before any malformed one: the payload cannot be read at all.
    Unreadable,
    Malformed,
}

fn validated_steps(parsed: &Value) -> StepsShape {
    let Some(steps) = parsed.get("steps").and_then(Value::as_array) else {
        return StepsShape::Malformed;
    };

    let mut valid = Vec::with_capacity(steps.len());
    for step in steps {
        if step.is_null() {
            return StepsShape::Unreadable;
        }
        let instruction = step.get("instruction").and_then(Value::as_str);
        let encouragement = step.get("encouragement").and_then(Value::as_str);
        match (instruction, encouragement) {
            (Some(instruction), Some(encouragement)) => {
                valid.push(InstructionStep::new(instruction, encouragement))
            }
            _ => return StepsShape::Malformed,
        }
    }
    StepsShape::Valid(valid)
}

fn unreadable_instructions() -> PersonalizeInstructionsOutput {
    PersonalizeInstructionsOutput::single("Failed to process the instructions clearly.", "Give it another go!")
}

impl AiFlowService {
    pub async fn personalize_task_instructions(
        &self,
        input: &PersonalizeInstructionsInput,
    ) -> PersonalizeInstructionsOutput {
        info!("Personalizing instructions for task: \"{}\"", input.task);

        let prompt = generate_task_instructions_prompt(input);
        let response = match self.model.generate_content(&self.text_model, &prompt, &[]).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error in personalize_task_instructions. Task: {}. Error: {}", input.task, e);
                let message = e.to_string();
                return PersonalizeInstructionsOutput::single(
                    format!("Oops! An error occurred: {}...", truncate_chars(&message, 100)),
                    "Don't worry, we can try again!",
                );
            }
        };

        if response.first_content().is_none() {
            error!("Personalize task instructions returned no candidates or content");
            return PersonalizeInstructionsOutput::single(
                "Could not generate instructions at this time.",
                "Please try again!",
            );
        }

        let Some(raw_text) = response.first_text() else {
            error!("Personalize task instructions returned no text in model response");
            return PersonalizeInstructionsOutput::single(
                "The helper seems to be quiet, no instructions received.",
                "Let's try asking again!",
            );
        };

        debug!("Raw model response for task instructions: {}", raw_text);

        let Some(json_text) = extract_json_value(raw_text) else {
            error!("Could not extract valid JSON content for task instructions. Raw text was: {}", raw_text);
            return PersonalizeInstructionsOutput::single(
                "The instructions are a bit muddled right now.",
                "Maybe one more try?",
            );
        };

        let parsed = match serde_json::from_str::<Value>(&json_text) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(
                    "Failed to parse extracted JSON for task instructions: {}. Extracted text was: {}",
                    e, json_text
                );
                return unreadable_instructions();
            }
        };

        match validated_steps(&parsed) {
            StepsShape::Valid(steps) => {
                debug!("Successfully parsed {} instruction steps", steps.len());
                PersonalizeInstructionsOutput { steps }
            }
            StepsShape::Unreadable => {
                error!("Task instructions contain a null step. Extracted JSON was: {}", json_text);
                unreadable_instructions()
            }
            StepsShape::Malformed => {
                warn!(
                    "Parsed JSON for task instructions has incorrect structure. Extracted JSON was: {}",
                    json_text
                );
                PersonalizeInstructionsOutput::single(
                    "The instruction steps look a bit unusual.",
                    "Let's try to get clearer ones!",
                )
            }
        }
    }
}
