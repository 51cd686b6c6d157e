//! Request and response payloads of the generative flows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestTasksInput {
    pub age: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestTasksOutput {
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizeInstructionsInput {
    pub task: String,
    pub child_background: String,
    #[serde(default)]
    pub requirements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionStep {
    pub instruction: String,
    pub encouragement: String,
}

impl InstructionStep {
    pub fn new(instruction: impl Into<String>, encouragement: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            encouragement: encouragement.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizeInstructionsOutput {
    pub steps: Vec<InstructionStep>,
}

impl PersonalizeInstructionsOutput {
    pub fn single(instruction: impl Into<String>, encouragement: impl Into<String>) -> Self {
        Self {
            steps: vec![InstructionStep::new(instruction, encouragement)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicalPersonalityInput {
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicalPersonality {
    pub name: String,
    pub description: String,
    pub image_prompt: String,
}

impl MagicalPersonality {
    pub fn new(name: &str, description: &str, image_prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            image_prompt: image_prompt.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageInput {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Exactly one of `image_url` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageOutput {
    pub image_url: Option<String>,
    pub error: Option<String>,
}

impl GenerateImageOutput {
    pub fn image(url: String) -> Self {
        Self { image_url: Some(url), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { image_url: None, error: Some(error.into()) }
    }
}
