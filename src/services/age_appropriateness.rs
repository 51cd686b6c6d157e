use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Terms that mark a task as needing more supervision than a young child should rely on.
static HAZARD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(knife|knives|stove|oven|lawn ?mower|ladder|bleach|chainsaw|lighter|power tools?|campfire)\b")
        .expect("Hazard regex pattern should be valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    pub fn exact(age: u8) -> Self {
        Self { min: age, max: age }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeAppropriatenessResult {
    pub is_appropriate: bool,
    pub message: Option<String>,
}

#[async_trait]
pub trait AgeAppropriatenessChecker: Send + Sync {
    async fn check_age_appropriateness(&self, task: &str, age_range: AgeRange) -> AgeAppropriatenessResult;
}

/// Rejects tasks mentioning a hazard when the youngest child in the range is below `min_age`.
#[derive(Debug, Clone)]
pub struct HazardKeywordScreen {
    min_age: u8,
}

impl HazardKeywordScreen {
    pub fn new(min_age: u8) -> Self {
        Self { min_age }
    }
}

#[async_trait]
impl AgeAppropriatenessChecker for HazardKeywordScreen {
    async fn check_age_appropriateness(&self, task: &str, age_range: AgeRange) -> AgeAppropriatenessResult {
        match HAZARD_REGEX.find(task) {
            Some(hazard) if age_range.min < self.min_age => AgeAppropriatenessResult {
                is_appropriate: false,
                message: Some(format!(
                    "Tasks involving '{}' need a grown-up for children under {}.",
                    hazard.as_str().to_lowercase(),
                    self.min_age
                )),
            },
            _ => AgeAppropriatenessResult {
                is_appropriate: true,
                message: Some("This task is age-appropriate.".to_string()),
            },
        }
    }
}
