use log::{debug, error, info, warn};
use serde_json::Value;

use super::AiFlowService;
use crate::models::{MagicalPersonality, MagicalPersonalityInput};
use crate::prompts::generate_magical_personality_prompt;
use crate::utils::json_extraction::extract_json_object;

fn string_field<'a>(parsed: &'a Value, key: &str) -> Option<&'a str> {
    parsed.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Fills any missing or non-string field with a default.
fn complete_personality(parsed: &Value) -> MagicalPersonality {
    let name = string_field(parsed, "name");
    let description = string_field(parsed, "description");
    let image_prompt = string_field(parsed, "imagePrompt");

    if name.is_none() || description.is_none() || image_prompt.is_none() {
        warn!("Parsed JSON for magical personality missing required fields. Parsed data: {}", parsed);
    }

    MagicalPersonality::new(
        name.unwrap_or("Dream Weaver"),
        description.unwrap_or("Crafting wonders..."),
        image_prompt.unwrap_or("A colorful swirl of magic dust forming a friendly shape."),
    )
}

impl AiFlowService {
    pub async fn generate_magical_personality(&self, input: &MagicalPersonalityInput) -> MagicalPersonality {
        info!("Generating personality for tasks: {}", input.tasks.join(", "));

        let prompt = generate_magical_personality_prompt(&input.tasks);
        let response = match self.model.generate_content(&self.text_model, &prompt, &[]).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error in generate_magical_personality. Tasks: {}. Error: {}", input.tasks.join(", "), e);
                return MagicalPersonality::new(
                    "Unknown Entity",
                    "Error occurred.",
                    "A swirling void of cosmic dust, with a hint of a friendly face, in a mysterious but not scary style.",
                );
            }
        };

        if response.first_content().is_none() {
            error!("Magical personality generation returned no candidates or content");
            return MagicalPersonality::new(
                "Mysterious Helper",
                "Details forming...",
                "A gentle glowing orb of light, representing a story yet to be told.",
            );
        }

        let Some(raw_text) = response.first_text() else {
            error!("Magical personality generation returned no text in model response");
            return MagicalPersonality::new(
                "Silent Storyteller",
                "Words are awakening...",
                "A softly glowing book with pages turning, suggesting a magical personality about to be revealed.",
            );
        };

        debug!("Raw model response for magical personality: {}", raw_text);

        let Some(json_text) = extract_json_object(raw_text) else {
            error!("Could not extract valid JSON content for magical personality. Raw text was: {}", raw_text);
            return MagicalPersonality::new(
                "Enigmatic Friend",
                "Character is shy.",
                "A playful silhouette peeking from behind a sparkling curtain, hinting at a fun personality.",
            );
        };

        match serde_json::from_str::<Value>(&json_text) {
            Ok(parsed) => complete_personality(&parsed),
            Err(e) => {
                error!(
                    "Failed to parse extracted JSON for magical personality: {}. Extracted text was: {}",
                    e, json_text
                );
                MagicalPersonality::new(
                    "Whispering Spirit",
                    "Response unclear.",
                    "A faint shimmering outline of a friendly magical creature in a soft, dreamy style.",
                )
            }
        }
    }
}
