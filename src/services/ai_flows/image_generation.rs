use log::{error, info, warn};

use super::AiFlowService;
use crate::clients::ResponseModality;
use crate::models::GenerateImageOutput;
use crate::utils::text::truncate_chars;

/// Appended to a hero's image prompt before it is sent to the image model.
pub const IMAGE_STYLE_SUFFIX: &str = ", 3D illustration, vibrant, playful, kid-friendly, Pixar style";

pub const NO_IMAGE_MESSAGE: &str = "Image generation did not return a media URL or text. The model might have refused the prompt (e.g., due to safety filters) or encountered an issue.";

impl AiFlowService {
    /// Generates an image and returns it as a `data:` URI.
    pub async fn generate_image_from_prompt(&self, prompt: &str) -> GenerateImageOutput {
        info!("Generating image for prompt: \"{}\"", prompt);

        let modalities = [ResponseModality::Text, ResponseModality::Image];
        let response = match self.model.generate_content(&self.image_model, prompt, &modalities).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error in generate_image_from_prompt. Prompt was: {}. Error: {}", prompt, e);
                return GenerateImageOutput::failed(format!("Image generation process failed: {}", e));
            }
        };

        let mut image_url = None;
        let mut text_response = None;

        if let Some(content) = response.first_content() {
            for part in &content.parts {
                if let Some(text) = part.text.as_deref().filter(|t| !t.is_empty()) {
                    info!("Received text part: {}...", truncate_chars(text, 100));
                    text_response = Some(text);
                } else if let Some(inline) = part.inline_data.as_ref().filter(|_| image_url.is_none()) {
                    image_url = Some(format!("data:{};base64,{}", inline.mime_type, inline.data));
                    info!("Successfully generated image data URI");
                }
            }
        }

        match (image_url, text_response) {
            (Some(url), _) => GenerateImageOutput::image(url),
            (None, Some(text)) => {
                let message = format!(
                    "Image generation did not return a media URL. Text response received: {}...",
                    truncate_chars(text, 200)
                );
                warn!("{} Prompt was: {}", message, prompt);
                GenerateImageOutput::failed(message)
            }
            (None, None) => {
                warn!("{} Prompt was: {}", NO_IMAGE_MESSAGE, prompt);
                GenerateImageOutput::failed(NO_IMAGE_MESSAGE)
            }
        }
    }
}
