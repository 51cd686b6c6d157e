/// Prompt asking for a `{name, description, imagePrompt}` hero built from completed tasks.
pub fn generate_magical_personality_prompt(tasks: &[String]) -> String {
    let tasks_list = tasks
        .iter()
        .map(|task| format!("- {}", task))
        .collect::<Vec<_>>()
        .join("\n");

    format!(r#"You are a playful and imaginative assistant that creates magical characters for children based on the tasks they've completed today.

Analyze the list of tasks below and craft a unique magical personality that feels fun, inspiring, and rewarding for the child.

Each magical personality must include:
- A whimsical and memorable **name**
- A **short description** (max 5 words) describing the character's traits or powers
- A richly detailed **imagePrompt** that inspires a colorful, high-quality 3D illustration of the character

Tasks completed:
{tasks_list}

Make the magical personality reflect the nature of the tasks (e.g., cleaning, helping, reading), and include fantasy elements like sparkles, wings, magical gadgets, animal companions, or enchanted outfits.

The image prompt should be full of creativity and color, suitable for a children's magical universe.

Respond ONLY with a JSON object using the keys "name", "description", and "imagePrompt". Do not include any extra text.

Example Output:
{{
  "name": "Captain Sparkle",
  "description": "Kind, brave, full of energy",
  "imagePrompt": "A vibrant 3D illustration of a cheerful child superhero wearing a glittering cape, colorful boots, and a glowing heart emblem. The character is floating above a magical landscape with sparkles in the air. Bright, playful cartoon style."
}}
"#)
}
