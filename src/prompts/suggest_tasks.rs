/// Upper bound on the number of suggestions requested from (and returned by) the model.
pub const MAX_SUGGESTED_TASKS: usize = 5;

/// Prompt asking for a JSON array of age-appropriate tasks.
pub fn generate_suggest_tasks_prompt(age: u8) -> String {
    format!(r#"You are a helpful assistant that provides a list of age-appropriate tasks for children.

Provide a list of tasks appropriate for a child of age {age}. Do not include explanations, just the list of tasks.
Each task should be something a child can accomplish on their own or with minimal adult supervision.
Tasks should be engaging, educational, or helpful around the house.
Limit the list to {MAX_SUGGESTED_TASKS} tasks.

Output the response as a JSON array of strings. Respond ONLY with the JSON array, nothing else.
Example Output for a 7 year old:
["Make your bed", "Help set the dinner table", "Read a book for 20 minutes", "Draw a picture of your favorite animal", "Water the plants"]
"#)
}
