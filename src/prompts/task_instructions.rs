use crate::models::PersonalizeInstructionsInput;

/// Prompt asking for a `{"steps": [...]}` breakdown of a single task.
pub fn generate_task_instructions_prompt(input: &PersonalizeInstructionsInput) -> String {
    let requirements_text = input
        .requirements
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| format!("Requirements: {}", r))
        .unwrap_or_default();

    format!(r#"You are a friendly expert in writing simple, personalized step-by-step instructions for children.

Your job is to take the task below and break it down into **short, easy-to-understand steps**. Use **simple words** and **brief sentences** that even young kids can follow. Each step should feel friendly and clear, like a fun helper is guiding them.

Every step must also include a short and cheerful **encouragement** message that keeps the child feeling motivated and proud.

Keep the tone playful, kind, and positive. Avoid long explanations. Be helpful and fun!

Task: {task}
Child's Background: {background}
{requirements_text}

Output should be in this exact JSON format:
Respond ONLY with a JSON object containing a single key "steps", which is an array of objects with keys "instruction" and "encouragement".

Example Output:
{{
  "steps": [
    {{
      "instruction": "First, wash your hands!",
      "encouragement": "Nice start! Clean and ready!"
    }},
    {{
      "instruction": "Grab two slices of bread.",
      "encouragement": "Awesome! You got it!"
    }},
    {{
      "instruction": "Spread jam on one slice.",
      "encouragement": "Yummy! Looking great!"
    }},
    {{
      "instruction": "Put the other slice on top.",
      "encouragement": "Almost done!"
    }},
    {{
      "instruction": "Yay! You made a sandwich!",
      "encouragement": "You're amazing! Enjoy it!"
    }}
  ]
}}
"#,
        task = input.task,
        background = input.child_background,
    )
}
