pub mod magical_personality;
pub mod suggest_tasks;
pub mod task_instructions;

pub use magical_personality::generate_magical_personality_prompt;
pub use suggest_tasks::generate_suggest_tasks_prompt;
pub use task_instructions::generate_task_instructions_prompt;
