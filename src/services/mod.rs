pub mod age_appropriateness;
pub mod ai_flows;
pub mod auth;
pub mod clock;
pub mod quest_service;

// Re-export commonly used types
pub use ai_flows::AiFlowService;
pub use quest_service::QuestService;
