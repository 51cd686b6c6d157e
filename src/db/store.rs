use async_trait::async_trait;

use crate::models::{ChildProfile, DailyTaskList, HeroPersona, TaskGoal};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt {what} record: {reason}")]
    CorruptRecord { what: &'static str, reason: String },
}

/// Per-user persistence of profile, today's task list and today's hero.
///
/// Every write replaces the previous value; there is no versioning.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Returns an empty profile for unknown users.
    async fn load_profile(&self, user_id: &str) -> Result<ChildProfile, StoreError>;

    async fn save_age(&self, user_id: &str, age: u8) -> Result<(), StoreError>;

    async fn save_goal(&self, user_id: &str, goal: TaskGoal) -> Result<(), StoreError>;

    async fn load_daily_tasks(&self, user_id: &str) -> Result<Option<DailyTaskList>, StoreError>;

    async fn save_daily_tasks(&self, user_id: &str, list: &DailyTaskList) -> Result<(), StoreError>;

    async fn load_hero(&self, user_id: &str) -> Result<Option<HeroPersona>, StoreError>;

    async fn save_hero(&self, user_id: &str, hero: &HeroPersona) -> Result<(), StoreError>;

    async fn delete_hero(&self, user_id: &str) -> Result<(), StoreError>;
}
