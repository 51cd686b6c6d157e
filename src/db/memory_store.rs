use async_trait::async_trait;
use dashmap::DashMap;

use super::store::{ProgressStore, StoreError};
use crate::models::{ChildProfile, DailyTaskList, HeroPersona, TaskGoal};

#[derive(Debug, Clone, Default)]
struct UserProgress {
    profile: ChildProfile,
    tasks: Option<DailyTaskList>,
    hero: Option<HeroPersona>,
}

/// Process-local store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    users: DashMap<String, UserProgress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F>(&self, user_id: &str, apply: F)
    where
        F: FnOnce(&mut UserProgress),
    {
        let mut entry = self.users.entry(user_id.to_string()).or_default();
        apply(entry.value_mut());
    }

    fn read<T, F>(&self, user_id: &str, project: F) -> Option<T>
    where
        F: FnOnce(&UserProgress) -> Option<T>,
    {
        self.users.get(user_id).and_then(|progress| project(progress.value()))
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn load_profile(&self, user_id: &str) -> Result<ChildProfile, StoreError> {
        Ok(self.read(user_id, |p| Some(p.profile.clone())).unwrap_or_default())
    }

    async fn save_age(&self, user_id: &str, age: u8) -> Result<(), StoreError> {
        self.update(user_id, |p| p.profile.age = Some(age));
        Ok(())
    }

    async fn save_goal(&self, user_id: &str, goal: TaskGoal) -> Result<(), StoreError> {
        self.update(user_id, |p| p.profile.goal = Some(goal));
        Ok(())
    }

    async fn load_daily_tasks(&self, user_id: &str) -> Result<Option<DailyTaskList>, StoreError> {
        Ok(self.read(user_id, |p| p.tasks.clone()))
    }

    async fn save_daily_tasks(&self, user_id: &str, list: &DailyTaskList) -> Result<(), StoreError> {
        self.update(user_id, |p| p.tasks = Some(list.clone()));
        Ok(())
    }

    async fn load_hero(&self, user_id: &str) -> Result<Option<HeroPersona>, StoreError> {
        Ok(self.read(user_id, |p| p.hero.clone()))
    }

    async fn save_hero(&self, user_id: &str, hero: &HeroPersona) -> Result<(), StoreError> {
        self.update(user_id, |p| p.hero = Some(hero.clone()));
        Ok(())
    }

    async fn delete_hero(&self, user_id: &str) -> Result<(), StoreError> {
        if let Some(mut progress) = self.users.get_mut(user_id) {
            progress.hero = None;
        }
        Ok(())
    }
}
