use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_TASK_GOAL: u8 = 1;
pub const MAX_TASK_GOAL: u8 = 10;

/// One step of a task checklist. `id` is the step's position when it was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistStep {
    pub id: u32,
    pub instruction: String,
    pub encouragement: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestTask {
    pub task: String,
    pub steps: Vec<ChecklistStep>,
}

impl QuestTask {
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|step| step.completed)
    }

    /// Percentage of completed steps, 0 for an empty checklist.
    pub fn checklist_progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let done = self.steps.iter().filter(|step| step.completed).count();
        done as f64 / self.steps.len() as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTaskList {
    pub date: NaiveDate,
    pub tasks: Vec<QuestTask>,
}

impl DailyTaskList {
    pub fn empty(date: NaiveDate) -> Self {
        Self { date, tasks: Vec::new() }
    }

    pub fn contains(&self, description: &str) -> bool {
        self.tasks.iter().any(|t| t.task == description)
    }

    pub fn completed_tasks(&self) -> impl Iterator<Item = &QuestTask> {
        self.tasks.iter().filter(|t| t.is_complete())
    }

    pub fn completed_count(&self) -> usize {
        self.completed_tasks().count()
    }

    /// Share of the goal reached, capped at 100.
    pub fn overall_progress(&self, goal: u8) -> f64 {
        if self.tasks.is_empty() || goal == 0 {
            return 0.0;
        }
        (self.completed_count() as f64 / goal as f64 * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroPersona {
    pub name: String,
    pub description: String,
    pub image_prompt: String,
    pub image_url: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGoal {
    pub count: u8,
    pub updated_at: DateTime<Utc>,
}

impl TaskGoal {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.updated_at >= ttl
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    pub age: Option<u8>,
    pub goal: Option<TaskGoal>,
}
