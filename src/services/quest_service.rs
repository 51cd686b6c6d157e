use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::config::settings::QuestConfig;
use crate::db::ProgressStore;
use crate::error::{AppError, AppResult};
use crate::models::{
    ChecklistStep, ChildProfile, DailyTaskList, HeroPersona, MagicalPersonalityInput,
    PersonalizeInstructionsInput, QuestTask, SuggestTasksInput, TaskGoal, MAX_TASK_GOAL, MIN_TASK_GOAL,
};
use crate::services::ai_flows::{AiFlowService, IMAGE_STYLE_SUFFIX};
use crate::services::clock::{calendar_day, Clock};

pub const NO_SUGGESTIONS_MESSAGE: &str = "No suggestions found for this age.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub age: Option<u8>,
    /// Goal in effect today, the default when none is set or it has expired.
    pub goal: u8,
    pub goal_needs_refresh: bool,
    pub goal_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub task: String,
    pub steps: Vec<ChecklistStep>,
    pub progress: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBoard {
    pub date: NaiveDate,
    pub tasks: Vec<TaskView>,
    pub completed_count: usize,
    pub overall_progress: f64,
    pub goal_reached: bool,
    pub profile: ProfileView,
    pub hero: Option<HeroPersona>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsView {
    pub tasks: Vec<String>,
    pub message: Option<String>,
}

/// Day-scoped task board for one child: profile, today's checklist tasks and the hero reward.
pub struct QuestService {
    store: Arc<dyn ProgressStore>,
    flows: Arc<AiFlowService>,
    clock: Arc<dyn Clock>,
    day_offset: FixedOffset,
    default_goal: u8,
    goal_ttl: Duration,
}

fn validate_age(age: i64) -> AppResult<u8> {
    u8::try_from(age)
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| AppError::Validation("Please enter a valid age.".to_string()))
}

impl QuestService {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        flows: Arc<AiFlowService>,
        clock: Arc<dyn Clock>,
        config: &QuestConfig,
    ) -> AppResult<Self> {
        let day_offset = FixedOffset::east_opt(config.day_utc_offset_minutes * 60).ok_or_else(|| {
            AppError::Configuration(format!("Invalid day offset: {} minutes", config.day_utc_offset_minutes))
        })?;
        let goal_ttl = Duration::try_hours(config.task_goal_ttl_hours).ok_or_else(|| {
            AppError::Configuration(format!("Invalid task goal TTL: {} hours", config.task_goal_ttl_hours))
        })?;

        Ok(Self {
            store,
            flows,
            clock,
            day_offset,
            default_goal: config.default_task_goal,
            goal_ttl,
        })
    }

    pub fn today(&self) -> NaiveDate {
        calendar_day(self.clock.now(), self.day_offset)
    }

    fn profile_view(&self, profile: &ChildProfile) -> ProfileView {
        let now = self.clock.now();
        let active_goal = profile.goal.filter(|goal| !goal.is_expired(now, self.goal_ttl));

        ProfileView {
            age: profile.age,
            goal: active_goal.map(|g| g.count).unwrap_or(self.default_goal),
            goal_needs_refresh: active_goal.is_none(),
            goal_updated_at: profile.goal.map(|g| g.updated_at),
        }
    }

    pub async fn profile(&self, user_id: &str) -> AppResult<ProfileView> {
        let profile = self.store.load_profile(user_id).await?;
        Ok(self.profile_view(&profile))
    }

    pub async fn set_age(&self, user_id: &str, age: i64) -> AppResult<ProfileView> {
        let age = validate_age(age)?;
        self.store.save_age(user_id, age).await?;
        info!("Saved age {} for user {}", age, user_id);
        self.profile(user_id).await
    }

    pub async fn set_goal(&self, user_id: &str, count: i64) -> AppResult<DayBoard> {
        let count = u8::try_from(count)
            .ok()
            .filter(|c| (MIN_TASK_GOAL..=MAX_TASK_GOAL).contains(c))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Task goal must be between {} and {}",
                    MIN_TASK_GOAL, MAX_TASK_GOAL
                ))
            })?;

        let goal = TaskGoal { count, updated_at: self.clock.now() };
        self.store.save_goal(user_id, goal).await?;
        info!("Saved daily task goal {} for user {}", count, user_id);

        let list = self.load_today_tasks(user_id).await?;
        self.refresh_board(user_id, list).await
    }

    /// Today's task list. A list from another day is replaced by an empty one and the hero is dropped.
    async fn load_today_tasks(&self, user_id: &str) -> AppResult<DailyTaskList> {
        let today = self.today();
        match self.store.load_daily_tasks(user_id).await? {
            Some(list) if list.date == today => Ok(list),
            stale => {
                if let Some(old) = stale {
                    debug!("Resetting task list from {} for user {}", old.date, user_id);
                }
                let fresh = DailyTaskList::empty(today);
                self.store.save_daily_tasks(user_id, &fresh).await?;
                self.store.delete_hero(user_id).await?;
                Ok(fresh)
            }
        }
    }

    /// Today's hero, if one was unlocked today. Older heroes are removed.
    async fn load_today_hero(&self, user_id: &str) -> AppResult<Option<HeroPersona>> {
        match self.store.load_hero(user_id).await? {
            Some(hero) if hero.date == self.today() => Ok(Some(hero)),
            Some(hero) => {
                debug!("Dropping hero from {} for user {}", hero.date, user_id);
                self.store.delete_hero(user_id).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Unlocks today's hero when the goal is reached, then renders the board.
    async fn refresh_board(&self, user_id: &str, list: DailyTaskList) -> AppResult<DayBoard> {
        let profile = self.profile_view(&self.store.load_profile(user_id).await?);
        let mut hero = self.load_today_hero(user_id).await?;

        let completed = list.completed_count();
        if hero.is_none() && !list.tasks.is_empty() && profile.goal > 0 && completed >= profile.goal as usize {
            let tasks: Vec<String> = list.completed_tasks().map(|t| t.task.clone()).collect();
            info!("User {} completed {} of {} tasks, unlocking hero", user_id, completed, profile.goal);

            let personality = self
                .flows
                .generate_magical_personality(&MagicalPersonalityInput { tasks })
                .await;
            let unlocked = HeroPersona {
                name: personality.name,
                description: personality.description,
                image_prompt: personality.image_prompt,
                image_url: None,
                date: list.date,
            };
            self.store.save_hero(user_id, &unlocked).await?;
            hero = Some(unlocked);
        }

        Ok(self.render(list, profile, hero))
    }

    fn render(&self, list: DailyTaskList, profile: ProfileView, hero: Option<HeroPersona>) -> DayBoard {
        let completed_count = list.completed_count();
        let overall_progress = list.overall_progress(profile.goal);

        DayBoard {
            date: list.date,
            goal_reached: !list.tasks.is_empty() && completed_count >= profile.goal as usize,
            completed_count,
            overall_progress,
            tasks: list
                .tasks
                .into_iter()
                .map(|task| TaskView {
                    progress: task.checklist_progress(),
                    completed: task.is_complete(),
                    task: task.task,
                    steps: task.steps,
                })
                .collect(),
            profile,
            hero,
        }
    }

    pub async fn board(&self, user_id: &str) -> AppResult<DayBoard> {
        let list = self.load_today_tasks(user_id).await?;
        let profile = self.profile_view(&self.store.load_profile(user_id).await?);
        let hero = self.load_today_hero(user_id).await?;
        Ok(self.render(list, profile, hero))
    }

    pub async fn suggest(&self, user_id: &str, age: Option<i64>) -> AppResult<SuggestionsView> {
        let age = match age {
            Some(age) => validate_age(age)?,
            None => self.store.load_profile(user_id).await?.age.ok_or_else(|| {
                AppError::BadRequest("Please set your age first using the welcome popup or settings.".to_string())
            })?,
        };

        let output = self.flows.suggest_age_appropriate_tasks(&SuggestTasksInput { age }).await;
        let message = output.tasks.is_empty().then(|| NO_SUGGESTIONS_MESSAGE.to_string());
        Ok(SuggestionsView { tasks: output.tasks, message })
    }

    pub async fn add_task(&self, user_id: &str, description: &str) -> AppResult<DayBoard> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::BadRequest(
                "Please describe the task details or select a suggestion.".to_string(),
            ));
        }

        let age = self
            .store
            .load_profile(user_id)
            .await?
            .age
            .ok_or_else(|| AppError::BadRequest("Please set your age first.".to_string()))?;

        let list = self.load_today_tasks(user_id).await?;
        if list.contains(description) {
            return Err(AppError::Conflict("This task is already in your list!".to_string()));
        }

        let output = self
            .flows
            .personalize_task_instructions(&PersonalizeInstructionsInput {
                task: description.to_string(),
                child_background: format!("Child is {} years old.", age),
                requirements: Some(String::new()),
            })
            .await;

        if output.steps.is_empty() {
            warn!("No steps generated for task '{}'", description);
            return Err(AppError::External(
                "Failed to generate steps. The task might be too complex or the helper needs more details. Please try rephrasing or a different task.".to_string(),
            ));
        }

        let steps = output
            .steps
            .into_iter()
            .zip(0u32..)
            .map(|(step, id)| ChecklistStep {
                id,
                instruction: step.instruction,
                encouragement: step.encouragement,
                completed: false,
            })
            .collect();

        // Re-read so a list reset or edit made while the model was answering is not lost
        let mut list = self.load_today_tasks(user_id).await?;
        if list.contains(description) {
            return Err(AppError::Conflict("This task is already in your list!".to_string()));
        }
        list.tasks.push(QuestTask { task: description.to_string(), steps });
        self.store.save_daily_tasks(user_id, &list).await?;
        info!("Added task '{}' for user {}", description, user_id);

        self.refresh_board(user_id, list).await
    }

    pub async fn toggle_step(&self, user_id: &str, task: &str, step_id: u32) -> AppResult<DayBoard> {
        let mut list = self.load_today_tasks(user_id).await?;

        let quest = list
            .tasks
            .iter_mut()
            .find(|t| t.task == task)
            .ok_or_else(|| AppError::NotFound(format!("Task '{}' is not on today's list", task)))?;
        let step = quest
            .steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .ok_or_else(|| AppError::NotFound(format!("Step {} does not exist for task '{}'", step_id, task)))?;
        step.completed = !step.completed;
        debug!("Step {} of '{}' is now completed={}", step_id, task, step.completed);

        self.store.save_daily_tasks(user_id, &list).await?;
        self.refresh_board(user_id, list).await
    }

    pub async fn remove_task(&self, user_id: &str, task: &str) -> AppResult<DayBoard> {
        let mut list = self.load_today_tasks(user_id).await?;
        let before = list.tasks.len();
        list.tasks.retain(|t| t.task != task);
        if list.tasks.len() == before {
            return Err(AppError::NotFound(format!("Task '{}' is not on today's list", task)));
        }

        self.store.save_daily_tasks(user_id, &list).await?;
        info!("Removed task '{}' for user {}", task, user_id);
        self.refresh_board(user_id, list).await
    }

    /// Empties today's list and forgets today's hero.
    pub async fn clear_tasks(&self, user_id: &str) -> AppResult<DayBoard> {
        let fresh = DailyTaskList::empty(self.today());
        self.store.save_daily_tasks(user_id, &fresh).await?;
        self.store.delete_hero(user_id).await?;
        info!("Cleared today's tasks for user {}", user_id);
        self.board(user_id).await
    }

    /// Generates and stores the picture of today's hero.
    pub async fn reveal_hero_image(&self, user_id: &str) -> AppResult<HeroPersona> {
        let mut hero = self
            .load_today_hero(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No hero has been unlocked today".to_string()))?;

        if hero.image_prompt.trim().is_empty() {
            return Err(AppError::Validation(
                "Cannot generate image: the hero's image description is missing or invalid.".to_string(),
            ));
        }

        let prompt = format!("{}{}", hero.image_prompt, IMAGE_STYLE_SUFFIX);
        let output = self.flows.generate_image_from_prompt(&prompt).await;

        match output.image_url {
            Some(url) => {
                hero.image_url = Some(url);
                self.store.save_hero(user_id, &hero).await?;
                info!("Stored hero image for user {}", user_id);
                Ok(hero)
            }
            None => {
                let detail = output
                    .error
                    .unwrap_or_else(|| "Image URL was not returned.".to_string());
                warn!("Hero image generation failed for user {}: {}", user_id, detail);
                Err(AppError::External(format!("Could not generate hero image. {}", detail)))
            }
        }
    }
}
