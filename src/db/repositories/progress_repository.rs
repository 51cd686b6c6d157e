use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::store::{ProgressStore, StoreError};
use crate::models::{ChildProfile, DailyTaskList, HeroPersona, QuestTask, TaskGoal};

fn small_int_to_u8(value: i16, what: &'static str) -> Result<u8, StoreError> {
    u8::try_from(value).map_err(|_| StoreError::CorruptRecord {
        what,
        reason: format!("value {} out of range", value),
    })
}

#[derive(Debug, Clone)]
pub struct ProgressRepository {
    db_pool: PgPool,
}

impl ProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { db_pool: pool }
    }
}

#[async_trait]
impl ProgressStore for ProgressRepository {
    async fn load_profile(&self, user_id: &str) -> Result<ChildProfile, StoreError> {
        let row = sqlx::query_as::<_, (Option<i16>, Option<i16>, Option<DateTime<Utc>>)>(
            "SELECT age, goal_count, goal_updated_at FROM child_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        let Some((age, goal_count, goal_updated_at)) = row else {
            return Ok(ChildProfile::default());
        };

        let age = age.map(|a| small_int_to_u8(a, "child profile")).transpose()?;
        let goal = match (goal_count, goal_updated_at) {
            (Some(count), Some(updated_at)) => Some(TaskGoal {
                count: small_int_to_u8(count, "task goal")?,
                updated_at,
            }),
            _ => None,
        };

        Ok(ChildProfile { age, goal })
    }

    async fn save_age(&self, user_id: &str, age: u8) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO child_profiles (user_id, age, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                age = EXCLUDED.age,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(i16::from(age))
        .execute(&self.db_pool)
        .await?;
        Ok(())
    }

    async fn save_goal(&self, user_id: &str, goal: TaskGoal) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO child_profiles (user_id, goal_count, goal_updated_at, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                goal_count = EXCLUDED.goal_count,
                goal_updated_at = EXCLUDED.goal_updated_at,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(i16::from(goal.count))
        .bind(goal.updated_at)
        .execute(&self.db_pool)
        .await?;
        Ok(())
    }

    async fn load_daily_tasks(&self, user_id: &str) -> Result<Option<DailyTaskList>, StoreError> {
        let row = sqlx::query_as::<_, (NaiveDate, Json<Vec<QuestTask>>)>(
            "SELECT list_date, tasks FROM daily_task_lists WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(row.map(|(date, Json(tasks))| DailyTaskList { date, tasks }))
    }

    async fn save_daily_tasks(&self, user_id: &str, list: &DailyTaskList) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO daily_task_lists (user_id, list_date, tasks, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                list_date = EXCLUDED.list_date,
                tasks = EXCLUDED.tasks,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(list.date)
        .bind(Json(&list.tasks))
        .execute(&self.db_pool)
        .await?;
        Ok(())
    }

    async fn load_hero(&self, user_id: &str) -> Result<Option<HeroPersona>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, Option<String>, NaiveDate)>(
            r#"
            SELECT name, description, image_prompt, image_url, persona_date
            FROM hero_personas
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(row.map(|(name, description, image_prompt, image_url, date)| HeroPersona {
            name,
            description,
            image_prompt,
            image_url,
            date,
        }))
    }

    async fn save_hero(&self, user_id: &str, hero: &HeroPersona) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO hero_personas (user_id, name, description, image_prompt, image_url, persona_date, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                image_prompt = EXCLUDED.image_prompt,
                image_url = EXCLUDED.image_url,
                persona_date = EXCLUDED.persona_date,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(&hero.name)
        .bind(&hero.description)
        .bind(&hero.image_prompt)
        .bind(hero.image_url.as_deref())
        .bind(hero.date)
        .execute(&self.db_pool)
        .await?;
        Ok(())
    }

    async fn delete_hero(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM hero_personas WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::{create_pool, ensure_schema};
    use crate::models::ChecklistStep;

    async fn repository() -> Option<ProgressRepository> {
        // Only runs against a real database
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.ok()?;
        ensure_schema(&pool).await.ok()?;
        Some(ProgressRepository::new(pool))
    }

    #[tokio::test]
    async fn test_round_trip_against_database() {
        let Some(repo) = repository().await else {
            return;
        };
        let user_id = format!("test-{}", uuid::Uuid::new_v4());
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        assert_eq!(repo.load_profile(&user_id).await.unwrap(), ChildProfile::default());

        repo.save_age(&user_id, 8).await.unwrap();
        repo.save_goal(&user_id, TaskGoal { count: 2, updated_at: Utc::now() }).await.unwrap();
        let profile = repo.load_profile(&user_id).await.unwrap();
        assert_eq!(profile.age, Some(8));
        assert_eq!(profile.goal.map(|g| g.count), Some(2));

        let list = DailyTaskList {
            date,
            tasks: vec![QuestTask {
                task: "Feed the cat".to_string(),
                steps: vec![ChecklistStep {
                    id: 0,
                    instruction: "Fill the bowl".to_string(),
                    encouragement: "Purrfect!".to_string(),
                    completed: true,
                }],
            }],
        };
        repo.save_daily_tasks(&user_id, &list).await.unwrap();
        assert_eq!(repo.load_daily_tasks(&user_id).await.unwrap(), Some(list));

        let hero = HeroPersona {
            name: "Whisker Wizard".to_string(),
            description: "Caring and kind".to_string(),
            image_prompt: "A wizard cat".to_string(),
            image_url: None,
            date,
        };
        repo.save_hero(&user_id, &hero).await.unwrap();
        assert_eq!(repo.load_hero(&user_id).await.unwrap(), Some(hero));
        repo.delete_hero(&user_id).await.unwrap();
        assert!(repo.load_hero(&user_id).await.unwrap().is_none());
    }
}
