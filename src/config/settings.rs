use std::env;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
/// One year; longer goal lifetimes are treated as misconfiguration.
pub const MAX_TASK_GOAL_TTL_HOURS: i64 = 24 * 366;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub firebase: FirebaseConfig,
    pub storage: StorageConfig,
    pub quest: QuestConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub identity_base_url: String,
    pub token_cache_seconds: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestConfig {
    pub day_utc_offset_minutes: i32,
    pub default_task_goal: u8,
    pub task_goal_ttl_hours: i64,
    pub age_screen_min_age: u8,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        // App config
        let app_name = var_or("APP_NAME", "tasktastic-kids");
        let environment = var_or("ENVIRONMENT", "development");

        // Server config
        let server_host = var_or("SERVER_HOST", "0.0.0.0");
        let server_port = var_or("SERVER_PORT", "8080")
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // CORS origins
        let cors_origins = var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Gemini keys: a comma separated list, or the single key the web app used
        let api_keys: Vec<String> = lookup("GEMINI_API_KEYS")
            .or_else(|| lookup("GOOGLE_GENAI_API_KEY"))
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if api_keys.is_empty() {
            return Err(AppError::Configuration(
                "GEMINI_API_KEYS (or GOOGLE_GENAI_API_KEY) must be set".to_string(),
            ));
        }

        let gemini_base_url = var_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let text_model = var_or("GEMINI_TEXT_MODEL", DEFAULT_TEXT_MODEL);
        let image_model = var_or("GEMINI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL);

        // Firebase
        let firebase_api_key = lookup("FIREBASE_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("FIREBASE_API_KEY must be set".to_string()))?;

        let firebase_project_id = lookup("FIREBASE_PROJECT_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("FIREBASE_PROJECT_ID must be set".to_string()))?;

        let identity_base_url = var_or("FIREBASE_AUTH_BASE_URL", DEFAULT_IDENTITY_TOOLKIT_URL)
            .trim_end_matches('/')
            .to_string();

        let token_cache_seconds = var_or("AUTH_TOKEN_CACHE_SECONDS", "300")
            .parse::<u64>()
            .map_err(|_| AppError::Configuration("AUTH_TOKEN_CACHE_SECONDS must be a valid number".to_string()))?;

        // Storage
        let backend = match var_or("STORE_BACKEND", "memory").to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres,
            other => {
                return Err(AppError::Configuration(format!(
                    "STORE_BACKEND must be 'memory' or 'postgres', got '{}'",
                    other
                )));
            }
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::Configuration(
                "DATABASE_URL must be set when STORE_BACKEND=postgres".to_string(),
            ));
        }

        // Quest rules
        let day_utc_offset_minutes = var_or("DAY_UTC_OFFSET_MINUTES", "0")
            .parse::<i32>()
            .ok()
            .filter(|m| m.abs() < 24 * 60)
            .ok_or_else(|| AppError::Configuration("DAY_UTC_OFFSET_MINUTES must be between -1439 and 1439".to_string()))?;

        let default_task_goal = var_or("DEFAULT_TASK_GOAL", "3")
            .parse::<u8>()
            .ok()
            .filter(|g| (1..=10).contains(g))
            .ok_or_else(|| AppError::Configuration("DEFAULT_TASK_GOAL must be between 1 and 10".to_string()))?;

        let task_goal_ttl_hours = var_or("TASK_GOAL_TTL_HOURS", "24")
            .parse::<i64>()
            .ok()
            .filter(|h| (1..=MAX_TASK_GOAL_TTL_HOURS).contains(h))
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "TASK_GOAL_TTL_HOURS must be between 1 and {}",
                    MAX_TASK_GOAL_TTL_HOURS
                ))
            })?;

        let age_screen_min_age = var_or("AGE_SCREEN_MIN_AGE", "12")
            .parse::<u8>()
            .map_err(|_| AppError::Configuration("AGE_SCREEN_MIN_AGE must be a valid age".to_string()))?;

        Ok(Self {
            app: AppConfig {
                name: app_name,
                environment,
            },
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
            },
            gemini: GeminiConfig {
                api_keys,
                base_url: gemini_base_url,
                text_model,
                image_model,
            },
            firebase: FirebaseConfig {
                api_key: firebase_api_key,
                project_id: firebase_project_id,
                identity_base_url,
                token_cache_seconds,
            },
            storage: StorageConfig {
                backend,
                database_url,
            },
            quest: QuestConfig {
                day_utc_offset_minutes,
                default_task_goal,
                task_goal_ttl_hours,
                age_screen_min_age,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("GEMINI_API_KEYS", "key-a, key-b"),
        ("FIREBASE_API_KEY", "fb-key"),
        ("FIREBASE_PROJECT_ID", "tasktastic"),
    ];

    #[test]
    fn test_defaults() {
        let settings = AppSettings::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.cors_origins, vec!["*".to_string()]);
        assert_eq!(settings.gemini.api_keys, vec!["key-a".to_string(), "key-b".to_string()]);
        assert_eq!(settings.gemini.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(settings.gemini.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(settings.storage.backend, StoreBackend::Memory);
        assert_eq!(settings.quest.default_task_goal, 3);
        assert_eq!(settings.quest.task_goal_ttl_hours, 24);
        assert_eq!(settings.firebase.token_cache_seconds, 300);
        assert_eq!(settings.firebase.identity_base_url, DEFAULT_IDENTITY_TOOLKIT_URL);
    }

    #[test]
    fn test_single_genai_key_fallback() {
        let settings = AppSettings::from_lookup(lookup_from(&[
            ("GOOGLE_GENAI_API_KEY", "only-key"),
            ("FIREBASE_API_KEY", "fb-key"),
            ("FIREBASE_PROJECT_ID", "tasktastic"),
        ]))
        .unwrap();
        assert_eq!(settings.gemini.api_keys, vec!["only-key".to_string()]);
    }

    #[test]
    fn test_missing_gemini_key_is_rejected() {
        let result = AppSettings::from_lookup(lookup_from(&[
            ("FIREBASE_API_KEY", "fb-key"),
            ("FIREBASE_PROJECT_ID", "tasktastic"),
        ]));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STORE_BACKEND", "postgres"));
        let result = AppSettings::from_lookup(lookup_from(&pairs));
        assert!(matches!(result, Err(AppError::Configuration(_))));

        pairs.push(("DATABASE_URL", "postgres://localhost/tasktastic"));
        let settings = AppSettings::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(settings.storage.backend, StoreBackend::Postgres);
    }

    #[test]
    fn test_goal_bounds() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DEFAULT_TASK_GOAL", "11"));
        assert!(AppSettings::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_goal_ttl_bounds() {
        for bad in ["0", "-5", "9223372036854775807", "soon"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("TASK_GOAL_TTL_HOURS", bad));
            let result = AppSettings::from_lookup(lookup_from(&pairs));
            assert!(matches!(result, Err(AppError::Configuration(_))), "accepted {}", bad);
        }

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("TASK_GOAL_TTL_HOURS", "8784"));
        let settings = AppSettings::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(settings.quest.task_goal_ttl_hours, MAX_TASK_GOAL_TTL_HOURS);
    }
}
