use actix_web::{web, App, HttpServer, middleware::Logger};
use actix_cors::Cors;
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

use tasktastic_server::clients::GoogleClient;
use tasktastic_server::config::init_config;
use tasktastic_server::config::settings::{AppSettings, StoreBackend};
use tasktastic_server::db::{
    create_pool, ensure_schema, verify_connection, MemoryProgressStore, ProgressRepository, ProgressStore,
};
use tasktastic_server::error::AppError;
use tasktastic_server::handlers;
use tasktastic_server::middleware::FirebaseAuthentication;
use tasktastic_server::routes::configure_routes;
use tasktastic_server::services::age_appropriateness::HazardKeywordScreen;
use tasktastic_server::services::auth::{FirebaseTokenVerifier, IdTokenVerifier};
use tasktastic_server::services::clock::SystemClock;
use tasktastic_server::services::{AiFlowService, QuestService};
use tasktastic_server::utils::http_client::new_auth_client;

async fn build_store(settings: &AppSettings) -> Result<Arc<dyn ProgressStore>, AppError> {
    match settings.storage.backend {
        StoreBackend::Memory => {
            log::warn!("Using in-memory progress store; progress is lost on restart");
            Ok(Arc::new(MemoryProgressStore::new()))
        }
        StoreBackend::Postgres => {
            let url = settings.storage.database_url.as_deref().ok_or_else(|| {
                AppError::Configuration("DATABASE_URL must be set when STORE_BACKEND=postgres".to_string())
            })?;
            let pool = create_pool(url).await?;
            verify_connection(&pool).await?;
            ensure_schema(&pool).await?;
            log::info!("Database connection established successfully");
            Ok(Arc::new(ProgressRepository::new(pool)))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_settings = match init_config() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };
    log::info!("Starting {} ({})", app_settings.app.name, app_settings.app.environment);

    let store = match build_store(&app_settings).await {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to initialize progress store: {}", e);
            std::process::exit(1);
        }
    };

    let google_client = match GoogleClient::new(&app_settings.gemini) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Failed to initialize Gemini client: {}", e);
            std::process::exit(1);
        }
    };

    let verifier: Arc<dyn IdTokenVerifier> = match new_auth_client() {
        Ok(client) => Arc::new(FirebaseTokenVerifier::new(client, &app_settings.firebase)),
        Err(e) => {
            log::error!("Failed to initialize token verifier: {}", e);
            std::process::exit(1);
        }
    };

    let flows = Arc::new(AiFlowService::new(
        google_client,
        &app_settings.gemini,
        Arc::new(HazardKeywordScreen::new(app_settings.quest.age_screen_min_age)),
    ));

    let quests = match QuestService::new(store, flows.clone(), Arc::new(SystemClock), &app_settings.quest) {
        Ok(service) => web::Data::new(service),
        Err(e) => {
            log::error!("Failed to initialize quest service: {}", e);
            std::process::exit(1);
        }
    };
    let flows = web::Data::from(flows);

    let host = &app_settings.server.host;
    let port = app_settings.server.port;

    log::info!("Starting server at http://{}:{}", host, port);

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr)?;

    HttpServer::new(move || {
        let app_settings = app_settings.clone();

        // Configure CORS using actix-cors
        let mut cors = Cors::default()
            .supports_credentials();

        if app_settings.server.cors_origins.iter().any(|o| o == "*") {
            cors = cors.allow_any_origin();
        } else {
            for origin in &app_settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        cors = cors
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_settings))
            .app_data(flows.clone())
            .app_data(quests.clone())
            // Health check endpoint without auth
            .service(
                web::resource("/health")
                    .route(web::get().to(handlers::health::health_check))
            )
            // Protected API routes
            .service(
                web::scope("/api")
                    .wrap(FirebaseAuthentication::new(verifier.clone()))
                    .configure(configure_routes)
            )
    })
    .listen(listener)?
    .run()
    .await
}
