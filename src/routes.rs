use actix_web::web;
use crate::handlers;

/// Configures API routes that require a Firebase ID token.
/// Mounted under the "/api" scope and wrapped with FirebaseAuthentication in main.rs.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::flow_handlers::generate_image)
        .service(handlers::profile_handlers::get_me)
        .service(handlers::day_handlers::get_suggestions);

    // Raw generative flows (/api/flows/*)
    cfg.service(
        web::scope("/flows")
            .service(handlers::flow_handlers::suggest_tasks)
            .service(handlers::flow_handlers::personalize_instructions)
            .service(handlers::flow_handlers::magical_personality)
    );

    // Profile routes (/api/profile/*)
    cfg.service(
        web::scope("/profile")
            .service(handlers::profile_handlers::get_profile)
            .service(handlers::profile_handlers::update_age)
            .service(handlers::profile_handlers::update_goal)
    );

    // Today's board (/api/day/*)
    cfg.service(
        web::scope("/day")
            .service(handlers::day_handlers::get_day)
            .service(handlers::day_handlers::clear_day)
            .service(handlers::day_handlers::add_task)
            .service(handlers::day_handlers::remove_task)
            .service(handlers::day_handlers::toggle_step)
            .service(handlers::day_handlers::reveal_hero_image)
    );
}
