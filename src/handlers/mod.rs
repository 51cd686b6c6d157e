pub mod day_handlers;
pub mod flow_handlers;
pub mod health;
pub mod profile_handlers;
