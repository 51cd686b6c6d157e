pub mod authenticated_user;
pub mod flows;
pub mod quest;

pub use authenticated_user::AuthenticatedUser;
pub use flows::*;
pub use quest::*;
