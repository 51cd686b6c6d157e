pub mod firebase_auth;

pub use firebase_auth::FirebaseAuthentication;
