pub mod firebase_token_verifier;

pub use firebase_token_verifier::{FirebaseTokenVerifier, IdTokenVerifier};
