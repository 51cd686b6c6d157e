use actix_web::{dev::Payload, Error, FromRequest, HttpRequest, HttpMessage};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

/// Identity attached to a request by the Firebase authentication middleware.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub sign_in_provider: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
            ready(Ok(user.clone()))
        } else {
            log::error!("AuthenticatedUser not found in request extensions for path: {}", req.path());
            ready(Err(actix_web::error::ErrorUnauthorized("Not authenticated")))
        }
    }
}
