use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::AUTHORIZATION, Method},
    Error, HttpMessage,
};
use futures_util::future::{ok, ready, Ready};
use log::{debug, error, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::services::auth::IdTokenVerifier;

/// Requires a valid `Authorization: Bearer <ID token>` header and stores the
/// resolved [`AuthenticatedUser`] in the request extensions.
#[derive(Clone)]
pub struct FirebaseAuthentication {
    verifier: Arc<dyn IdTokenVerifier>,
}

impl FirebaseAuthentication {
    pub fn new(verifier: Arc<dyn IdTokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for FirebaseAuthentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = FirebaseAuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(FirebaseAuthenticationMiddleware {
            service: Arc::new(service),
            verifier: self.verifier.clone(),
        })
    }
}

pub struct FirebaseAuthenticationMiddleware<S> {
    service: Arc<S>,
    verifier: Arc<dyn IdTokenVerifier>,
}

fn unauthorized(message: &str) -> Error {
    AppError::Auth(message.to_string()).into()
}

/// Token part of a `Bearer` authorization value.
fn bearer_token(header: &str) -> Result<&str, &'static str> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or("Invalid Authorization format, expected Bearer token")?
        .trim();
    if token.is_empty() {
        return Err("Empty Bearer token");
    }
    Ok(token)
}

impl<S, B> Service<ServiceRequest> for FirebaseAuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();

        // CORS pre-flight carries no credentials
        if req.method() == Method::OPTIONS {
            debug!("Skipping authentication for OPTIONS request to: {}", path);
            return Box::pin(service.call(req));
        }

        let header = match req.headers().get(AUTHORIZATION).map(|h| h.to_str()) {
            Some(Ok(value)) => value,
            Some(Err(_)) => {
                warn!("Invalid Authorization header encoding for path: {}", path);
                return Box::pin(ready(Err(unauthorized("Invalid Authorization header"))));
            }
            None => {
                warn!("No Authorization header found for path: {}", path);
                return Box::pin(ready(Err(unauthorized("Missing Authorization header"))));
            }
        };

        let token = match bearer_token(header) {
            Ok(token) => token.to_string(),
            Err(reason) => {
                warn!("{} for path: {}", reason, path);
                return Box::pin(ready(Err(unauthorized(reason))));
            }
        };

        let verifier = self.verifier.clone();
        Box::pin(async move {
            match verifier.verify(&token).await {
                Ok(user) => {
                    debug!("Authenticated user {} for route {}", user.user_id, path);
                    req.extensions_mut().insert(user);
                    service.call(req).await
                }
                Err(AppError::Auth(msg)) => {
                    warn!("Token verification failed for route {}: {}", path, msg);
                    Err(unauthorized(&msg))
                }
                Err(e) => {
                    error!("Authentication error for route {}: {}", path, e);
                    Err(e.into())
                }
            }
        })
    }
}
