use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::settings::FirebaseConfig;
use crate::error::AppError;
use crate::models::AuthenticatedUser;

/// Resolves a client-presented ID token to the user it belongs to.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<AuthenticatedUser, AppError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<FirebaseUserInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirebaseUserInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    provider_user_info: Vec<ProviderInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderInfo {
    provider_id: String,
}

struct CachedIdentity {
    user: AuthenticatedUser,
    expires_at: Instant,
}

/// Verifies Firebase ID tokens through the Identity Toolkit `accounts:lookup` endpoint.
///
/// Successful lookups are cached by SHA-256 of the token so a busy client does not
/// hit the identity service on every request.
pub struct FirebaseTokenVerifier {
    client: Client,
    lookup_url: String,
    api_key: String,
    cache: DashMap<String, CachedIdentity>,
    cache_ttl: Duration,
}

impl FirebaseTokenVerifier {
    pub fn new(client: Client, config: &FirebaseConfig) -> Self {
        info!("Initialized Firebase token verifier with project ID: {}", config.project_id);

        Self {
            client,
            lookup_url: format!("{}/accounts:lookup", config.identity_base_url),
            api_key: config.api_key.clone(),
            cache: DashMap::new(),
            cache_ttl: Duration::from_secs(config.token_cache_seconds),
        }
    }

    fn cache_key(id_token: &str) -> String {
        hex::encode(Sha256::digest(id_token.as_bytes()))
    }

    fn cached(&self, key: &str) -> Option<AuthenticatedUser> {
        let entry = self.cache.get(key)?;
        if entry.expires_at > Instant::now() {
            return Some(entry.user.clone());
        }
        drop(entry);
        self.cache.remove(key);
        None
    }

    /// Drops every expired identity, including tokens that were never presented again.
    fn sweep_expired(&self, now: Instant) {
        let before = self.cache.len();
        self.cache.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.cache.len());
        if removed > 0 {
            debug!("Removed {} expired token cache entries", removed);
        }
    }

    async fn lookup(&self, id_token: &str) -> Result<AuthenticatedUser, AppError> {
        let response = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| {
                error!("Identity service unreachable: {}", e);
                AppError::External(format!("Identity service unavailable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Firebase API error: {} - {}", status, text);
            if status.is_server_error() {
                return Err(AppError::External(format!("Identity service unavailable: HTTP {}", status)));
            }
            return Err(AppError::Auth(format!("Invalid token: HTTP {}", status)));
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse verification response: {}", e)))?;

        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Auth("User not found for token".to_string()))?;

        let sign_in_provider = user
            .provider_user_info
            .first()
            .map(|p| p.provider_id.clone())
            .unwrap_or_else(|| "password".to_string());

        Ok(AuthenticatedUser {
            user_id: user.local_id,
            email: user.email,
            display_name: user.display_name,
            sign_in_provider,
        })
    }
}

#[async_trait]
impl IdTokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<AuthenticatedUser, AppError> {
        let key = Self::cache_key(id_token);
        if let Some(user) = self.cached(&key) {
            debug!("Token cache hit for user {}", user.user_id);
            return Ok(user);
        }

        debug!("Verifying Firebase ID token");
        let user = self.lookup(id_token).await?;

        if !self.cache_ttl.is_zero() {
            let now = Instant::now();
            self.sweep_expired(now);
            self.cache.insert(
                key,
                CachedIdentity { user: user.clone(), expires_at: now + self.cache_ttl },
            );
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    fn verifier(server: &mockito::Server, cache_seconds: u64) -> FirebaseTokenVerifier {
        let config = FirebaseConfig {
            api_key: "fb-key".to_string(),
            project_id: "tasktastic".to_string(),
            identity_base_url: server.url(),
            token_cache_seconds: cache_seconds,
        };
        FirebaseTokenVerifier::new(Client::new(), &config)
    }

    const LOOKUP_BODY: &str = r#"{
        "users": [{
            "localId": "uid-123",
            "email": "kid@example.com",
            "displayName": "Sam",
            "providerUserInfo": [{"providerId": "google.com"}]
        }]
    }"#;

    #[tokio::test]
    async fn test_lookup_maps_user_and_caches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts:lookup")
            .match_query(Matcher::UrlEncoded("key".into(), "fb-key".into()))
            .match_body(Matcher::Json(serde_json::json!({ "idToken": "token-abc" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LOOKUP_BODY)
            .expect(1)
            .create_async()
            .await;

        let verifier = verifier(&server, 300);
        let user = verifier.verify("token-abc").await.unwrap();
        assert_eq!(
            user,
            AuthenticatedUser {
                user_id: "uid-123".to_string(),
                email: Some("kid@example.com".to_string()),
                display_name: Some("Sam".to_string()),
                sign_in_provider: "google.com".to_string(),
            }
        );

        let again = verifier.verify("token-abc").await.unwrap();
        assert_eq!(again.user_id, "uid-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/accounts:lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"users": [{"localId": "uid-9"}]}"#)
            .expect(2)
            .create_async()
            .await;

        let verifier = verifier(&server, 0);
        let user = verifier.verify("token").await.unwrap();
        assert_eq!(user.sign_in_provider, "password");
        assert_eq!(user.email, None);
        verifier.verify("token").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_token_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/accounts:lookup")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error": {"message": "INVALID_ID_TOKEN"}}"#)
            .create_async()
            .await;

        let result = verifier(&server, 300).verify("bad").await;
        assert!(matches!(result, Err(AppError::Auth(msg)) if msg.contains("400")));
    }

    #[tokio::test]
    async fn test_expired_entries_of_rotated_tokens_are_swept() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/accounts:lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(LOOKUP_BODY)
            .create_async()
            .await;

        let verifier = verifier(&server, 300);
        let expired_at = Instant::now();
        for n in 0..50 {
            verifier.cache.insert(
                FirebaseTokenVerifier::cache_key(&format!("rotated-{}", n)),
                CachedIdentity {
                    user: AuthenticatedUser {
                        user_id: "uid-123".to_string(),
                        email: None,
                        display_name: None,
                        sign_in_provider: "password".to_string(),
                    },
                    expires_at: expired_at,
                },
            );
        }
        assert_eq!(verifier.cache.len(), 50);

        verifier.verify("fresh-token").await.unwrap();
        assert_eq!(verifier.cache.len(), 1);
        assert!(verifier.cached(&FirebaseTokenVerifier::cache_key("fresh-token")).is_some());
    }

    #[tokio::test]
    async fn test_identity_service_outage_is_external_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/accounts:lookup")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let result = verifier(&server, 300).verify("token").await;
        assert!(matches!(result, Err(AppError::External(msg)) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_unreachable_identity_service_is_external_error() {
        let config = FirebaseConfig {
            api_key: "fb-key".to_string(),
            project_id: "tasktastic".to_string(),
            identity_base_url: "http://127.0.0.1:1".to_string(),
            token_cache_seconds: 300,
        };
        let result = FirebaseTokenVerifier::new(Client::new(), &config).verify("token").await;
        assert!(matches!(result, Err(AppError::External(_))));
    }

    #[tokio::test]
    async fn test_unknown_user_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/accounts:lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let result = verifier(&server, 300).verify("orphan").await;
        assert!(matches!(result, Err(AppError::Auth(msg)) if msg == "User not found for token"));
    }
}
