// Service-account credentials and the OAuth2 access-token cache
use crate::application::imagery_client::ImageryError;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;

const EARTH_ENGINE_SCOPES: &str =
    "https://www.googleapis.com/auth/earthengine https://www.googleapis.com/auth/cloud-platform";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential blob is not a valid service-account key: {0}")]
    Json(#[from] serde_json::Error),
    #[error("service-account private key rejected: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

/// Parsed service-account key, ready to sign token requests.
#[derive(Clone)]
pub struct ServiceAccountCredentials {
    client_email: String,
    project_id: Option<String>,
    token_uri: String,
    key: EncodingKey,
}

impl ServiceAccountCredentials {
    /// Parse the key JSON and load its RSA private key.
    pub fn from_json(blob: &str) -> Result<Self, CredentialError> {
        let key: ServiceAccountKey = serde_json::from_str(blob)?;
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            client_email: key.client_email,
            project_id: key.project_id,
            token_uri: key.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            key: encoding_key,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    fn assertion(&self, issued_at: u64) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            iss: &self.client_email,
            scope: EARTH_ENGINE_SCOPES,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
    }
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Hands out bearer tokens, exchanging a signed assertion when the cached one is stale.
pub struct TokenProvider {
    credentials: ServiceAccountCredentials,
    http: reqwest::Client,
    // Held across the exchange so concurrent callers wait for one refresh
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(credentials: ServiceAccountCredentials, http: reqwest::Client) -> Self {
        Self {
            credentials,
            http,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, ImageryError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let token = self.exchange().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn exchange(&self) -> Result<AccessToken, ImageryError> {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ImageryError::Auth(e.to_string()))?
            .as_secs();
        let assertion = self
            .credentials
            .assertion(issued_at)
            .map_err(|e| ImageryError::Auth(format!("failed to sign assertion: {}", e)))?;

        tracing::info!(
            "Requesting access token for {}",
            self.credentials.client_email()
        );
        let requested_at = Instant::now();
        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ImageryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned {}: {}", status, body),
            };
            return Err(ImageryError::Auth(reason));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ImageryError::Decode(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(AccessToken {
            value: token.access_token,
            refresh_at: requested_at + lifetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake_google_api::{
        FakeGoogleApi, TEST_PUBLIC_KEY, service_account_json,
    };
    use jsonwebtoken::{DecodingKey, Validation};

    fn credentials_for(token_uri: &str) -> ServiceAccountCredentials {
        ServiceAccountCredentials::from_json(&service_account_json(token_uri)).unwrap()
    }

    fn provider_for(token_uri: &str) -> TokenProvider {
        TokenProvider::new(credentials_for(token_uri), reqwest::Client::new())
    }

    #[test]
    fn test_assertion_claims() {
        let token_uri = "https://oauth2.example/token";
        let credentials = credentials_for(token_uri);
        assert_eq!(credentials.project_id(), Some("demo-project"));

        let issued_at = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let assertion = credentials.assertion(issued_at).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[token_uri]);
        let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
        let claims = jsonwebtoken::decode::<serde_json::Value>(&assertion, &key, &validation)
            .unwrap()
            .claims;

        assert_eq!(claims["iss"], "svc@demo-project.iam.gserviceaccount.com");
        assert_eq!(claims["scope"], EARTH_ENGINE_SCOPES);
        assert_eq!(claims["iat"].as_u64(), Some(issued_at));
        assert_eq!(claims["exp"].as_u64(), Some(issued_at + ASSERTION_LIFETIME_SECS));
    }

    #[tokio::test]
    async fn test_token_cached_between_calls() {
        let api = FakeGoogleApi::spawn(3600).await;
        let provider = provider_for(&api.token_uri());

        assert_eq!(provider.access_token().await.unwrap(), "token-1");
        assert_eq!(provider.access_token().await.unwrap(), "token-1");
        assert_eq!(api.exchanges(), 1);

        let exchange = &api.requests()[0];
        assert_eq!(exchange.path, "/token");
        assert!(
            exchange
                .body
                .contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer")
        );
        assert!(exchange.body.contains("assertion="));
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_exchange() {
        let api = FakeGoogleApi::spawn(3600).await;
        let provider = provider_for(&api.token_uri());

        let (first, second, third) = tokio::join!(
            provider.access_token(),
            provider.access_token(),
            provider.access_token(),
        );
        assert_eq!(first.unwrap(), "token-1");
        assert_eq!(second.unwrap(), "token-1");
        assert_eq!(third.unwrap(), "token-1");
        assert_eq!(api.exchanges(), 1);
    }

    #[tokio::test]
    async fn test_token_within_expiry_margin_is_refreshed() {
        // 30 s lifetime is already inside the 60 s refresh margin
        let api = FakeGoogleApi::spawn(30).await;
        let provider = provider_for(&api.token_uri());

        assert_eq!(provider.access_token().await.unwrap(), "token-1");
        assert_eq!(provider.access_token().await.unwrap(), "token-2");
        assert_eq!(api.exchanges(), 2);
    }

    #[tokio::test]
    async fn test_rejected_assertion_is_auth_error() {
        let api = FakeGoogleApi::spawn(3600).await;
        let provider = provider_for(&format!("{}/token-rejected", api.base_url));

        let err = provider.access_token().await.unwrap_err();
        assert_eq!(
            err,
            ImageryError::Auth("invalid_grant: Invalid JWT Signature.".into())
        );
    }

    #[test]
    fn test_missing_fields_rejected() {
        let err = ServiceAccountCredentials::from_json(r#"{"client_email":"svc@example.iam"}"#)
            .err()
            .unwrap();
        assert!(matches!(err, CredentialError::Json(_)));
        assert!(err.to_string().contains("private_key"));
    }

    #[test]
    fn test_not_json_rejected() {
        let err = ServiceAccountCredentials::from_json("not json").err().unwrap();
        assert!(matches!(err, CredentialError::Json(_)));
    }

    #[test]
    fn test_malformed_private_key_rejected() {
        let blob = r#"{"client_email":"svc@example.iam","private_key":"not a pem"}"#;
        let err = ServiceAccountCredentials::from_json(blob).err().unwrap();
        assert!(matches!(err, CredentialError::Key(_)));
    }
}
