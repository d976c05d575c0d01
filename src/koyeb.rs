//! Client for the Koyeb cloud application management API.
//!
//! The client is stateless: every call takes the caller's access token,
//! because tokens belong to chat sessions, never to the client. The
//! [`AppPlatform`] trait is the seam the bot handlers talk through, so
//! tests can substitute a recording mock.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::koyeb_errors::KoyebError;

pub const DEFAULT_BASE_URL: &str = "https://api.koyeb.com/v1";

/// The management operations the bot performs against the platform.
#[async_trait]
pub trait AppPlatform: Send + Sync {
    /// Exchange an API key for an access token.
    async fn authenticate(&self, api_key: &str) -> Result<String, KoyebError>;
    /// Create an app and return its id.
    async fn create_app(&self, token: &str, name: &str) -> Result<String, KoyebError>;
    async fn delete_app(&self, token: &str, app_id: &str) -> Result<(), KoyebError>;
    async fn list_apps(&self, token: &str) -> Result<String, KoyebError>;
    async fn get_app(&self, token: &str, app_id: &str) -> Result<String, KoyebError>;
    async fn deploy(&self, token: &str, app_id: &str) -> Result<(), KoyebError>;
    async fn redeploy(&self, token: &str, app_id: &str) -> Result<(), KoyebError>;
    async fn get_logs(&self, token: &str, app_id: &str) -> Result<String, KoyebError>;
    async fn get_env_vars(&self, token: &str, app_id: &str) -> Result<String, KoyebError>;
    async fn get_env_var(
        &self,
        token: &str,
        app_id: &str,
        key: &str,
    ) -> Result<String, KoyebError>;
    async fn set_env_var(
        &self,
        token: &str,
        app_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), KoyebError>;
    async fn delete_env_var(&self, token: &str, app_id: &str, key: &str)
        -> Result<(), KoyebError>;
}

/// Production implementation over the Koyeb REST API.
pub struct KoyebClient {
    http: reqwest::Client,
    base_url: String,
}

impl KoyebClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read the body of a response that arrived with the expected status;
    /// any other status becomes an `Api` error carrying the body text.
    async fn expect_text(
        response: reqwest::Response,
        expected: u16,
    ) -> Result<String, KoyebError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        if status == expected {
            Ok(body)
        } else {
            Err(KoyebError::Api { status, body })
        }
    }

    async fn expect_status(response: reqwest::Response, expected: u16) -> Result<(), KoyebError> {
        Self::expect_text(response, expected).await.map(|_| ())
    }
}

#[async_trait]
impl AppPlatform for KoyebClient {
    async fn authenticate(&self, api_key: &str) -> Result<String, KoyebError> {
        debug!("Authenticating against Koyeb");
        let response = self
            .http
            .get(self.url("/auth"))
            .bearer_auth(api_key)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if status != 200 {
            return Err(KoyebError::Auth(body));
        }

        let parsed: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| KoyebError::Decode(e.to_string()))?;
        parsed
            .get("access_token")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| KoyebError::Decode("missing access_token field".to_string()))
    }

    async fn create_app(&self, token: &str, name: &str) -> Result<String, KoyebError> {
        debug!(app_name = %name, "Creating app");
        let response = self
            .http
            .post(self.url("/apps"))
            .bearer_auth(token)
            .json(&json!({ "name": name }))
            .send()
            .await?;

        let body = Self::expect_text(response, 201).await?;
        let parsed: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| KoyebError::Decode(e.to_string()))?;
        // The API nests the created app under an "app" object.
        parsed
            .pointer("/app/id")
            .or_else(|| parsed.get("id"))
            .and_then(|id| id.as_str())
            .map(|id| id.to_string())
            .ok_or_else(|| KoyebError::Decode("missing app id in response".to_string()))
    }

    async fn delete_app(&self, token: &str, app_id: &str) -> Result<(), KoyebError> {
        let response = self
            .http
            .delete(self.url(&format!("/apps/{app_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_status(response, 204).await
    }

    async fn list_apps(&self, token: &str) -> Result<String, KoyebError> {
        let response = self
            .http
            .get(self.url("/apps"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_text(response, 200).await
    }

    async fn get_app(&self, token: &str, app_id: &str) -> Result<String, KoyebError> {
        let response = self
            .http
            .get(self.url(&format!("/apps/{app_id}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_text(response, 200).await
    }

    async fn deploy(&self, token: &str, app_id: &str) -> Result<(), KoyebError> {
        let response = self
            .http
            .post(self.url(&format!("/apps/{app_id}/deploy")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_status(response, 202).await
    }

    async fn redeploy(&self, token: &str, app_id: &str) -> Result<(), KoyebError> {
        let response = self
            .http
            .post(self.url(&format!("/apps/{app_id}/redeploy")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_status(response, 202).await
    }

    async fn get_logs(&self, token: &str, app_id: &str) -> Result<String, KoyebError> {
        let response = self
            .http
            .get(self.url(&format!("/apps/{app_id}/logs")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_text(response, 200).await
    }

    async fn get_env_vars(&self, token: &str, app_id: &str) -> Result<String, KoyebError> {
        let response = self
            .http
            .get(self.url(&format!("/apps/{app_id}/env-vars")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_text(response, 200).await
    }

    async fn get_env_var(
        &self,
        token: &str,
        app_id: &str,
        key: &str,
    ) -> Result<String, KoyebError> {
        let response = self
            .http
            .get(self.url(&format!("/apps/{app_id}/env-vars/{key}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_text(response, 200).await
    }

    async fn set_env_var(
        &self,
        token: &str,
        app_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), KoyebError> {
        let response = self
            .http
            .post(self.url(&format!("/apps/{app_id}/env-vars")))
            .bearer_auth(token)
            .json(&json!({ "key": key, "value": value }))
            .send()
            .await?;
        Self::expect_status(response, 201).await
    }

    async fn delete_env_var(
        &self,
        token: &str,
        app_id: &str,
        key: &str,
    ) -> Result<(), KoyebError> {
        let response = self
            .http
            .delete(self.url(&format!("/apps/{app_id}/env-vars/{key}")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::expect_status(response, 204).await
    }
}
