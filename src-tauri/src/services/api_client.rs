//! AgroPec API client.
//!
//! Provides the HTTP client for the fair's REST API with bearer-token
//! authentication. Only the notification endpoints are consumed here; the
//! server and its data model are external collaborators.

use crate::error::AppError;
use crate::models::{GlobalNotification, PersonalNotification};
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

/// Fixed production API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.agropec.com.br";

/// AgroPec API client configuration.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the AgroPec API.
    pub base_url: String,

    /// Session token attached as a bearer header, if authenticated.
    pub token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}

impl ApiClientConfig {
    /// Config for an authenticated session against the fixed endpoint.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }
}

/// AgroPec API client.
#[derive(Debug, Clone)]
pub struct AgroPecClient {
    client: Client,
    config: ApiClientConfig,
}

/// Response from the mark-all-read endpoint.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    /// How many notifications transitioned to read.
    pub marked_count: u64,
}

impl AgroPecClient {
    /// Create a new API client.
    pub fn new(config: ApiClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();

        if let Some(token) = &config.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AppError::authentication("Invalid token format"))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Handle API response errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)))
        } else if status == StatusCode::UNAUTHORIZED {
            Err(AppError::authentication(
                "Session token expired or revoked. Please sign in again.",
            ))
        } else if status == StatusCode::NOT_FOUND {
            Err(AppError::not_found(endpoint.to_string()))
        } else {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            let body_message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    // The API returns errors as {"message": "..."} or {"error": "..."}
                    v.get("message")
                        .or_else(|| v.get("error"))
                        .and_then(|m| m.as_str().map(String::from))
                });

            let message = match (status, &body_message) {
                (StatusCode::FORBIDDEN, _) => "Access denied".to_string(),
                (StatusCode::TOO_MANY_REQUESTS, _) => "Rate limit exceeded".to_string(),
                (_, Some(msg)) => msg.clone(),
                _ => format!("Request failed ({}): {}", status_code, body),
            };

            Err(AppError::api_full(&message, status_code, endpoint))
        }
    }

    /// Send a DELETE request, expecting only a success status.
    async fn delete_empty(&self, endpoint: &str) -> Result<(), AppError> {
        let url = self.api_url(endpoint);
        let response = self.client.delete(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else if status == StatusCode::UNAUTHORIZED {
            Err(AppError::authentication(
                "Session token expired or revoked. Please sign in again.",
            ))
        } else if status == StatusCode::NOT_FOUND {
            Err(AppError::not_found(endpoint.to_string()))
        } else {
            Err(AppError::api_full(
                "Request failed",
                status.as_u16(),
                endpoint,
            ))
        }
    }

    /// Fetch the delivered broadcast notifications.
    pub async fn get_delivered_notifications(
        &self,
    ) -> Result<Vec<GlobalNotification>, AppError> {
        let endpoint = "/notifications/delivered";
        let url = self.api_url(endpoint);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, endpoint).await
    }

    /// Fetch all personal notifications for a user.
    pub async fn get_user_notifications(
        &self,
        user_id: &str,
    ) -> Result<Vec<PersonalNotification>, AppError> {
        let endpoint = format!("/users/{}/notifications", user_id);
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// Mark one personal notification as read.
    pub async fn mark_notification_read(
        &self,
        user_id: &str,
        notification_id: Uuid,
    ) -> Result<PersonalNotification, AppError> {
        let endpoint = format!("/users/{}/notifications/{}/read", user_id, notification_id);
        let url = self.api_url(&endpoint);
        let response = self.client.patch(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// Mark all of a user's personal notifications as read.
    pub async fn mark_all_notifications_read(
        &self,
        user_id: &str,
    ) -> Result<MarkAllReadResponse, AppError> {
        let endpoint = format!("/users/{}/notifications/read-all", user_id);
        let url = self.api_url(&endpoint);
        let response = self.client.patch(&url).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// Delete one personal notification.
    pub async fn delete_notification(
        &self,
        user_id: &str,
        notification_id: Uuid,
    ) -> Result<(), AppError> {
        self.delete_empty(&format!(
            "/users/{}/notifications/{}",
            user_id, notification_id
        ))
        .await
    }

    /// Delete all of a user's personal notifications.
    pub async fn delete_all_notifications(&self, user_id: &str) -> Result<(), AppError> {
        self.delete_empty(&format!("/users/{}/notifications", user_id))
            .await
    }
}
