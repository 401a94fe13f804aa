//! API client for the DevOptics REST API.
//!
//! `ApiClient` is the one transport every feature uses. Login and signup go
//! out undecorated; everything else passes through the [`AuthInterceptor`].

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{AuthAction, AuthError, Credential};
use crate::models::{ClusterHealth, NewUser, Role, UserProfile};

use super::error::ErrorBody;
use super::interceptor::AuthInterceptor;
use super::ApiError;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: Vec<UserProfile>,
}

#[derive(Debug, Serialize)]
struct RoleUpdate<'a> {
    role: &'a Role,
}

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    message: String,
}

/// Client for the DevOptics API.
/// Clone is cheap - reqwest::Client and the interceptor share their state.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    interceptor: AuthInterceptor,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, interceptor: AuthInterceptor) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            interceptor,
        })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ===== Authentication =====

    /// Exchange email and password for a credential. Does not touch the store.
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential, AuthError> {
        let body = LoginRequest { email, password };
        self.authenticate(AuthAction::SignIn, &["auth", "login"], &body)
            .await
    }

    /// Create an account and return its credential. Does not touch the store.
    pub async fn signup(&self, user: &NewUser) -> Result<Credential, AuthError> {
        self.authenticate(AuthAction::SignUp, &["auth", "signup"], user)
            .await
    }

    async fn authenticate<B: Serialize>(
        &self,
        action: AuthAction,
        segments: &[&str],
        body: &B,
    ) -> Result<Credential, AuthError> {
        let url = self.endpoint(segments);

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Authentication request failed");
                AuthError::transport(action)
            })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        let text = response.text().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to read authentication response");
            AuthError::transport(action)
        })?;

        if !status.is_success() {
            debug!(url = %url, status = %status, "Authentication rejected");
            let message = if is_json {
                serde_json::from_str::<ErrorBody>(&text).ok().and_then(|b| b.error)
            } else {
                Some(text)
            };
            let message = message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| action.fallback_message().to_string());
            return Err(AuthError::Rejected(message));
        }

        let auth: AuthResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(url = %url, error = %e, "Malformed authentication response");
            AuthError::transport(action)
        })?;
        if auth.token.is_empty() {
            warn!(url = %url, "Authentication response carried an empty token");
            return Err(AuthError::transport(action));
        }

        Ok(Credential {
            token: auth.token,
            user: auth.user,
        })
    }

    // ===== Authenticated requests =====

    /// Send a request decorated with the stored credential and check its status.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let (request, sent_token) = self.interceptor.decorate(request);
        let response = request.send().await?;
        self.interceptor
            .inspect(response.status(), sent_token.as_deref());
        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(url = %url, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("{} from {}", e, url))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments);
        let response = self.send(self.client.get(url.clone())).await?;
        Self::read_json(response, &url).await
    }

    /// Send a JSON body and ignore whatever the server answers on success.
    pub async fn send_json<B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(segments);
        self.send(self.client.request(method, url).json(body))
            .await?;
        Ok(())
    }

    // ===== Admin =====

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        let response: UsersResponse = self.get(&["admin", "users"]).await?;
        Ok(response.users)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        self.send_json(Method::POST, &["admin", "users"], user)
            .await
    }

    pub async fn update_user_role(&self, user_id: &str, role: &Role) -> Result<(), ApiError> {
        self.send_json(Method::PUT, &["admin", "users", user_id, "role"], &RoleUpdate { role })
            .await
    }

    pub async fn admin_overview(&self) -> Result<String, ApiError> {
        let response: OverviewResponse = self.get(&["admin", "overview"]).await?;
        Ok(response.message)
    }

    // ===== Kubernetes monitoring =====

    pub async fn cluster_health(&self, cluster: &str) -> Result<ClusterHealth, ApiError> {
        self.get(&["k8s", "health", cluster]).await
    }
}
