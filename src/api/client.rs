use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::error::{ApiError, decode_error_body};
use super::redirect::AuthRedirect;
use crate::model::{
    AuthResponse, Client, ClientPayload, Health, LoginRequest, Project, ProjectPayload,
    ProjectStatus, RegisterRequest, ServerConfig, StatusUpdate, User,
};

/// How a 401 response is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthPolicy {
    /// Session rejected: send the user to sign-in and stop.
    Redirect,
    /// Credentials rejected (login/register): surface as an ordinary error.
    Surface,
}

/// Credentialed client for the CRM REST API.
///
/// Every request carries the session cookie from the shared jar. A 401 on any
/// session-bound endpoint triggers the [`AuthRedirect`] hook exactly once and
/// yields [`ApiError::AuthExpired`]. Clones share the connection pool and
/// the cookie jar.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
    redirect: Arc<dyn AuthRedirect>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &"***")
            .finish()
    }
}

impl ApiClient {
    /// Build a client for the given server settings.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(server: &ServerConfig, redirect: Arc<dyn AuthRedirect>) -> Result<Self, ApiError> {
        let trimmed = server.base_url.trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| ApiError::ClientInit(format!("invalid base url '{}': {}", trimmed, e)))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(server.timeout_secs))
            .build()
            .map_err(|e| ApiError::ClientInit(e.to_string()))?;
        Ok(ApiClient {
            http,
            base_url,
            jar,
            redirect,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Load a previously saved `Cookie` header value into the jar.
    pub fn restore_session(&self, cookie_header: &str) {
        for pair in cookie_header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar
                .add_cookie_str(&format!("{}; Path=/", pair), &self.base_url);
        }
    }

    /// The `Cookie` header value the next request would send, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .filter(|s| !s.is_empty())
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    /// `GET /clients`, optionally narrowed by the server-side search.
    pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, ApiError> {
        let mut request = self.request(Method::GET, "/clients");
        if let Some(q) = search.map(str::trim).filter(|q| !q.is_empty()) {
            request = request.query(&[("search", q)]);
        }
        self.json(request, AuthPolicy::Redirect, "client list").await
    }

    pub async fn get_client(&self, id: &str) -> Result<Client, ApiError> {
        let request = self.request(Method::GET, &format!("/clients/{}", id));
        self.json(request, AuthPolicy::Redirect, "client").await
    }

    pub async fn create_client(&self, payload: &ClientPayload) -> Result<Client, ApiError> {
        let request = self.request(Method::POST, "/clients").json(payload);
        self.json(request, AuthPolicy::Redirect, "created client").await
    }

    pub async fn update_client(&self, id: &str, payload: &ClientPayload) -> Result<Client, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/clients/{}", id))
            .json(payload);
        self.json(request, AuthPolicy::Redirect, "updated client").await
    }

    pub async fn delete_client(&self, id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("/clients/{}", id));
        self.execute(request, AuthPolicy::Redirect).await.map(drop)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        let request = self.request(Method::GET, "/projects");
        self.json(request, AuthPolicy::Redirect, "project list").await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, ApiError> {
        let request = self.request(Method::GET, &format!("/projects/{}", id));
        self.json(request, AuthPolicy::Redirect, "project").await
    }

    pub async fn create_project(&self, payload: &ProjectPayload) -> Result<Project, ApiError> {
        let request = self.request(Method::POST, "/projects").json(payload);
        self.json(request, AuthPolicy::Redirect, "created project").await
    }

    pub async fn update_project(
        &self,
        id: &str,
        payload: &ProjectPayload,
    ) -> Result<Project, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/projects/{}", id))
            .json(payload);
        self.json(request, AuthPolicy::Redirect, "updated project").await
    }

    /// `PATCH /projects/{id}/status`
    pub async fn update_project_status(
        &self,
        id: &str,
        status: ProjectStatus,
    ) -> Result<Project, ApiError> {
        let request = self
            .request(Method::PATCH, &format!("/projects/{}/status", id))
            .json(&StatusUpdate { status });
        self.json(request, AuthPolicy::Redirect, "project status").await
    }

    pub async fn delete_project(&self, id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("/projects/{}", id));
        self.execute(request, AuthPolicy::Redirect).await.map(drop)
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Sign in. On success the session cookie is stored in the jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = self
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest { email, password });
        self.json(request, AuthPolicy::Surface, "login")
            .await
            .map_err(|e| match e {
                ApiError::Status { status, .. } => ApiError::Request {
                    status,
                    message: "Invalid email or password".to_string(),
                },
                other => other,
            })
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<User, ApiError> {
        let request = self
            .request(Method::POST, "/auth/register")
            .json(&RegisterRequest {
                email,
                password,
                full_name,
            });
        self.json(request, AuthPolicy::Surface, "registration").await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = self.request(Method::POST, "/auth/logout");
        self.execute(request, AuthPolicy::Surface).await.map(drop)
    }

    /// `GET /auth/me`
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let request = self.request(Method::GET, "/auth/me");
        self.json(request, AuthPolicy::Redirect, "current user").await
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        let request = self.request(Method::GET, "/health/");
        self.json(request, AuthPolicy::Surface, "health").await
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        tracing::debug!(%method, %url, "api request");
        self.http.request(method, url)
    }

    /// Send a request and apply the status policy shared by every endpoint.
    async fn execute(&self, request: RequestBuilder, policy: AuthPolicy) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && policy == AuthPolicy::Redirect {
            tracing::warn!(url = %response.url(), "session rejected, redirecting to sign-in");
            self.redirect.redirect_to_login();
            return Err(ApiError::AuthExpired);
        }
        let reason = status.canonical_reason().unwrap_or("");
        let body = response.text().await.unwrap_or_default();
        Err(decode_error_body(status.as_u16(), reason, &body))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        policy: AuthPolicy,
        context: &str,
    ) -> Result<T, ApiError> {
        let response = self.execute(request, policy).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ApiError::MalformedResponse {
            context: context.to_string(),
            source,
        })
    }
}
