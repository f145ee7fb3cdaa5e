//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, Span};
use ttkia_config::{LogHandle, LogLevel, ResolvedProfile};
use url::Url;

use crate::api::{AuthApi, CatalogApi, ChatApi, CommandsApi, ConversationsApi, FilesApi, endpoints};
use crate::error::{Error, Result, truncate};
use crate::retry::{RetryPolicy, with_retry};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default identity recorded on the client span.
const DEFAULT_LOGGER_NAME: &str = "ttkia_sdk";

/// Characters of a response body shown in debug previews.
const BODY_PREVIEW_CHARS: usize = 200;

/// TtkIA API client.
///
/// Cheap to clone; clones share the connection pool and log level.
///
/// # Example
///
/// ```no_run
/// use ttkia_client::{QueryRequest, TtkiaClient};
///
/// # async fn example() -> ttkia_client::Result<()> {
/// let client = TtkiaClient::builder()
///     .base_url("https://ttkia.example.com/api")
///     .auth_token("app-token")
///     .connect()
///     .await?;
///
/// let workspace = client.conversations().create().await?;
/// let mut request = QueryRequest::new("¿Qué es OSPF?");
/// request.conversation_id = workspace.conversation_id;
/// let answer = client.chat().query(request).await?;
/// println!("{}", answer.response_text);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TtkiaClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests (always ends with `/`).
    pub(crate) base_url: Url,
    /// Request timeout.
    pub(crate) timeout: Duration,
    /// Retry policy for idempotent reads.
    pub(crate) retry: RetryPolicy,
    /// Whether a bearer token was configured.
    pub(crate) has_token: bool,
    /// Span every request runs in.
    span: Span,
    /// Client-side verbosity; gates body previews.
    log_level: RwLock<LogLevel>,
    /// Subscriber handle to forward level changes to.
    log_handle: Option<LogHandle>,
}

impl TtkiaClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Retry policy applied to idempotent reads.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry
    }

    /// Whether a bearer token was configured.
    pub fn has_token(&self) -> bool {
        self.inner.has_token
    }

    /// Current client log level.
    pub fn log_level(&self) -> LogLevel {
        *self.inner.log_level.read()
    }

    /// Change the log level.
    ///
    /// Also reloads the subscriber filter when the client was built with a
    /// [`LogHandle`].
    pub fn set_log_level(&self, level: LogLevel) {
        *self.inner.log_level.write() = level;
        if let Some(handle) = &self.inner.log_handle
            && let Err(e) = handle.set_level(level)
        {
            tracing::warn!(error = %e, "Failed to reload log filter");
        }
        tracing::info!(%level, "Log level changed");
    }

    /// Call the session bootstrap endpoint.
    ///
    /// Failures are logged and swallowed; later calls fail on their own if
    /// the session is unusable.
    pub async fn initialize_session(&self) -> Option<serde_json::Value> {
        match self.post_empty::<serde_json::Value>(endpoints::ENV).await {
            Ok(value) => {
                tracing::info!("Session initialised");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not initialise session");
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the authentication API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the conversations (workspaces) API.
    pub fn conversations(&self) -> ConversationsApi {
        ConversationsApi::new(self.clone())
    }

    /// Access sources, prompts and styles.
    pub fn catalog(&self) -> CatalogApi {
        CatalogApi::new(self.clone())
    }

    /// Access the file upload API.
    pub fn files(&self) -> FilesApi {
        FilesApi::new(self.clone())
    }

    /// Access the query API.
    pub fn chat(&self) -> ChatApi {
        ChatApi::new(self.clone())
    }

    /// Access the quick-commands API.
    pub fn commands(&self) -> CommandsApi {
        CommandsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path. Absolute URLs pass through unchanged.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(Error::from);
        }
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::from)
    }

    /// GET an idempotent resource, retrying transient failures.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        with_retry(self.inner.retry, path, || {
            self.send_json(Method::GET, path, None)
        })
        .instrument(self.inner.span.clone())
        .await
    }

    /// POST to a read-only endpoint, retrying transient failures.
    pub(crate) async fn post_read<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        with_retry(self.inner.retry, path, || {
            self.send_json(Method::POST, path, Some(&body))
        })
        .instrument(self.inner.span.clone())
        .await
    }

    /// POST with no body to a read-only endpoint, retrying transient failures.
    pub(crate) async fn post_read_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        with_retry(self.inner.retry, path, || {
            self.send_json(Method::POST, path, None)
        })
        .instrument(self.inner.span.clone())
        .await
    }

    /// POST to a mutating endpoint. Attempted exactly once.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.send_json(Method::POST, path, Some(&body))
            .instrument(self.inner.span.clone())
            .await
    }

    /// POST with no body to a mutating endpoint. Attempted exactly once.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(Method::POST, path, None)
            .instrument(self.inner.span.clone())
            .await
    }

    /// POST a multipart form. Attempted exactly once.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        async {
            let url = self.url(path)?;
            tracing::debug!(method = "POST", %url, "Sending multipart request");
            let response = self
                .inner
                .http
                .post(url)
                .multipart(form)
                .timeout(self.inner.timeout)
                .send()
                .await?;
            self.handle_response(&Method::POST, path, response).await
        }
        .instrument(self.inner.span.clone())
        .await
    }

    /// Send one request with an optional JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let url = self.url(path)?;
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self
            .inner
            .http
            .request(method.clone(), url)
            .timeout(self.inner.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(%method, path, error = %e, "Request failed");
                return Err(e.into());
            }
        };
        self.handle_response(&method, path, response).await
    }

    /// Check the status and decode the body.
    ///
    /// An empty success body decodes as JSON `null`.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%method, path, status = status.as_u16(), "Response received");

        if self.log_level().is_debug_enabled() {
            tracing::debug!(path, body = %truncate(&body, BODY_PREVIEW_CHARS), "Response body");
        }

        if !status.is_success() {
            let err = Error::from_response(status.as_u16(), &body);
            tracing::error!(%method, path, status = status.as_u16(), error = %err, "Request failed");
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Builder for creating a [`TtkiaClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    auth_token: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: Option<String>,
    log_level: LogLevel,
    logger_name: String,
    span: Option<Span>,
    log_handle: Option<LogHandle>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            user_agent: None,
            log_level: LogLevel::Info,
            logger_name: DEFAULT_LOGGER_NAME.to_string(),
            span: None,
            log_handle: None,
        }
    }

    /// Start from resolved profile settings.
    pub fn from_profile(profile: &ResolvedProfile) -> Self {
        let mut builder = Self::new()
            .base_url(profile.base_url.clone())
            .timeout(profile.timeout)
            .max_retries(profile.max_retries)
            .log_level(profile.log_level)
            .logger_name(profile.logger_name.clone());
        if let Some(token) = &profile.token {
            builder = builder.auth_token(token.clone());
        }
        builder
    }

    /// Set the base URL for the server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget for idempotent reads.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Set the initial retry backoff.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry.initial_backoff = backoff;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the initial log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the identity recorded on the default span.
    pub fn logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    /// Run every request inside `span` instead of the default one.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Forward [`TtkiaClient::set_log_level`] to an installed subscriber.
    pub fn log_handle(mut self, handle: LogHandle) -> Self {
        self.log_handle = Some(handle);
        self
    }

    /// Build the client without contacting the server.
    pub fn build(self) -> Result<TtkiaClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let token = self.auth_token.filter(|t| !t.is_empty());

        let mut headers = HeaderMap::new();
        if let Some(token) = &token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Config("Invalid auth token".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("ttkia-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        let span = self.span.unwrap_or_else(|| {
            tracing::info_span!(
                "ttkia_client",
                logger = %self.logger_name,
                base_url = %base_url
            )
        });

        span.in_scope(|| tracing::info!(base_url = %base_url, "TtkIA client initialised"));

        Ok(TtkiaClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                retry: self.retry,
                has_token: token.is_some(),
                span,
                log_level: RwLock::new(self.log_level),
                log_handle: self.log_handle,
            }),
        })
    }

    /// Build the client and run the best-effort session bootstrap.
    pub async fn connect(self) -> Result<TtkiaClient> {
        let client = self.build()?;
        client.initialize_session().await;
        Ok(client)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
