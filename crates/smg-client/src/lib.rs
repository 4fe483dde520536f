//! HTTP wrappers + endpoint fallback resolution for the SMG backend API.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use smg_core::{
    BlogPost, ChatMessage, ChatSession, ContactMessage, NotificationPreferences, Order,
    OrderStatus, Outcome, Review, ReviewSubmission, SeoRecord, Service, ServiceQuery,
    SupportTicket,
};
use thiserror::Error;
use tracing::{debug, warn};

pub const CRATE_NAME: &str = "smg-client";

/// Fixed user-facing message for request-sent-but-no-response failures.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error - check your connection";
/// Fixed message for requests that could not be constructed or sent at all.
pub const REQUEST_ERROR_MESSAGE: &str = "Request could not be sent";
/// Fallback when an error response carries no usable message field.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong - please try again";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Build(String),
    #[error("unexpected response shape: {0}")]
    Decode(String),
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    /// The string shown to form UIs. Never empty.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Network(message) | ApiError::Build(message) | ApiError::NotFound(message) => {
                message.clone()
            }
            ApiError::Decode(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub ws_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub auth_token: Option<String>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("SMG_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            ws_url: std::env::var("SMG_WS_URL")
                .unwrap_or_else(|_| "ws://localhost:5000".to_string()),
            timeout: std::env::var("SMG_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(20)),
            user_agent: std::env::var("SMG_USER_AGENT")
                .unwrap_or_else(|_| "smg-client/0.1".to_string()),
            auth_token: std::env::var("SMG_AUTH_TOKEN").ok(),
        }
    }

    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_url: "ws://localhost:5000".to_string(),
            timeout: Duration::from_secs(20),
            user_agent: "smg-client/0.1".to_string(),
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Tokens land in persisted storage wrapped in quote characters; strip them
/// before use.
pub fn sanitize_token(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// One URL + query-encoding option for the published-blog candidates.
#[derive(Debug, Clone, Copy)]
struct BlogCandidate {
    path: &'static str,
    category_param: &'static str,
}

const BLOG_LISTING_CANDIDATES: [BlogCandidate; 2] = [
    BlogCandidate {
        path: "/blog/published",
        category_param: "category",
    },
    BlogCandidate {
        path: "/blog/posts/published",
        category_param: "categoryId",
    },
];

const SERVICES_CANDIDATES: [&str; 2] = ["/services", "/service"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlogQuery {
    pub limit: Option<u32>,
    pub category: Option<String>,
}

/// Walk an ordered candidate list, returning the first success. A failed
/// candidate only falls through to the next one when `fall_through` accepts
/// the error; otherwise the error propagates immediately. On exhaustion the
/// last observed error propagates. Candidates run strictly sequentially.
pub async fn resolve_first<C, T, F, Fut>(
    candidates: &[C],
    mut attempt: F,
    fall_through: impl Fn(&ApiError) -> bool,
) -> Result<T, ApiError>
where
    C: Clone,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut last_err = None;
    for candidate in candidates {
        match attempt(candidate.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) if fall_through(&err) => {
                warn!(error = %err, "candidate endpoint failed, trying next");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| ApiError::Build(REQUEST_ERROR_MESSAGE.to_string())))
}

fn blog_fall_through(err: &ApiError) -> bool {
    matches!(err, ApiError::Status { status: 401 | 404, .. })
}

// Services only ever fell back on 404; a network failure propagates without
// trying the second candidate. Kept per-resource rather than unified.
fn services_fall_through(err: &ApiError) -> bool {
    matches!(err, ApiError::Status { status: 404, .. })
}

/// Accept a bare JSON array or an object carrying a `data` array. Anything
/// else is a decode error rather than a silently-empty result.
pub fn collection_from_body<T: DeserializeOwned>(body: JsonValue) -> Result<Vec<T>, ApiError> {
    let items = match body {
        JsonValue::Array(items) => items,
        JsonValue::Object(mut map) => match map.remove("data") {
            Some(JsonValue::Array(items)) => items,
            _ => {
                return Err(ApiError::Decode(
                    "expected an array or an object with a data array".to_string(),
                ))
            }
        },
        _ => {
            return Err(ApiError::Decode(
                "expected an array or an object with a data array".to_string(),
            ))
        }
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|err| ApiError::Decode(format!("record did not match schema: {err}")))
        })
        .collect()
}

/// Accept a bare object or an object carrying a `data` object.
pub fn record_from_body<T: DeserializeOwned>(body: JsonValue) -> Result<T, ApiError> {
    let payload = match body {
        JsonValue::Object(mut map) => match map.remove("data") {
            Some(data @ JsonValue::Object(_)) => data,
            None => JsonValue::Object(map),
            Some(_) => {
                return Err(ApiError::Decode(
                    "expected an object or an object with a data object".to_string(),
                ))
            }
        },
        _ => {
            return Err(ApiError::Decode(
                "expected an object or an object with a data object".to_string(),
            ))
        }
    };
    serde_json::from_value(payload)
        .map_err(|err| ApiError::Decode(format!("record did not match schema: {err}")))
}

fn error_message_from_body(body: Option<&JsonValue>) -> String {
    body.and_then(|body| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| body.get(*key).and_then(JsonValue::as_str))
    })
    .map(str::to_string)
    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

fn classify_send_error(err: reqwest::Error) -> ApiError {
    debug!(error = %err, "transport failure");
    if err.is_builder() {
        ApiError::Build(REQUEST_ERROR_MESSAGE.to_string())
    } else {
        ApiError::Network(NETWORK_ERROR_MESSAGE.to_string())
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("building reqwest client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.as_deref().map(sanitize_token),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue exactly one request and normalize the three failure kinds:
    /// non-2xx response, no-response transport failure, unsendable request.
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&JsonValue>,
        authed: bool,
    ) -> Result<JsonValue, ApiError> {
        let url = self.endpoint(path);
        debug!(%method, %url, "api request");

        let mut request = self.http.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if authed {
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|_| ApiError::Network(NETWORK_ERROR_MESSAGE.to_string()))?;
        let parsed: Option<JsonValue> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message_from_body(parsed.as_ref()),
            });
        }

        parsed.ok_or_else(|| ApiError::Decode(format!("response from {path} was not valid JSON")))
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<JsonValue, ApiError> {
        self.request_json(Method::GET, path, query, None, false).await
    }

    /// Form-facing send: absorbs every error kind into an `Outcome`, never
    /// lets a transport error escape to the caller.
    async fn form_send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authed: bool,
    ) -> Outcome {
        let payload = match body.map(serde_json::to_value).transpose() {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, path, "payload serialization failed");
                return Outcome::rejected(REQUEST_ERROR_MESSAGE);
            }
        };
        match self
            .request_json(method, path, &[], payload.as_ref(), authed)
            .await
        {
            Ok(body) => Outcome::from_body(body),
            Err(err) => Outcome::rejected(err.user_message()),
        }
    }

    // --- services ---

    /// List services, falling back from `/services` to `/service` on a 404
    /// from the primary. Any other failure propagates immediately.
    pub async fn list_services(&self, query: &ServiceQuery) -> Result<Vec<Service>, ApiError> {
        let pairs = query.query_pairs();
        resolve_first(
            &SERVICES_CANDIDATES,
            |path: &'static str| {
                let pairs = pairs.clone();
                async move {
                    let body = self.get_json(path, &pairs).await?;
                    collection_from_body(body)
                }
            },
            services_fall_through,
        )
        .await
    }

    // --- blog ---

    /// List published posts across the blog candidates. The second candidate
    /// encodes the category filter as `categoryId`.
    pub async fn list_published_posts(&self, query: &BlogQuery) -> Result<Vec<BlogPost>, ApiError> {
        resolve_first(
            &BLOG_LISTING_CANDIDATES,
            |candidate: BlogCandidate| self.fetch_posts_from(candidate, query),
            blog_fall_through,
        )
        .await
    }

    async fn fetch_posts_from(
        &self,
        candidate: BlogCandidate,
        query: &BlogQuery,
    ) -> Result<Vec<BlogPost>, ApiError> {
        let mut pairs = Vec::new();
        if let Some(limit) = query.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(category) = &query.category {
            pairs.push((candidate.category_param, category.clone()));
        }
        let body = self.get_json(candidate.path, &pairs).await?;
        collection_from_body(body)
    }

    /// There is no unauthenticated per-id endpoint; fetch the full published
    /// listing from each candidate and scan for the id client-side. A full
    /// scan with no match is a distinct not-found error, never an empty
    /// success.
    pub async fn get_post_by_id(&self, id: &str) -> Result<BlogPost, ApiError> {
        for candidate in &BLOG_LISTING_CANDIDATES {
            let posts = match self.fetch_posts_from(*candidate, &BlogQuery::default()).await {
                Ok(posts) => posts,
                Err(err) => {
                    warn!(path = candidate.path, error = %err, "blog candidate failed during id scan");
                    continue;
                }
            };
            if let Some(post) = posts.into_iter().find(|post| post.id == id) {
                return Ok(post);
            }
        }
        Err(ApiError::NotFound(format!(
            "blog post {id} not found in any published listing"
        )))
    }

    // --- reviews ---

    pub async fn list_public_reviews(&self) -> Result<Vec<Review>, ApiError> {
        let body = self.get_json("/leavereview/public", &[]).await?;
        collection_from_body(body)
    }

    pub async fn submit_review(&self, submission: &ReviewSubmission) -> Outcome {
        self.form_send(Method::POST, "/leavereview", Some(submission), false)
            .await
    }

    pub async fn mark_review_helpful(&self, review_id: &str) -> Outcome {
        let path = format!("/leavereview/{review_id}/helpful");
        self.form_send::<JsonValue>(Method::PUT, &path, None, false)
            .await
    }

    // --- contact + support ---

    pub async fn send_contact_message(&self, message: &ContactMessage) -> Outcome {
        self.form_send(Method::POST, "/contact", Some(message), false)
            .await
    }

    pub async fn submit_support_ticket(&self, ticket: &SupportTicket) -> Outcome {
        self.form_send(Method::POST, "/support", Some(ticket), false)
            .await
    }

    // --- notification preferences (Bearer) ---

    pub async fn notification_preferences(&self) -> Outcome {
        self.form_send::<JsonValue>(Method::GET, "/notification-preferences", None, true)
            .await
    }

    pub async fn update_notification_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Outcome {
        self.form_send(Method::PUT, "/notification-preferences", Some(preferences), true)
            .await
    }

    // --- orders (Bearer) ---

    pub async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
        let mut pairs = Vec::new();
        if let Some(status) = status {
            pairs.push(("status", order_status_param(status).to_string()));
        }
        let body = self
            .request_json(Method::GET, "/orders", &pairs, None, true)
            .await?;
        collection_from_body(body)
    }

    // --- chatbot ---

    pub async fn chatbot_initialize(&self) -> Result<ChatSession, ApiError> {
        let body = self
            .request_json(Method::POST, "/chatbot/initialize", &[], None, false)
            .await?;
        record_from_body(body)
    }

    pub async fn chatbot_send_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<ChatMessage, ApiError> {
        let payload = serde_json::json!({
            "conversationId": conversation_id,
            "content": content,
        });
        let body = self
            .request_json(Method::POST, "/chatbot/send-message", &[], Some(&payload), false)
            .await?;
        record_from_body(body)
    }

    pub async fn chatbot_history(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let path = format!("/chatbot/history/{conversation_id}");
        let body = self
            .request_json(Method::POST, &path, &[], None, false)
            .await?;
        collection_from_body(body)
    }

    // --- liveness probes (smoke-test only) ---

    pub async fn health(&self) -> Result<JsonValue, ApiError> {
        self.get_json("/health", &[]).await
    }

    pub async fn review_health(&self) -> Result<JsonValue, ApiError> {
        self.get_json("/leavereview/health", &[]).await
    }

    // --- SEO ---

    /// Fetch metadata for one logical page. A 200 with no payload is a miss,
    /// not an error.
    pub async fn page_seo(&self, page_id: &str) -> Result<Option<SeoRecord>, ApiError> {
        let path = format!("/seo/{page_id}");
        let body = self.get_json(&path, &[]).await?;
        match body {
            JsonValue::Null => Ok(None),
            JsonValue::Object(mut map) => match map.remove("data") {
                Some(JsonValue::Null) => Ok(None),
                Some(data @ JsonValue::Object(_)) => record_from_body(data).map(Some),
                None if map.is_empty() => Ok(None),
                None => record_from_body(JsonValue::Object(map)).map(Some),
                Some(_) => Err(ApiError::Decode(
                    "expected an object or an object with a data object".to_string(),
                )),
            },
            _ => Err(ApiError::Decode(
                "expected an object or an object with a data object".to_string(),
            )),
        }
    }
}

fn order_status_param(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Processing => "processing",
        OrderStatus::InProgress => "in_progress",
        OrderStatus::Completed => "completed",
        OrderStatus::Partial => "partial",
        OrderStatus::Cancelled => "cancelled",
        OrderStatus::Refunded => "refunded",
    }
}
