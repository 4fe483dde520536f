//! Core domain model for the SMG backend client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const CRATE_NAME: &str = "smg-core";

/// Uniform envelope returned by the form-facing wrappers (review, contact,
/// support, notification preferences). These wrappers never surface a raw
/// transport error; every failure kind collapses into `success: false` plus
/// a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl Outcome {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Wrap a backend body, passing its own `success`/`message` members
    /// through when present.
    pub fn from_body(body: JsonValue) -> Self {
        let success = body
            .get("success")
            .and_then(JsonValue::as_bool)
            .unwrap_or(true);
        let message = body
            .get("message")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            success,
            message,
            data: Some(body),
        }
    }

    /// Decode the carried backend body into a typed record, when one exists.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        let body = self.data.as_ref()?;
        let payload = body.get("data").unwrap_or(body);
        serde_json::from_value(payload.clone()).ok()
    }
}

/// Query parameters accepted by the services listing. Field identity drives
/// the feed layer's refetch decision, hence the `PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceQuery {
    pub service_type: Option<String>,
    pub category: Option<String>,
    pub quality: Option<String>,
    pub popular: Option<bool>,
    pub active: Option<bool>,
}

impl ServiceQuery {
    /// Wire encoding shared by every services candidate endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(service_type) = &self.service_type {
            pairs.push(("type", service_type.clone()));
        }
        if let Some(quality) = &self.quality {
            pairs.push(("quality", quality.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(popular) = self.popular {
            pairs.push(("popular", popular.to_string()));
        }
        if let Some(active) = self.active {
            pairs.push(("active", active.to_string()));
        }
        pairs
    }
}

/// Backend-defined service shape, passed through without client-side
/// invariants beyond the enum-valued flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(rename = "type", default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub min_quantity: Option<u32>,
    #[serde(default)]
    pub max_quantity: Option<u32>,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    InProgress,
    Completed,
    Partial,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub service_id: String,
    pub status: OrderStatus,
    pub quantity: u32,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    /// Excerpt when present, otherwise the content truncated at a char
    /// boundary. Used for per-post SEO descriptions.
    pub fn summary(&self, max_chars: usize) -> String {
        if let Some(excerpt) = &self.excerpt {
            if !excerpt.trim().is_empty() {
                return excerpt.trim().to_string();
            }
        }
        let content = self.content.as_deref().unwrap_or_default().trim();
        if content.chars().count() <= max_chars {
            return content.to_string();
        }
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated.trim_end())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub service_used: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub review_title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub helpful_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Review form payload. Caller-side field names differ from the wire names
/// the backend expects; the serde renames own that mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSubmission {
    #[serde(rename = "username")]
    pub name: String,
    pub email: String,
    #[serde(rename = "serviceUsed")]
    pub service: String,
    pub rating: u8,
    #[serde(rename = "reviewTitle")]
    pub title: String,
    #[serde(rename = "content")]
    pub review: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessage {
    #[serde(rename = "username")]
    pub name: String,
    pub email: String,
    pub subject: String,
    #[serde(rename = "content")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportTicket {
    #[serde(rename = "username")]
    pub name: String,
    pub email: String,
    #[serde(rename = "ordernumber")]
    pub order_number: String,
    pub category: String,
    pub subject: String,
    #[serde(rename = "content")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default)]
    pub order_updates: bool,
    #[serde(default)]
    pub promotions: bool,
    #[serde(default)]
    pub newsletter: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub conversation_id: String,
    #[serde(default)]
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub sender: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Metadata bundle for one logical page. Immutable once cached for the
/// lifetime of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoRecord {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub og_title: Option<String>,
    #[serde(default)]
    pub og_description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub structured_data: Option<JsonValue>,
}
