//! SEO metadata cache + resolution for the marketing pages.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use smg_client::{ApiClient, ApiError};
use smg_core::{BlogPost, SeoRecord};
use tracing::warn;

pub const CRATE_NAME: &str = "smg-seo";

/// Logical page identifiers with a route mapping. Anything else resolves to
/// the static default record without touching the network.
pub const KNOWN_PAGE_IDS: [&str; 9] = [
    "home",
    "services",
    "blog",
    "contact",
    "faq",
    "reviews",
    "instagram",
    "tiktok",
    "youtube",
];

/// Seam over the metadata fetch so resolution logic is testable without a
/// network.
#[async_trait]
pub trait SeoSource: Send + Sync {
    async fn fetch_page_seo(&self, page_id: &str) -> Result<Option<SeoRecord>, ApiError>;
}

#[async_trait]
impl SeoSource for ApiClient {
    async fn fetch_page_seo(&self, page_id: &str) -> Result<Option<SeoRecord>, ApiError> {
        self.page_seo(page_id).await
    }
}

/// Session-lifetime page-id to record map. No TTL, no eviction; concurrent
/// population of the same key is last-write-wins.
#[derive(Debug, Default)]
pub struct SeoCache {
    entries: Mutex<HashMap<String, SeoRecord>>,
}

impl SeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page_id: &str) -> Option<SeoRecord> {
        self.entries
            .lock()
            .expect("seo cache lock poisoned")
            .get(page_id)
            .cloned()
    }

    pub fn insert(&self, page_id: impl Into<String>, record: SeoRecord) {
        self.entries
            .lock()
            .expect("seo cache lock poisoned")
            .insert(page_id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("seo cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where a page's metadata came from. Every variant carries a complete
/// record; the UI is never left without title/description.
#[derive(Debug, Clone, PartialEq)]
pub enum SeoResolution {
    FromCache(SeoRecord),
    FromNetwork(SeoRecord),
    Fallback(SeoRecord),
}

impl SeoResolution {
    pub fn record(&self) -> &SeoRecord {
        match self {
            SeoResolution::FromCache(record)
            | SeoResolution::FromNetwork(record)
            | SeoResolution::Fallback(record) => record,
        }
    }

    fn with_record(&self, record: SeoRecord) -> SeoResolution {
        match self {
            SeoResolution::FromCache(_) => SeoResolution::FromCache(record),
            SeoResolution::FromNetwork(_) => SeoResolution::FromNetwork(record),
            SeoResolution::Fallback(_) => SeoResolution::Fallback(record),
        }
    }
}

pub fn default_seo_record() -> SeoRecord {
    SeoRecord {
        title: "SMG - Real Followers, Likes & Views".to_string(),
        description:
            "Grow your Instagram, TikTok and YouTube presence with fast, reliable delivery."
                .to_string(),
        keywords: vec![
            "followers".to_string(),
            "likes".to_string(),
            "views".to_string(),
            "social media growth".to_string(),
        ],
        og_title: Some("SMG - Real Followers, Likes & Views".to_string()),
        og_description: Some(
            "Grow your Instagram, TikTok and YouTube presence with fast, reliable delivery."
                .to_string(),
        ),
        og_image: None,
        canonical_url: None,
        structured_data: None,
    }
}

/// Cache-then-fetch-then-default resolution. The cache is injected rather
/// than module-global so callers and tests own its lifetime.
pub struct SeoProvider {
    source: Arc<dyn SeoSource>,
    cache: Arc<SeoCache>,
    default_record: SeoRecord,
}

impl SeoProvider {
    pub fn new(source: Arc<dyn SeoSource>, cache: Arc<SeoCache>) -> Self {
        Self {
            source,
            cache,
            default_record: default_seo_record(),
        }
    }

    pub fn is_known_page(page_id: &str) -> bool {
        KNOWN_PAGE_IDS.contains(&page_id)
    }

    /// Resolution order: known page id, cache hit, network fetch, static
    /// default. A cache hit issues zero network calls.
    pub async fn resolve(&self, page_id: &str) -> SeoResolution {
        if !Self::is_known_page(page_id) {
            return SeoResolution::Fallback(self.default_record.clone());
        }
        if let Some(hit) = self.cache.get(page_id) {
            return SeoResolution::FromCache(hit);
        }
        match self.source.fetch_page_seo(page_id).await {
            Ok(Some(record)) => {
                self.cache.insert(page_id, record.clone());
                SeoResolution::FromNetwork(record)
            }
            Ok(None) => SeoResolution::Fallback(self.default_record.clone()),
            Err(err) => {
                warn!(page_id, error = %err, "seo fetch failed, using default record");
                SeoResolution::Fallback(self.default_record.clone())
            }
        }
    }

    /// Per-post metadata composed from the `blog` base record and the post's
    /// own fields. No extra network round-trip beyond base resolution.
    pub async fn resolve_post(&self, post: &BlogPost) -> SeoResolution {
        let base = self.resolve("blog").await;
        let record = compose_post_seo(base.record(), post);
        base.with_record(record)
    }
}

/// Derive a post's SEO record: title, excerpt-or-truncated-content
/// description, tags as keywords, and schema.org BlogPosting structured
/// data.
pub fn compose_post_seo(base: &SeoRecord, post: &BlogPost) -> SeoRecord {
    let mut description = post.summary(160);
    if description.is_empty() {
        description = base.description.clone();
    }

    let mut keywords = base.keywords.clone();
    for tag in &post.tags {
        if !keywords.iter().any(|existing| existing == tag) {
            keywords.push(tag.clone());
        }
    }

    let mut posting = serde_json::Map::new();
    posting.insert("@context".to_string(), json!("https://schema.org"));
    posting.insert("@type".to_string(), json!("BlogPosting"));
    posting.insert("headline".to_string(), json!(post.title));
    posting.insert("description".to_string(), json!(description));
    if let Some(author) = &post.author {
        posting.insert(
            "author".to_string(),
            json!({"@type": "Person", "name": author}),
        );
    }
    if let Some(published_at) = post.published_at {
        posting.insert("datePublished".to_string(), json!(published_at.to_rfc3339()));
    }
    if !post.tags.is_empty() {
        posting.insert("keywords".to_string(), json!(post.tags.join(", ")));
    }

    let canonical_url = match (&base.canonical_url, &post.slug) {
        (Some(base_url), Some(slug)) => {
            Some(format!("{}/{}", base_url.trim_end_matches('/'), slug))
        }
        _ => base.canonical_url.clone(),
    };

    SeoRecord {
        title: format!("{} | {}", post.title, base.title),
        description: description.clone(),
        keywords,
        og_title: Some(post.title.clone()),
        og_description: Some(description),
        og_image: base.og_image.clone(),
        canonical_url,
        structured_data: Some(JsonValue::Object(posting)),
    }
}
