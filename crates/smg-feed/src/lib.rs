//! Fetch-state holders for listing data: loading/error/data plus
//! parameter-change refetch semantics.

use std::sync::Arc;

use async_trait::async_trait;
use smg_client::{ApiClient, ApiError};
use smg_core::{Order, OrderStatus, Service, ServiceQuery};
use tracing::debug;

pub const CRATE_NAME: &str = "smg-feed";

/// Reactive surface exposed to rendering code. `error` is always a display
/// string, never a raw error value.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FeedState<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

#[async_trait]
pub trait ServiceSource: Send + Sync {
    async fn list_services(&self, query: &ServiceQuery) -> Result<Vec<Service>, ApiError>;
}

#[async_trait]
impl ServiceSource for ApiClient {
    async fn list_services(&self, query: &ServiceQuery) -> Result<Vec<Service>, ApiError> {
        ApiClient::list_services(self, query).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, ApiError>;
}

#[async_trait]
impl OrderSource for ApiClient {
    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>, ApiError> {
        ApiClient::list_orders(self, query.status).await
    }
}

/// Services listing feed. Declared inputs (type, category, quality, popular,
/// active) drive refetching: `sync_params` only fetches when they change,
/// `refetch` always re-runs the last fetch.
pub struct ServiceFeed {
    source: Arc<dyn ServiceSource>,
    params: Option<ServiceQuery>,
    state: FeedState<Service>,
}

impl ServiceFeed {
    pub fn new(source: Arc<dyn ServiceSource>) -> Self {
        Self {
            source,
            params: None,
            state: FeedState::default(),
        }
    }

    pub fn state(&self) -> &FeedState<Service> {
        &self.state
    }

    /// Returns true when a fetch actually ran. An identical-params call is a
    /// no-op so unrelated re-renders never hit the network.
    pub async fn sync_params(&mut self, params: ServiceQuery) -> bool {
        if self.params.as_ref() == Some(&params) {
            debug!("service feed params unchanged, skipping fetch");
            return false;
        }
        self.params = Some(params);
        self.run_fetch().await;
        true
    }

    pub async fn refetch(&mut self) {
        self.run_fetch().await;
    }

    async fn run_fetch(&mut self) {
        let params = self.params.clone().unwrap_or_default();
        self.state.loading = true;
        self.state.error = None;
        match self.source.list_services(&params).await {
            Ok(data) => {
                self.state.data = data;
            }
            Err(err) => {
                // never leave stale rows behind a failed fetch
                self.state.data = Vec::new();
                self.state.error = Some(err.user_message());
            }
        }
        self.state.loading = false;
    }
}

/// Account orders feed with the same refetch semantics as `ServiceFeed`.
pub struct OrderFeed {
    source: Arc<dyn OrderSource>,
    params: Option<OrderQuery>,
    state: FeedState<Order>,
}

impl OrderFeed {
    pub fn new(source: Arc<dyn OrderSource>) -> Self {
        Self {
            source,
            params: None,
            state: FeedState::default(),
        }
    }

    pub fn state(&self) -> &FeedState<Order> {
        &self.state
    }

    pub async fn sync_params(&mut self, params: OrderQuery) -> bool {
        if self.params.as_ref() == Some(&params) {
            debug!("order feed params unchanged, skipping fetch");
            return false;
        }
        self.params = Some(params);
        self.run_fetch().await;
        true
    }

    pub async fn refetch(&mut self) {
        self.run_fetch().await;
    }

    async fn run_fetch(&mut self) {
        let params = self.params.clone().unwrap_or_default();
        self.state.loading = true;
        self.state.error = None;
        match self.source.list_orders(&params).await {
            Ok(data) => {
                self.state.data = data;
            }
            Err(err) => {
                self.state.data = Vec::new();
                self.state.error = Some(err.user_message());
            }
        }
        self.state.loading = false;
    }
}
