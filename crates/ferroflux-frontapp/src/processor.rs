//! Per-item isolation and result shaping.
//!
//! Each item walks `Start → ParamsResolved → RequestBuilt → Executed →
//! ResultEmitted`. A failure at any step short-circuits to `ResultEmitted`
//! with an error payload; nothing an item does can abort the batch.

use crate::config::FrontappConfig;
use crate::credentials::{CredentialProvider, EnvCredentials};
use crate::error::{DispatchError, DispatchResult};
use crate::params::{InputItem, ParameterSource, Params};
use crate::routes::Route;
use crate::transport::{HttpTransport, RetryPolicy, RetryingTransport, Transport};
use futures::StreamExt;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

/// The single output record for one input item.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    /// The unwrapped response body.
    Success(Value),
    /// The (resource, operation) pair has no route. Not counted as a failure.
    NotImplemented(String),
    Error(String),
}

impl ApiResult {
    pub fn is_error(&self) -> bool {
        matches!(self, ApiResult::Error(_))
    }

    /// The sink representation: the payload itself or `{"error": message}`.
    pub fn into_json(self) -> Value {
        match self {
            ApiResult::Success(value) => value,
            ApiResult::NotImplemented(message) | ApiResult::Error(message) => {
                json!({ "error": message })
            }
        }
    }
}

impl Serialize for ApiResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ApiResult::Success(value) => value.serialize(serializer),
            ApiResult::NotImplemented(message) | ApiResult::Error(message) => {
                json!({ "error": message }).serialize(serializer)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Start,
    ParamsResolved,
    RequestBuilt,
    Executed,
    ResultEmitted,
}

/// Drives input items through the route table and the retrying transport.
pub struct Dispatcher<T> {
    transport: RetryingTransport<T>,
    base_url: Url,
    concurrency: usize,
}

impl Dispatcher<HttpTransport> {
    pub fn from_config(
        config: &FrontappConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> DispatchResult<Self> {
        let transport = HttpTransport::new(config, credentials)?;
        Ok(Self::new(transport, config.base_url()?, config.retry.clone())
            .with_concurrency(config.concurrency))
    }

    /// Configuration and token both come from the environment.
    pub fn from_env() -> DispatchResult<Self> {
        let config = FrontappConfig::from_env()?;
        let credentials = Arc::new(EnvCredentials::new(config.token_env.clone()));
        Self::from_config(&config, credentials)
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, base_url: Url, policy: RetryPolicy) -> Self {
        Self {
            transport: RetryingTransport::new(transport, policy),
            base_url,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        self.transport.inner()
    }

    /// Processes one item. Never fails: errors become [`ApiResult::Error`].
    pub async fn process_item(&self, item: &dyn ParameterSource) -> ApiResult {
        let mut stage = ItemStage::Start;
        let result = match self.dispatch(item, &mut stage).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(stage = ?stage, error = %err, "Item failed");
                ApiResult::Error(err.to_string())
            }
        };
        stage = ItemStage::ResultEmitted;
        tracing::debug!(stage = ?stage, error = result.is_error(), "Item result emitted");
        result
    }

    async fn dispatch(
        &self,
        item: &dyn ParameterSource,
        stage: &mut ItemStage,
    ) -> DispatchResult<ApiResult> {
        let params = Params::new(item);
        let resource = params.required_str("resource")?;
        let operation = params.required_str("operation")?;
        *stage = ItemStage::ParamsResolved;

        let route = match Route::resolve(&resource, &operation) {
            Ok(route) => route,
            Err(unknown) => {
                tracing::warn!(%resource, %operation, "No route for item");
                return Ok(ApiResult::NotImplemented(unknown.to_string()));
            }
        };

        let request = route.build(&params, &self.base_url)?;
        *stage = ItemStage::RequestBuilt;
        tracing::debug!(%route, method = %request.method, path = %request.path(), "Request built");

        let response = self.transport.execute(&request).await?;
        *stage = ItemStage::Executed;
        tracing::info!(%route, status = response.status, "Item completed");

        Ok(ApiResult::Success(response.body))
    }

    /// Processes items one after another, in input order.
    #[tracing::instrument(
        skip(self, items),
        fields(items = items.len(), trace_id = %Uuid::new_v4())
    )]
    pub async fn process_batch(&self, items: &[InputItem]) -> Vec<ApiResult> {
        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let result = self
                .process_item(item)
                .instrument(tracing::info_span!("item", index))
                .await;
            results.push(result);
        }
        log_summary(&results);
        results
    }

    /// Up to `limit` items in flight; results still come back in input order.
    #[tracing::instrument(
        skip(self, items),
        fields(items = items.len(), trace_id = %Uuid::new_v4())
    )]
    pub async fn process_batch_concurrent(
        &self,
        items: &[InputItem],
        limit: usize,
    ) -> Vec<ApiResult> {
        let results: Vec<ApiResult> = futures::stream::iter(items.iter().enumerate().map(
            |(index, item)| {
                self.process_item(item)
                    .instrument(tracing::info_span!("item", index))
            },
        ))
        .buffered(limit.max(1))
        .collect()
        .await;
        log_summary(&results);
        results
    }

    /// Processes a batch with the configured concurrency and renders each
    /// result for the output sink.
    pub async fn run(&self, items: &[InputItem]) -> Vec<Value> {
        let results = if self.concurrency > 1 {
            self.process_batch_concurrent(items, self.concurrency).await
        } else {
            self.process_batch(items).await
        };
        results.into_iter().map(ApiResult::into_json).collect()
    }
}

fn log_summary(results: &[ApiResult]) {
    let errors = results.iter().filter(|r| r.is_error()).count();
    tracing::info!(total = results.len(), errors, "Batch complete");
}

impl From<DispatchError> for ApiResult {
    fn from(err: DispatchError) -> Self {
        ApiResult::Error(err.to_string())
    }
}
