//! Handler adapters over async closures.

use crate::registry::ports::{HandlerResult, PromptHandler, ResourceHandler, ToolHandler};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

struct ClosureHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for ClosureHandler<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn execute(&self, args: Map<String, Value>) -> HandlerResult {
        (self.0)(args).await
    }
}

struct ReadClosure<F>(F);

#[async_trait]
impl<F, Fut> ResourceHandler for ReadClosure<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn read(&self) -> HandlerResult {
        (self.0)().await
    }
}

struct PromptClosure<F>(F);

#[async_trait]
impl<F, Fut> PromptHandler for PromptClosure<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn get(&self, args: Map<String, Value>) -> HandlerResult {
        (self.0)(args).await
    }
}

/// Wraps an async closure as a tool handler.
pub fn tool_fn<F, Fut>(handler: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(ClosureHandler(handler))
}

/// Wraps an async closure as a resource read handler.
pub fn resource_fn<F, Fut>(handler: F) -> Arc<dyn ResourceHandler>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(ReadClosure(handler))
}

/// Wraps an async closure as a prompt get handler.
pub fn prompt_fn<F, Fut>(handler: F) -> Arc<dyn PromptHandler>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(PromptClosure(handler))
}
