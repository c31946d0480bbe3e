use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::narrative::NarrativeRequest;

/// Abstraction over text-generation backends used for fund commentary.
///
/// The response is opaque pre-formatted text; the core never interprets it.
/// Implementations issue a single request per call, with no retry.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait NarrativeProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Generate commentary for the given prompt.
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, CoreError>;
}
