//! Generative model contract.

use anyhow::Result;
use async_trait::async_trait;

/// A text generator configured to answer in JSON.
///
/// Implementations ask their backend for machine-readable output
/// (`responseMimeType`, `response_format`, `format: "json"`), but the
/// returned text is still untrusted: the scorer parses and validates it.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-2.5-pro"`).
    fn model_name(&self) -> &str;
    /// Generate a completion for `prompt` in JSON mode.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
