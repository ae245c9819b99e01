//! Transport implementations: the only network boundary

pub mod openai;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::request::{GuidanceRequest, RawCompletion};

// Re-export for convenience
pub use openai::HttpTransport;

/// Sends one composed request and returns the raw completion.
/// Implementations do not retry and do not format.
#[async_trait]
pub trait Transport: Send + Sync
{   async fn send(
      &self
    , request: &GuidanceRequest
    , config: &ProviderConfig
    ) -> Result<RawCompletion, Error>;
}
