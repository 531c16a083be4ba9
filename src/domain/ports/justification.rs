use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::JustificationRequest;

/// Produces the explanatory text delivered with a learning path
///
/// The planner treats the text as opaque. Any failure fails the protocol step
/// that requested it.
#[async_trait]
pub trait JustificationProvider: Send + Sync {
    /// Provider name for logs (e.g. "llm", "template")
    fn name(&self) -> &'static str;

    /// Generate the justification for a finished analysis
    ///
    /// # Errors
    /// Returns `DomainError::JustificationFailed` if no text could be produced
    async fn justify(&self, request: &JustificationRequest) -> DomainResult<String>;
}
