//! External capability seams.
//!
//! The pipeline consumes the generation and messaging services as opaque
//! "send a request, get text or a failure" capabilities behind these traits.
//! Concrete transports live in the submodules; tests substitute mocks.
//! Neither trait retries — a timeout or error means "capability
//! unavailable" and the caller takes its fallback/abort path.

pub mod line;
pub mod openai;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use line::LinePush;
pub use openai::OpenAiProvider;

/// External text-generation capability.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text from a system instruction and a user instruction.
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}

/// External push-messaging capability.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Push one text message to the given messaging identity.
    async fn push(&self, to: &str, text: &str) -> Result<(), ProviderError>;
}
