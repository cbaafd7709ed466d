//! Shared application state for the pipeline core.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::budget::BudgetGovernor;
use crate::config::Config;
use crate::db::IntakeDb;
use crate::providers::{GenerationProvider, LinePush, MessagingProvider, OpenAiProvider};

/// Everything a request handler needs, owned once and shared via `Arc`.
///
/// The DB sits behind a non-poisoning mutex and is only locked for single
/// statements (never across an await). Per-intake send locks serialize
/// concurrent correlation events for the same record; cross-intake work
/// shares nothing beyond the DB handle.
pub struct AppState {
    pub config: Config,
    pub db: Mutex<IntakeDb>,
    pub budget: BudgetGovernor,
    generation: Option<Arc<dyn GenerationProvider>>,
    messaging: Option<Arc<dyn MessagingProvider>>,
    send_locks: DashMap<i64, Arc<tokio::sync::Mutex<()>>>,
}

impl AppState {
    /// Wire up state from config: providers are built only when their
    /// credential is present, so an unconfigured deployment degrades to
    /// fallback text and no sends instead of erroring.
    pub fn new(config: Config, db: IntakeDb) -> Self {
        let generation = OpenAiProvider::new(config.openai_api_key.as_deref())
            .map(|p| Arc::new(p) as Arc<dyn GenerationProvider>);
        let messaging = LinePush::new(config.line_channel_token.as_deref())
            .map(|p| Arc::new(p) as Arc<dyn MessagingProvider>);
        Self::with_providers(config, db, generation, messaging)
    }

    /// Injection seam: tests substitute mock providers here.
    pub fn with_providers(
        config: Config,
        db: IntakeDb,
        generation: Option<Arc<dyn GenerationProvider>>,
        messaging: Option<Arc<dyn MessagingProvider>>,
    ) -> Self {
        let budget = BudgetGovernor::from_config(&config);
        Self {
            config,
            db: Mutex::new(db),
            budget,
            generation,
            messaging,
            send_locks: DashMap::new(),
        }
    }

    pub fn generation_provider(&self) -> Option<&dyn GenerationProvider> {
        self.generation.as_deref()
    }

    pub fn messaging_provider(&self) -> Option<&dyn MessagingProvider> {
        self.messaging.as_deref()
    }

    /// Async mutex guarding the check-deliver-commit sequence for one
    /// intake. Held across the delivery await, which is why it is a tokio
    /// mutex rather than a parking_lot one.
    pub fn send_lock(&self, intake_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        self.send_locks
            .entry(intake_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
