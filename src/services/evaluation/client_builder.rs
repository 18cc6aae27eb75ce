use super::pool::WorkerPool;
use super::{BodyAnalyzer, Broker, Error, EvaluationClient, ResultStore};
use crate::models::EvaluationConfig;
use std::sync::Arc;
use tracing::instrument;

pub struct EvaluationClientBuilder {
    broker: Arc<dyn Broker>,
    results: Arc<dyn ResultStore>,
    analyzer: Option<Arc<dyn BodyAnalyzer>>,
    config: EvaluationConfig,
}

impl EvaluationClientBuilder {
    pub(super) fn new(broker: Arc<dyn Broker>, results: Arc<dyn ResultStore>) -> Self {
        Self {
            broker,
            results,
            analyzer: None,
            config: EvaluationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables the collision pre-check.
    pub fn with_analyzer(mut self, analyzer: impl BodyAnalyzer + 'static) -> Self {
        self.analyzer = Some(Arc::new(analyzer));
        self
    }

    /// Validates the configuration and starts the worker pool.
    #[instrument(level = "debug", skip(self), fields(workers = self.config.workers, max_attempts = self.config.max_attempts))]
    pub fn build(self) -> Result<EvaluationClient, Error> {
        let config = self.config.validate()?;
        let pool = WorkerPool::new(config.workers);

        Ok(EvaluationClient {
            config,
            broker: self.broker,
            results: self.results,
            analyzer: self.analyzer,
            pool,
        })
    }
}
