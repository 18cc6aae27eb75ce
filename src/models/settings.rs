use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sizing and timing of an evolutionary run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSettings {
    /// Number of individuals kept after initialization and after every replacement
    pub population_size: usize,
    /// Number of offspring produced per generation
    pub offspring_size: usize,
    /// Simulated seconds each robot is evaluated for
    pub evaluation_time: f64,
    /// Simulated seconds granted before measurement starts
    pub grace_time: f64,
    /// Seed of the population's random source. Random when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("population_size must be at least 1")]
    EmptyPopulation,
    #[error("offspring_size must be at least 1")]
    NoOffspring,
    #[error("evaluation_time must be positive, got: {0}")]
    InvalidEvaluationTime(f64),
    #[error("grace_time must not be negative, got: {0}")]
    InvalidGraceTime(f64),
}

impl PopulationSettings {
    pub fn new(population_size: usize, offspring_size: usize) -> Result<Self, SettingsError> {
        Self {
            population_size,
            offspring_size,
            evaluation_time: 30.0,
            grace_time: 0.0,
            seed: None,
        }
        .validate()
    }

    pub fn with_evaluation_time(
        mut self,
        evaluation_time: f64,
        grace_time: f64,
    ) -> Result<Self, SettingsError> {
        self.evaluation_time = evaluation_time;
        self.grace_time = grace_time;
        self.validate()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Simulated lifetime granted to a robot in the simulator.
    pub fn life_timeout(&self) -> f64 {
        self.evaluation_time + self.grace_time
    }

    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.population_size == 0 {
            return Err(SettingsError::EmptyPopulation);
        }
        if self.offspring_size == 0 {
            return Err(SettingsError::NoOffspring);
        }
        if !(self.evaluation_time > 0.0) {
            return Err(SettingsError::InvalidEvaluationTime(self.evaluation_time));
        }
        if !(self.grace_time >= 0.0) {
            return Err(SettingsError::InvalidGraceTime(self.grace_time));
        }
        Ok(self)
    }
}

/// Tuning of the remote evaluation protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Real time to wait for the simulator to acknowledge a submission
    pub evaluation_timeout: Duration,
    /// Total number of submissions tried before giving up on a phenotype
    pub max_attempts: u32,
    /// Number of submissions allowed to wait on the broker at the same time
    pub workers: usize,
    /// Height at which robots are spawned, before bounding box correction
    pub z_start: f64,
    /// Marker under which the simulator records the samples of an evaluation run
    pub run_marker: i32,
    /// Directed trials per phenotype. A single undirected trial when absent.
    pub directed_trials: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationConfigError {
    #[error("max_attempts must be at least 1")]
    NoAttempts,
    #[error("workers must be at least 1")]
    NoWorkers,
    #[error("directed_trials must be at least 1 when set")]
    NoTrials,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            evaluation_timeout: Duration::from_secs(600),
            max_attempts: 3,
            workers: 8,
            z_start: 0.0,
            run_marker: 99,
            directed_trials: None,
        }
    }
}

impl EvaluationConfig {
    pub fn with_timeout(mut self, evaluation_timeout: Duration) -> Self {
        self.evaluation_timeout = evaluation_timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_z_start(mut self, z_start: f64) -> Self {
        self.z_start = z_start;
        self
    }

    pub fn with_directed_trials(mut self, trials: u32) -> Self {
        self.directed_trials = Some(trials);
        self
    }

    pub fn validate(self) -> Result<Self, EvaluationConfigError> {
        if self.max_attempts == 0 {
            return Err(EvaluationConfigError::NoAttempts);
        }
        if self.workers == 0 {
            return Err(EvaluationConfigError::NoWorkers);
        }
        if self.directed_trials == Some(0) {
            return Err(EvaluationConfigError::NoTrials);
        }
        Ok(self)
    }
}
