use super::pool::{PoolError, WorkerPool};
use super::{BodyAnalyzer, Broker, Error, EvaluationClientBuilder, ResultStore};
use crate::models::{
    BehaviorMeasurements, EvaluationConfig, FitnessFunction, IndividualId, Outcome, Phenotype,
    Trajectory, Vector3,
};
use rand::Rng;
use std::f64::consts::TAU;
use std::sync::Arc;
use tracing::instrument;

/// Client of the remote simulator.
///
/// Submits robots through the broker with a bounded wait and a bounded number of attempts,
/// then turns the recorded samples into an [`Outcome`]. Failures of a single robot degrade
/// to [`Outcome::Failed`]; only misuse and a stopped client surface as errors.
pub struct EvaluationClient {
    pub(super) config: EvaluationConfig,
    pub(super) broker: Arc<dyn Broker>,
    pub(super) results: Arc<dyn ResultStore>,
    pub(super) analyzer: Option<Arc<dyn BodyAnalyzer>>,
    pub(super) pool: WorkerPool,
}

impl EvaluationClient {
    pub fn builder(
        broker: impl Broker + 'static,
        results: impl ResultStore + 'static,
    ) -> EvaluationClientBuilder {
        EvaluationClientBuilder::new(Arc::new(broker), Arc::new(results))
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluates one phenotype, running the collision pre-check and the directed trials
    /// when they are configured.
    #[instrument(level = "info", skip(self, phenotype, fitness), fields(individual = %individual))]
    pub async fn evaluate<P: Phenotype>(
        &self,
        individual: IndividualId,
        phenotype: &mut P,
        life_timeout: f64,
        fitness: &dyn FitnessFunction<P>,
    ) -> Result<Outcome, Error> {
        let name = phenotype.name();
        validate_name(&name)?;

        if let Some(analyzer) = &self.analyzer {
            let description = describe(phenotype, &name, Vector3::zero())?;
            match analyzer.analyze(&description).await {
                Ok(analysis) if analysis.collisions > 0 => {
                    tracing::info!(
                        collisions = analysis.collisions,
                        "Discarding robot {name} with self collisions"
                    );
                    return Ok(Outcome::Discarded {
                        collisions: analysis.collisions,
                    });
                }
                Ok(analysis) => {
                    if let Some(bounding_box) = analysis.bounding_box {
                        tracing::debug!(
                            height = bounding_box.height(),
                            "Robot {name} passed the collision check"
                        );
                        phenotype.set_bounding_box(bounding_box);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Body analysis of {name} failed, submitting unchecked");
                }
            }
        }

        let Some(trials) = self.config.directed_trials else {
            return self
                .test_robot(individual, phenotype, &name, life_timeout, fitness)
                .await;
        };

        let directions: Vec<f64> = {
            let mut rng = rand::rng();
            (0..trials).map(|_| rng.random_range(0.0..TAU)).collect()
        };

        let mut outcomes = Vec::with_capacity(directions.len());
        for (trial, angle) in directions.into_iter().enumerate() {
            let target = Vector3::planar_direction(angle);
            phenotype.set_target(target);
            tracing::debug!(trial, ?target, "Directed trial of {name}");

            let trial_name = format!("{name}_iter_{}", trial + 1);
            let outcome = self
                .test_robot(individual, phenotype, &trial_name, life_timeout, fitness)
                .await?;
            outcomes.push(outcome);
        }

        let outcome = Outcome::mean(&outcomes);
        tracing::info!(fitness = ?outcome.fitness(), trials, "Directed trials of {name} done");
        Ok(outcome)
    }

    /// Runs a single simulation of `phenotype` under `name`.
    ///
    /// Every attempt waits at most the configured evaluation timeout for an acknowledgement.
    /// A submission that is not acknowledged in time is abandoned and its late result is
    /// ignored. After `max_attempts` failures the outcome is [`Outcome::Failed`].
    #[instrument(level = "debug", skip(self, phenotype, fitness), fields(individual = %individual))]
    pub async fn test_robot<P: Phenotype>(
        &self,
        individual: IndividualId,
        phenotype: &P,
        name: &str,
        life_timeout: f64,
        fitness: &dyn FitnessFunction<P>,
    ) -> Result<Outcome, Error> {
        validate_name(name)?;
        let description = describe(phenotype, name, self.pose(phenotype))?;
        let timeout = self.config.evaluation_timeout;

        for attempt in 1..=self.config.max_attempts {
            tracing::debug!(attempt, "Submitting robot {name}");

            let broker = Arc::clone(&self.broker);
            let robot_name = name.to_string();
            let description = description.clone();
            let submission = self
                .pool
                .run(async move {
                    tokio::time::timeout(
                        timeout,
                        broker.submit(&robot_name, description, life_timeout),
                    )
                    .await
                })
                .await;

            let remote_id = match submission {
                Ok(Ok(Ok(remote_id))) => remote_id,
                Ok(Ok(Err(err))) => {
                    tracing::warn!(attempt, error = %err, "Submission of robot {name} failed");
                    continue;
                }
                Ok(Err(_)) => {
                    tracing::warn!(attempt, "Giving up on robot {name} after {timeout:?}");
                    continue;
                }
                Err(PoolError::Panicked(reason)) => {
                    tracing::warn!(attempt, reason = %reason, "Submission worker of robot {name} panicked");
                    continue;
                }
                Err(PoolError::Closed) => return Err(Error::Stopped),
            };

            match self.results.query(remote_id, self.config.run_marker).await {
                Ok(trajectory) => return Ok(summarize(&trajectory, phenotype, fitness)),
                Err(err) => {
                    tracing::warn!(attempt, remote_id, error = %err, "Could not read samples of robot {name}");
                }
            }
        }

        tracing::warn!(
            max_attempts = self.config.max_attempts,
            "Evaluation of robot {name} failed (reached max attempts)"
        );
        Ok(Outcome::Failed)
    }

    /// Spawn pose of a phenotype, lifted so that its body rests on the ground.
    pub fn pose<P: Phenotype>(&self, phenotype: &P) -> Vector3 {
        let bottom = phenotype
            .bounding_box()
            .map(|bounding_box| bounding_box.min.z)
            .unwrap_or(0.0);
        Vector3::new(0.0, 0.0, self.config.z_start - bottom)
    }

    pub fn is_stopped(&self) -> bool {
        self.pool.is_closed()
    }

    /// Stops the client. In-flight submissions are abandoned and later calls fail with
    /// [`Error::Stopped`]. Stopping twice is a no-op.
    pub fn stop(&self) {
        if self.pool.shutdown() {
            tracing::info!("Evaluation client stopped");
        }
    }
}

impl Drop for EvaluationClient {
    fn drop(&mut self) {
        self.stop();
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
        tracing::error!("Robot name {name:?} is not a valid simulator name");
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn describe<P: Phenotype>(phenotype: &P, name: &str, pose: Vector3) -> Result<String, Error> {
    phenotype
        .describe(name, pose)
        .map_err(|source| Error::Description {
            name: name.to_string(),
            source,
        })
}

fn summarize<P>(trajectory: &Trajectory, phenotype: &P, fitness: &dyn FitnessFunction<P>) -> Outcome {
    if !trajectory.is_usable() {
        tracing::warn!(
            samples = trajectory.samples().len(),
            "Simulation acknowledged without usable telemetry"
        );
        return Outcome::NoTelemetry;
    }

    Outcome::measured(
        fitness.fitness(trajectory, phenotype),
        BehaviorMeasurements::from_trajectory(trajectory),
    )
}
