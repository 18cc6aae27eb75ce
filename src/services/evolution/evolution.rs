use super::Error;
use crate::models::{Genotype, IndividualId};
use crate::services::evaluation::EvaluationClient;
use crate::services::lock;
use crate::services::population::{Population, PopulationConfig};
use crate::services::recovery::{RecoveryController, RecoveryState};
use std::sync::Arc;
use tracing::instrument;

/// Drives a run over `num_generations` generations, generation 0 being the initial
/// population. A snapshot is exported after every generation, and an interrupted run picks
/// up from the last one.
pub struct Evolution<G: Genotype> {
    config: Arc<PopulationConfig<G>>,
    client: Arc<EvaluationClient>,
    num_generations: u32,
    recovery_enabled: bool,
    locking: Option<(lock::Service, String)>,
}

impl<G: Genotype> Evolution<G> {
    pub fn new(
        config: Arc<PopulationConfig<G>>,
        client: Arc<EvaluationClient>,
        num_generations: u32,
    ) -> Self {
        Self {
            config,
            client,
            num_generations,
            recovery_enabled: true,
            locking: None,
        }
    }

    /// When disabled, everything exported before is cleared and the run starts over.
    pub fn with_recovery(mut self, enabled: bool) -> Self {
        self.recovery_enabled = enabled;
        self
    }

    /// Holds an advisory lock on `key` for the whole run.
    pub fn with_lock(mut self, locking: lock::Service, key: impl Into<String>) -> Self {
        self.locking = Some((locking, key.into()));
        self
    }

    #[instrument(level = "info", skip(self), fields(num_generations = self.num_generations, recovery = self.recovery_enabled))]
    pub async fn run(&self) -> Result<Population<G>, Error> {
        if self.num_generations == 0 {
            return Err(Error::NoGenerations);
        }

        match &self.locking {
            Some((locking, key)) => locking.lock_while(key, || self.evolve()).await?,
            None => self.evolve().await,
        }
    }

    async fn evolve(&self) -> Result<Population<G>, Error> {
        let last_generation = self.num_generations - 1;
        let recovery = RecoveryController::new(Arc::clone(&self.config));

        let state = if self.recovery_enabled {
            Some(recovery.read_state().await?)
        } else {
            self.config.experiment().reset().await?;
            tracing::info!("Cleared the experiment to start over");
            None
        };

        let (mut population, mut gen_num) = match state {
            Some(state) if !state.is_new() => self.resume(&recovery, state).await?,
            _ => {
                let population = Population::new(
                    Arc::clone(&self.config),
                    Arc::clone(&self.client),
                    IndividualId::FIRST,
                )
                .initialize(Vec::new())
                .await?;
                self.export_snapshot(0, &population).await?;
                (population, 0)
            }
        };

        while gen_num < last_generation {
            gen_num += 1;
            population = population.next_generation(gen_num, Vec::new()).await?;
            self.export_snapshot(gen_num, &population).await?;
        }

        tracing::info!("Evolution finished at generation {gen_num}");
        Ok(population)
    }

    /// Rebuilds the population from the last snapshot and completes the generation that was
    /// interrupted, if any.
    async fn resume(
        &self,
        recovery: &RecoveryController<G>,
        state: RecoveryState,
    ) -> Result<(Population<G>, u32), Error> {
        let restored = match state.generation {
            Some(generation) => recovery.load_snapshot(generation).await?,
            None => Vec::new(),
        };
        let population = Population::restore(
            Arc::clone(&self.config),
            Arc::clone(&self.client),
            restored,
            state.next_id,
        );

        match (state.generation, state.has_offspring) {
            (Some(generation), false) => {
                tracing::info!("Resuming after generation {generation}");
                Ok((population, generation))
            }
            (generation, _) => {
                let recovered = recovery.load_offspring(generation, state.next_id).await?;
                let gen_num = state.resume_generation();
                tracing::info!(
                    "Completing generation {gen_num} with {} recovered individuals",
                    recovered.len()
                );

                let population = match generation {
                    None => population.initialize(recovered).await?,
                    Some(_) => population.next_generation(gen_num, recovered).await?,
                };
                self.export_snapshot(gen_num, &population).await?;
                Ok((population, gen_num))
            }
        }
    }

    async fn export_snapshot(&self, generation: u32, population: &Population<G>) -> Result<(), Error> {
        self.config
            .experiment()
            .export_snapshot(generation, population.individuals())
            .await?;
        tracing::debug!("Exported snapshot of generation {generation}");
        Ok(())
    }
}
