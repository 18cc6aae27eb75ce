use super::Error;
use crate::models::{Genotype, Individual, IndividualId, IndividualRecord};
use crate::services::population::PopulationConfig;
use std::sync::Arc;
use tracing::instrument;

/// Where an interrupted run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryState {
    /// Latest generation with an exported snapshot
    pub generation: Option<u32>,
    /// Id the next created individual receives
    pub next_id: IndividualId,
    /// Whether individuals were exported after the latest snapshot
    pub has_offspring: bool,
}

impl RecoveryState {
    /// Nothing was exported yet.
    pub fn is_new(&self) -> bool {
        self.generation.is_none() && !self.has_offspring
    }

    /// The generation the run continues with.
    pub fn resume_generation(&self) -> u32 {
        self.generation.map_or(0, |generation| generation + 1)
    }
}

/// Reads back the exported state of an experiment.
///
/// Relies on the id discipline of the population: the initial population holds ids
/// `1..=population_size` and every generation adds exactly `offspring_size` ids.
pub struct RecoveryController<G: Genotype> {
    config: Arc<PopulationConfig<G>>,
}

impl<G: Genotype> RecoveryController<G> {
    pub fn new(config: Arc<PopulationConfig<G>>) -> Self {
        Self { config }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn read_state(&self) -> Result<RecoveryState, Error> {
        let experiment = self.config.experiment();
        let generation = experiment.last_snapshot().await?;
        let last = experiment.last_individual_id().await?;

        let roster = self.roster(generation);
        let last_id = last.map_or(0, |id| id.0);
        if let Some(generation) = generation {
            if last_id < roster {
                return Err(Error::MissingIndividuals {
                    generation,
                    roster,
                    last,
                });
            }
        }

        // at most one generation can be in flight after the snapshot
        let limit = self.roster(Some(generation.map_or(0, |generation| generation + 1)));
        if let Some(last) = last.filter(|last| last.0 > limit) {
            return Err(Error::UnexpectedIndividuals {
                generation,
                limit,
                last,
            });
        }

        let state = RecoveryState {
            generation,
            next_id: IndividualId(last_id + 1),
            has_offspring: last_id > roster,
        };
        tracing::info!(?state, "Read recovery state");
        Ok(state)
    }

    /// Number of individuals created up to and including `generation`.
    pub fn roster(&self, generation: Option<u32>) -> i64 {
        let settings = &self.config.settings;
        match generation {
            None => 0,
            Some(generation) => {
                settings.population_size as i64
                    + generation as i64 * settings.offspring_size as i64
            }
        }
    }

    /// Loads the survivors of `generation`.
    #[instrument(level = "info", skip(self))]
    pub async fn load_snapshot(&self, generation: u32) -> Result<Vec<Individual<G>>, Error> {
        let records = self.config.experiment().load_snapshot(generation).await?;

        let expected = self.config.settings.population_size;
        if records.len() != expected {
            return Err(Error::SnapshotSize {
                generation,
                expected,
                found: records.len(),
            });
        }

        let roster = self.roster(Some(generation));
        if let Some(record) = records.iter().find(|record| record.id.0 > roster) {
            return Err(Error::SnapshotFromFuture {
                generation,
                id: record.id,
                roster,
            });
        }

        records.into_iter().map(|record| self.restore(record)).collect()
    }

    /// Loads the individuals exported after the snapshot of `generation`, up to `next_id`.
    ///
    /// Individuals whose evaluation did not complete come back without outcome.
    #[instrument(level = "info", skip(self), fields(next_id = %next_id))]
    pub async fn load_offspring(
        &self,
        generation: Option<u32>,
        next_id: IndividualId,
    ) -> Result<Vec<Individual<G>>, Error> {
        let experiment = self.config.experiment();
        let first = self.roster(generation) + 1;

        let mut offspring = Vec::new();
        for id in first..next_id.0 {
            let record = experiment.load_individual(IndividualId(id)).await?;
            offspring.push(self.restore(record)?);
        }

        tracing::info!("Recovered {} individuals", offspring.len());
        Ok(offspring)
    }

    fn restore(&self, record: IndividualRecord<G>) -> Result<Individual<G>, Error> {
        if record.genotype.id() != record.id {
            return Err(Error::MismatchedRecord {
                expected: record.id,
                found: record.genotype.id(),
            });
        }

        let phenotypes = self.config.develop.develop(&record.genotype);
        Ok(Individual::restore(
            record.genotype,
            phenotypes,
            record.parents,
            record.outcomes,
        ))
    }
}
