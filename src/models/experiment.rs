use super::{BehaviorMeasurements, Genotype, Individual, IndividualId, IndividualRecord};
use futures::future::BoxFuture;

/// Bookkeeping of an experiment: everything the loop exports while it runs, and what it
/// reads back when a run is recovered.
///
/// The storage layout belongs to the implementation. The loop only relies on being able to
/// load back what it exported.
pub trait ExperimentManagement<G: Genotype>: Send + Sync {
    fn export_genotype<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>>;

    fn export_phenotype<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>>;

    /// Records the outcome of a single-objective individual.
    fn export_fitness<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>>;

    /// Records the outcomes of a multi-objective individual.
    fn export_objectives<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>>;

    fn export_behavior_measures(
        &self,
        id: IndividualId,
        objective: Option<usize>,
        behavior: Option<BehaviorMeasurements>,
    ) -> BoxFuture<'_, Result<(), anyhow::Error>>;

    /// Records the survivors of a generation.
    fn export_snapshot<'a>(
        &'a self,
        generation: u32,
        individuals: &'a [Individual<G>],
    ) -> BoxFuture<'a, Result<(), anyhow::Error>>;

    fn load_snapshot(
        &self,
        generation: u32,
    ) -> BoxFuture<'_, Result<Vec<IndividualRecord<G>>, anyhow::Error>>;

    fn load_individual(
        &self,
        id: IndividualId,
    ) -> BoxFuture<'_, Result<IndividualRecord<G>, anyhow::Error>>;

    /// Latest generation with an exported snapshot.
    fn last_snapshot(&self) -> BoxFuture<'_, Result<Option<u32>, anyhow::Error>>;

    /// Highest id of an exported individual.
    fn last_individual_id(&self) -> BoxFuture<'_, Result<Option<IndividualId>, anyhow::Error>>;

    /// Forgets everything exported so far. Called before a run starts over.
    fn reset(&self) -> BoxFuture<'_, Result<(), anyhow::Error>>;
}
