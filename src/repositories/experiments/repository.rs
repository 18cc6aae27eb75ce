use super::Error;
use super::queries::{
    delete_experiment, delete_snapshot, get_individual, get_last_individual_id, get_last_snapshot, get_snapshot,
    insert_snapshot, update_outcomes, upsert_behavior, upsert_individual, upsert_phenotype,
};
use crate::models::{
    BehaviorMeasurements, ExperimentManagement, Genotype, Individual, IndividualId,
    IndividualRecord, Phenotype, Vector3,
};
use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::PgPool;
use std::marker::PhantomData;
use tracing::instrument;

/// Experiment bookkeeping in Postgres. Genotypes and outcomes are stored as JSON, rows are
/// scoped by the experiment name.
pub struct Repository<G> {
    pool: PgPool,
    experiment: String,
    _genotype: PhantomData<fn() -> G>,
}

impl<G> Clone for Repository<G> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            experiment: self.experiment.clone(),
            _genotype: PhantomData,
        }
    }
}

impl<G> Repository<G>
where
    G: Genotype + Serialize + DeserializeOwned,
{
    pub fn new(pool: PgPool, experiment: impl Into<String>) -> Self {
        Self {
            pool,
            experiment: experiment.into(),
            _genotype: PhantomData,
        }
    }

    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    #[instrument(level = "debug", skip(self, individual), fields(individual = %individual.id()))]
    pub async fn save_genotype(&self, individual: &Individual<G>) -> Result<(), Error> {
        let genotype = serde_json::to_value(individual.genotype())?;
        let parents: Vec<i64> = individual.parents().iter().map(|p| p.0).collect();
        upsert_individual(
            &self.pool,
            &self.experiment,
            individual.id().0,
            genotype,
            &parents,
        )
        .await
    }

    pub async fn save_phenotypes(&self, individual: &Individual<G>) -> Result<(), Error> {
        let id = individual.id();
        let mut tx = self.pool.begin().await?;
        for (objective, phenotype) in individual.phenotypes().iter().enumerate() {
            let description = phenotype
                .describe(&phenotype.name(), Vector3::zero())
                .map_err(|source| Error::Description { id, source })?;
            upsert_phenotype(
                &mut *tx,
                &self.experiment,
                id.0,
                objective as i32,
                &description,
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn save_outcomes(&self, individual: &Individual<G>) -> Result<(), Error> {
        let outcomes = serde_json::to_value(individual.outcomes())?;
        let updated =
            update_outcomes(&self.pool, &self.experiment, individual.id().0, outcomes).await?;
        if updated == 0 {
            return Err(Error::NotFound(individual.id()));
        }
        Ok(())
    }

    pub async fn save_behavior(
        &self,
        id: IndividualId,
        objective: Option<usize>,
        behavior: Option<BehaviorMeasurements>,
    ) -> Result<(), Error> {
        let measurements = behavior.map(serde_json::to_value).transpose()?;
        upsert_behavior(
            &self.pool,
            &self.experiment,
            id.0,
            objective.unwrap_or(0) as i32,
            measurements,
        )
        .await
    }

    /// Replaces the snapshot of `generation` atomically.
    #[instrument(level = "debug", skip(self, individuals), fields(num_individuals = individuals.len()))]
    pub async fn save_snapshot(
        &self,
        generation: u32,
        individuals: &[Individual<G>],
    ) -> Result<(), Error> {
        let ids: Vec<i64> = individuals.iter().map(|i| i.id().0).collect();
        let mut tx = self.pool.begin().await?;
        delete_snapshot(&mut *tx, &self.experiment, generation as i32).await?;
        insert_snapshot(&mut *tx, &self.experiment, generation as i32, &ids).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_snapshot(&self, generation: u32) -> Result<Vec<IndividualRecord<G>>, Error> {
        get_snapshot(&self.pool, &self.experiment, generation as i32)
            .await?
            .into_iter()
            .map(IndividualRecord::try_from)
            .collect()
    }

    pub async fn get_individual(&self, id: IndividualId) -> Result<IndividualRecord<G>, Error> {
        get_individual(&self.pool, &self.experiment, id.0)
            .await?
            .ok_or(Error::NotFound(id))?
            .try_into()
    }

    pub async fn get_last_snapshot(&self) -> Result<Option<u32>, Error> {
        let generation = get_last_snapshot(&self.pool, &self.experiment).await?;
        Ok(generation.map(|generation| generation as u32))
    }

    pub async fn get_last_individual_id(&self) -> Result<Option<IndividualId>, Error> {
        let id = get_last_individual_id(&self.pool, &self.experiment).await?;
        Ok(id.map(IndividualId))
    }

    #[instrument(level = "info", skip(self), fields(experiment = %self.experiment))]
    pub async fn clear(&self) -> Result<(), Error> {
        delete_experiment(&self.pool, &self.experiment).await
    }
}

impl<G> ExperimentManagement<G> for Repository<G>
where
    G: Genotype + Serialize + DeserializeOwned,
{
    fn export_genotype<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move { Ok(self.save_genotype(individual).await?) })
    }

    fn export_phenotype<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move { Ok(self.save_phenotypes(individual).await?) })
    }

    fn export_fitness<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move { Ok(self.save_outcomes(individual).await?) })
    }

    fn export_objectives<'a>(
        &'a self,
        individual: &'a Individual<G>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move { Ok(self.save_outcomes(individual).await?) })
    }

    fn export_behavior_measures(
        &self,
        id: IndividualId,
        objective: Option<usize>,
        behavior: Option<BehaviorMeasurements>,
    ) -> BoxFuture<'_, Result<(), anyhow::Error>> {
        Box::pin(async move { Ok(self.save_behavior(id, objective, behavior).await?) })
    }

    fn export_snapshot<'a>(
        &'a self,
        generation: u32,
        individuals: &'a [Individual<G>],
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move { Ok(self.save_snapshot(generation, individuals).await?) })
    }

    fn load_snapshot(
        &self,
        generation: u32,
    ) -> BoxFuture<'_, Result<Vec<IndividualRecord<G>>, anyhow::Error>> {
        Box::pin(async move { Ok(self.get_snapshot(generation).await?) })
    }

    fn load_individual(
        &self,
        id: IndividualId,
    ) -> BoxFuture<'_, Result<IndividualRecord<G>, anyhow::Error>> {
        Box::pin(async move { Ok(self.get_individual(id).await?) })
    }

    fn last_snapshot(&self) -> BoxFuture<'_, Result<Option<u32>, anyhow::Error>> {
        Box::pin(async move { Ok(self.get_last_snapshot().await?) })
    }

    fn last_individual_id(&self) -> BoxFuture<'_, Result<Option<IndividualId>, anyhow::Error>> {
        Box::pin(async move { Ok(self.get_last_individual_id().await?) })
    }

    fn reset(&self) -> BoxFuture<'_, Result<(), anyhow::Error>> {
        Box::pin(async move { Ok(self.clear().await?) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Outcome;
    use crate::testing::{TestGenotype, TestPhenotype};

    fn individual(id: i64, parents: Vec<i64>) -> Individual<TestGenotype> {
        Individual::new(
            TestGenotype::new(IndividualId(id), id as f64),
            vec![TestPhenotype::new(&format!("robot_{id}"), id as f64)],
            parents.into_iter().map(IndividualId).collect(),
        )
    }

    fn evaluated(id: i64, fitness: f64) -> Individual<TestGenotype> {
        let mut individual = individual(id, vec![]);
        for (_, outcome) in individual.evaluation_slots() {
            *outcome = Some(Outcome::measured(fitness, BehaviorMeasurements::zero()));
        }
        individual
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_loads_back_an_exported_individual(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repository = Repository::<TestGenotype>::new(pool, "walker");
        let individual = evaluated(3, 1.5);

        repository.export_genotype(&individual).await?;
        repository.export_phenotype(&individual).await?;
        repository.export_fitness(&individual).await?;

        let record = repository.load_individual(IndividualId(3)).await?;
        assert_eq!(record, IndividualRecord::from(&individual));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_keeps_unevaluated_individuals_without_outcomes(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repository = Repository::<TestGenotype>::new(pool, "walker");
        repository.export_genotype(&individual(5, vec![1, 2])).await?;

        let record = repository.get_individual(IndividualId(5)).await?;

        assert!(record.outcomes.is_empty());
        assert_eq!(record.parents, vec![IndividualId(1), IndividualId(2)]);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_rejects_outcomes_of_unknown_individuals(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repository = Repository::<TestGenotype>::new(pool, "walker");

        let result = repository.save_outcomes(&evaluated(9, 1.0)).await;

        assert!(matches!(result, Err(Error::NotFound(IndividualId(9)))));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_replaces_snapshots_keeping_their_order(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repository = Repository::<TestGenotype>::new(pool, "walker");
        let individuals: Vec<_> = [4, 2, 7].into_iter().map(|id| evaluated(id, 1.0)).collect();
        for individual in &individuals {
            repository.export_genotype(individual).await?;
            repository.export_fitness(individual).await?;
        }

        repository.export_snapshot(0, &individuals[..2]).await?;
        repository.export_snapshot(0, &individuals).await?;

        let ids: Vec<_> = repository
            .load_snapshot(0)
            .await?
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec![IndividualId(4), IndividualId(2), IndividualId(7)]);
        assert_eq!(repository.last_snapshot().await?, Some(0));
        assert_eq!(repository.last_individual_id().await?, Some(IndividualId(7)));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_scopes_rows_by_experiment(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let walker = Repository::<TestGenotype>::new(pool.clone(), "walker");
        let crawler = Repository::<TestGenotype>::new(pool, "crawler");
        walker.export_genotype(&individual(1, vec![])).await?;
        walker.export_snapshot(0, &[evaluated(1, 1.0)]).await?;

        assert_eq!(crawler.last_individual_id().await?, None);
        assert_eq!(crawler.last_snapshot().await?, None);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_records_behavior_per_objective(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repository = Repository::<TestGenotype>::new(pool, "walker");
        repository.export_genotype(&individual(1, vec![])).await?;

        repository
            .export_behavior_measures(IndividualId(1), Some(1), None)
            .await?;
        repository
            .export_behavior_measures(IndividualId(1), None, Some(BehaviorMeasurements::zero()))
            .await?;
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn it_clears_only_its_own_experiment(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let walker = Repository::<TestGenotype>::new(pool.clone(), "walker");
        let crawler = Repository::<TestGenotype>::new(pool, "crawler");
        for repository in [&walker, &crawler] {
            let individual = evaluated(1, 1.0);
            repository.export_genotype(&individual).await?;
            repository.export_phenotype(&individual).await?;
            repository
                .export_behavior_measures(IndividualId(1), None, None)
                .await?;
            repository.export_snapshot(0, &[individual]).await?;
        }

        walker.reset().await?;

        assert_eq!(walker.last_snapshot().await?, None);
        assert_eq!(walker.last_individual_id().await?, None);
        assert_eq!(crawler.last_snapshot().await?, Some(0));
        assert_eq!(crawler.last_individual_id().await?, Some(IndividualId(1)));
        Ok(())
    }
}
