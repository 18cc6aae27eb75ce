use super::{Error, PopulationConfig};
use crate::models::{EvolutionRng, Genotype, Individual, IndividualId, Outcome};
use crate::services::evaluation::EvaluationClient;
use futures::future::join_all;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::instrument;

/// The current generation of a steady-state run.
///
/// Generations are immutable: [`Population::next_generation`] consumes the population and
/// returns its successor. Ids are handed out from a single counter and are never reused.
pub struct Population<G: Genotype> {
    config: Arc<PopulationConfig<G>>,
    client: Arc<EvaluationClient>,
    individuals: Vec<Individual<G>>,
    next_id: IndividualId,
    rng: EvolutionRng,
}

impl<G: Genotype> Population<G> {
    /// An empty population that assigns ids starting at `next_id`.
    ///
    /// A seeded random stream is derived from the seed and `next_id`, so a population
    /// resumed mid-run draws fresh numbers instead of replaying those of generation 0.
    pub fn new(
        config: Arc<PopulationConfig<G>>,
        client: Arc<EvaluationClient>,
        next_id: IndividualId,
    ) -> Self {
        let rng = match config.settings.seed {
            Some(seed) => EvolutionRng::seed_from_u64(seed.wrapping_add(next_id.0 as u64)),
            None => EvolutionRng::from_os_rng(),
        };
        Self {
            config,
            client,
            individuals: Vec::new(),
            next_id,
            rng,
        }
    }

    /// A population resumed from a snapshot. The random stream follows [`Population::new`].
    pub(crate) fn restore(
        config: Arc<PopulationConfig<G>>,
        client: Arc<EvaluationClient>,
        individuals: Vec<Individual<G>>,
        next_id: IndividualId,
    ) -> Self {
        let mut population = Self::new(config, client, next_id);
        population.individuals = individuals;
        population
    }

    pub fn individuals(&self) -> &[Individual<G>] {
        &self.individuals
    }

    pub fn into_individuals(self) -> Vec<Individual<G>> {
        self.individuals
    }

    /// Id the next created individual receives.
    pub fn next_id(&self) -> IndividualId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Fills the population up to its configured size with freshly constructed individuals.
    ///
    /// `recovered` individuals are kept; those among them without a recorded outcome are
    /// evaluated together with the new ones.
    #[instrument(level = "info", skip(self, recovered), fields(num_recovered = recovered.len()))]
    pub async fn initialize(mut self, recovered: Vec<Individual<G>>) -> Result<Self, Error> {
        let population_size = self.config.settings.population_size;
        let missing = population_size.saturating_sub(recovered.len());

        let mut created = Vec::with_capacity(missing);
        for _ in 0..missing {
            let id = self.take_id();
            let genotype = self.config.constructor.construct(id, &mut self.rng);
            check_identity(id, &genotype)?;
            created.push(self.new_individual(genotype, Vec::new()).await?);
        }

        let mut individuals = recovered;
        let batch = individuals
            .iter_mut()
            .filter(|individual| individual.needs_evaluation())
            .chain(created.iter_mut())
            .collect();
        self.evaluate(batch, 0).await?;

        individuals.extend(created);
        check_size(population_size, individuals.len())?;
        tracing::info!("Initial population with {} individuals", individuals.len());

        self.individuals = individuals;
        Ok(self)
    }

    /// Produces the next generation: breeds the missing offspring, evaluates them and lets
    /// the population management pick the survivors among old and new individuals.
    #[instrument(level = "info", skip(self, recovered), fields(num_recovered = recovered.len()))]
    pub async fn next_generation(
        mut self,
        gen_num: u32,
        recovered: Vec<Individual<G>>,
    ) -> Result<Self, Error> {
        let missing = self
            .config
            .settings
            .offspring_size
            .saturating_sub(recovered.len());

        let mut offspring = Vec::with_capacity(missing);
        for _ in 0..missing {
            let (genotype, parents) = self.breed()?;
            offspring.push(self.new_individual(genotype, parents).await?);
        }

        let mut new = recovered;
        let batch = new
            .iter_mut()
            .filter(|individual| individual.needs_evaluation())
            .chain(offspring.iter_mut())
            .collect();
        self.evaluate(batch, gen_num).await?;
        new.extend(offspring);

        let Population {
            config,
            client,
            individuals,
            next_id,
            mut rng,
        } = self;

        let population_size = config.settings.population_size;
        let selector = config.population_management_selector.as_deref();
        let survivors = config
            .population_management
            .replace(individuals, new, selector, &mut rng)?;
        check_size(population_size, survivors.len())?;
        tracing::info!(
            "Population selected in gen {gen_num} with {} individuals",
            survivors.len()
        );

        Ok(Population {
            config,
            client,
            individuals: survivors,
            next_id,
            rng,
        })
    }

    /// Picks parents, recombines or clones them and mutates the child under a fresh id.
    fn breed(&mut self) -> Result<(G, Vec<IndividualId>), Error> {
        let candidates: Vec<&Individual<G>> = self.individuals.iter().collect();

        let (mut genotype, parents) = match &self.config.crossover {
            Some(crossover) => {
                let parents = self
                    .config
                    .parent_selection
                    .select_parents(&candidates, &mut self.rng)?;
                let genotype = crossover.crossover(&parents, &mut self.rng);
                (genotype, parents.iter().map(|p| p.id()).collect())
            }
            None => {
                let parent = self.config.selection.select(&candidates, &mut self.rng)?;
                (parent.genotype().clone(), vec![parent.id()])
            }
        };

        let id = self.take_id();
        genotype.set_id(id);
        let genotype = self.config.mutation.mutate(genotype, &mut self.rng);
        check_identity(id, &genotype)?;

        Ok((genotype, parents))
    }

    /// Develops and exports a new individual. It is evaluated later, in a batch.
    async fn new_individual(
        &self,
        genotype: G,
        parents: Vec<IndividualId>,
    ) -> Result<Individual<G>, Error> {
        let phenotypes = self.config.develop.develop(&genotype);
        let individual = Individual::new(genotype, phenotypes, parents);
        tracing::debug!(individual = %individual.id(), parents = ?individual.parents(), "New individual");

        let experiment = self.config.experiment();
        experiment.export_genotype(&individual).await?;
        experiment.export_phenotype(&individual).await?;
        Ok(individual)
    }

    /// Evaluates every phenotype without an outcome concurrently and exports the results.
    async fn evaluate(&self, batch: Vec<&mut Individual<G>>, gen_num: u32) -> Result<(), Error> {
        let objectives = self.config.objectives()?;
        let life_timeout = self.config.settings.life_timeout();
        let client = self.client.as_ref();

        for individual in &batch {
            if individual.phenotypes().len() != objectives.count() {
                return Err(Error::PhenotypeCount {
                    id: individual.id(),
                    expected: objectives.count(),
                    found: individual.phenotypes().len(),
                });
            }
        }

        let evaluations = batch.into_iter().map(|individual| async move {
            let id = individual.id();
            let slots = individual
                .evaluation_slots()
                .enumerate()
                .filter(|(_, (_, outcome))| outcome.is_none())
                .map(|(objective, (phenotype, outcome))| async move {
                    let fitness = objectives
                        .get(objective)
                        .ok_or(Error::FitnessNotConfigured)?;
                    tracing::info!(individual = %id, objective, gen_num, "Evaluating individual");
                    *outcome = Some(client.evaluate(id, phenotype, life_timeout, fitness).await?);
                    Ok::<_, Error>(())
                });
            join_all(slots)
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, Error>(individual)
        });

        let evaluated = join_all(evaluations).await;
        for individual in evaluated {
            self.export_evaluation(individual?, objectives.is_multi_objective())
                .await?;
        }
        Ok(())
    }

    async fn export_evaluation(
        &self,
        individual: &Individual<G>,
        multi_objective: bool,
    ) -> Result<(), Error> {
        let experiment = self.config.experiment();
        let id = individual.id();

        if multi_objective {
            for (objective, outcome) in individual.outcomes().iter().enumerate() {
                let behavior = outcome.as_ref().and_then(Outcome::behavior);
                experiment
                    .export_behavior_measures(id, Some(objective), behavior)
                    .await?;
            }
            experiment.export_objectives(individual).await?;
            tracing::info!(individual = %id, objectives = ?individual.objectives(), "Individual evaluated");
        } else {
            experiment
                .export_behavior_measures(id, None, individual.behavior())
                .await?;
            experiment.export_fitness(individual).await?;
            tracing::info!(individual = %id, fitness = ?individual.fitness(), "Individual evaluated");
        }
        Ok(())
    }

    fn take_id(&mut self) -> IndividualId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }
}

fn check_identity<G: Genotype>(expected: IndividualId, genotype: &G) -> Result<(), Error> {
    if genotype.id() != expected {
        return Err(Error::IdentityChanged {
            expected,
            found: genotype.id(),
        });
    }
    Ok(())
}

fn check_size(expected: usize, found: usize) -> Result<(), Error> {
    if expected != found {
        return Err(Error::PopulationSize { expected, found });
    }
    Ok(())
}
