use super::Error;
use crate::models::{
    Crossover, Develop, DistinctSelection, ExperimentManagement, Genotype, GenotypeConstructor,
    Mutation, Objectives, ParentSelection, PopulationManagement, PopulationSettings, Selection,
    SteadyState, Tournament,
};
use std::sync::Arc;
use tracing::instrument;

const DEFAULT_TOURNAMENT_SIZE: usize = 2;
const DEFAULT_PARENT_COUNT: usize = 2;

/// Everything a population needs besides its individuals: sizing, the variation and
/// selection strategies, the fitness functions and the experiment store.
pub struct PopulationConfig<G: Genotype> {
    pub(crate) settings: PopulationSettings,
    pub(crate) constructor: Box<dyn GenotypeConstructor<G>>,
    pub(crate) develop: Box<dyn Develop<G>>,
    pub(crate) mutation: Box<dyn Mutation<G>>,
    pub(crate) crossover: Option<Box<dyn Crossover<G>>>,
    pub(crate) selection: Box<dyn Selection<G>>,
    pub(crate) parent_selection: Box<dyn ParentSelection<G>>,
    pub(crate) population_management: Box<dyn PopulationManagement<G>>,
    pub(crate) population_management_selector: Option<Box<dyn Selection<G>>>,
    pub(crate) objectives: Option<Objectives<G::Phenotype>>,
    pub(crate) experiment: Arc<dyn ExperimentManagement<G>>,
}

impl<G: Genotype + 'static> PopulationConfig<G> {
    pub fn builder(
        settings: PopulationSettings,
        experiment: impl ExperimentManagement<G> + 'static,
    ) -> PopulationConfigBuilder<G> {
        PopulationConfigBuilder {
            settings,
            experiment: Arc::new(experiment),
            constructor: None,
            develop: None,
            mutation: None,
            crossover: None,
            selection: None,
            parent_selection: None,
            population_management: None,
            population_management_selector: None,
            objectives: None,
        }
    }
}

impl<G: Genotype> PopulationConfig<G> {
    pub fn settings(&self) -> &PopulationSettings {
        &self.settings
    }

    pub fn experiment(&self) -> &dyn ExperimentManagement<G> {
        self.experiment.as_ref()
    }

    /// The configured objectives, if there is at least one.
    pub(crate) fn objectives(&self) -> Result<&Objectives<G::Phenotype>, Error> {
        self.objectives
            .as_ref()
            .filter(|objectives| objectives.count() > 0)
            .ok_or(Error::FitnessNotConfigured)
    }
}

pub struct PopulationConfigBuilder<G: Genotype> {
    settings: PopulationSettings,
    experiment: Arc<dyn ExperimentManagement<G>>,
    constructor: Option<Box<dyn GenotypeConstructor<G>>>,
    develop: Option<Box<dyn Develop<G>>>,
    mutation: Option<Box<dyn Mutation<G>>>,
    crossover: Option<Box<dyn Crossover<G>>>,
    selection: Option<Box<dyn Selection<G>>>,
    parent_selection: Option<Box<dyn ParentSelection<G>>>,
    population_management: Option<Box<dyn PopulationManagement<G>>>,
    population_management_selector: Option<Box<dyn Selection<G>>>,
    objectives: Option<Objectives<G::Phenotype>>,
}

impl<G: Genotype + 'static> PopulationConfigBuilder<G> {
    pub fn with_constructor(mut self, constructor: impl GenotypeConstructor<G> + 'static) -> Self {
        self.constructor = Some(Box::new(constructor));
        self
    }

    pub fn with_develop(mut self, develop: impl Develop<G> + 'static) -> Self {
        self.develop = Some(Box::new(develop));
        self
    }

    pub fn with_mutation(mut self, mutation: impl Mutation<G> + 'static) -> Self {
        self.mutation = Some(Box::new(mutation));
        self
    }

    /// Offspring are cloned from a single selected parent when no crossover is set.
    pub fn with_crossover(mut self, crossover: impl Crossover<G> + 'static) -> Self {
        self.crossover = Some(Box::new(crossover));
        self
    }

    pub fn with_selection(mut self, selection: impl Selection<G> + 'static) -> Self {
        self.selection = Some(Box::new(selection));
        self
    }

    pub fn with_parent_selection(mut self, selection: impl ParentSelection<G> + 'static) -> Self {
        self.parent_selection = Some(Box::new(selection));
        self
    }

    pub fn with_population_management(
        mut self,
        management: impl PopulationManagement<G> + 'static,
    ) -> Self {
        self.population_management = Some(Box::new(management));
        self
    }

    /// Selection used by the population management to break ties.
    pub fn with_population_management_selector(
        mut self,
        selection: impl Selection<G> + 'static,
    ) -> Self {
        self.population_management_selector = Some(Box::new(selection));
        self
    }

    pub fn with_objectives(mut self, objectives: Objectives<G::Phenotype>) -> Self {
        self.objectives = Some(objectives);
        self
    }

    #[instrument(level = "debug", skip(self), fields(population_size = self.settings.population_size, offspring_size = self.settings.offspring_size))]
    pub fn build(self) -> Result<PopulationConfig<G>, Error> {
        let settings = self.settings.validate()?;
        let tournament = Tournament::new(DEFAULT_TOURNAMENT_SIZE)?;

        Ok(PopulationConfig {
            settings,
            constructor: self
                .constructor
                .ok_or(Error::MissingStrategy("genotype constructor"))?,
            develop: self.develop.ok_or(Error::MissingStrategy("develop"))?,
            mutation: self.mutation.ok_or(Error::MissingStrategy("mutation"))?,
            crossover: self.crossover,
            selection: self.selection.unwrap_or_else(|| Box::new(tournament)),
            parent_selection: self.parent_selection.unwrap_or_else(|| {
                Box::new(DistinctSelection::new(DEFAULT_PARENT_COUNT, tournament))
            }),
            population_management: self
                .population_management
                .unwrap_or_else(|| Box::new(SteadyState)),
            population_management_selector: self.population_management_selector,
            objectives: self.objectives,
            experiment: self.experiment,
        })
    }
}
