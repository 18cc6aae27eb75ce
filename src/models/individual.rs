use super::{BehaviorMeasurements, Genotype, Outcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential id of an individual, unique within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IndividualId(pub i64);

impl IndividualId {
    pub const FIRST: IndividualId = IndividualId(1);

    pub fn next(self) -> Self {
        IndividualId(self.0 + 1)
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One candidate solution: genotype, developed phenotypes, lineage and evaluation outcomes.
///
/// A single-objective individual carries one phenotype. A multi-objective individual
/// carries one phenotype per objective, each evaluated separately.
pub struct Individual<G: Genotype> {
    genotype: G,
    phenotypes: Vec<G::Phenotype>,
    parents: Vec<IndividualId>,
    outcomes: Vec<Option<Outcome>>,
}

impl<G: Genotype> Individual<G> {
    pub(crate) fn new(genotype: G, phenotypes: Vec<G::Phenotype>, parents: Vec<IndividualId>) -> Self {
        let outcomes = vec![None; phenotypes.len()];
        Self {
            genotype,
            phenotypes,
            parents,
            outcomes,
        }
    }

    /// Rebuilds an individual from persisted state, keeping recorded outcomes.
    pub(crate) fn restore(
        genotype: G,
        phenotypes: Vec<G::Phenotype>,
        parents: Vec<IndividualId>,
        outcomes: Vec<Option<Outcome>>,
    ) -> Self {
        let mut outcomes = outcomes;
        outcomes.resize(phenotypes.len(), None);
        Self {
            genotype,
            phenotypes,
            parents,
            outcomes,
        }
    }

    pub fn id(&self) -> IndividualId {
        self.genotype.id()
    }

    pub fn genotype(&self) -> &G {
        &self.genotype
    }

    pub fn phenotypes(&self) -> &[G::Phenotype] {
        &self.phenotypes
    }

    pub fn parents(&self) -> &[IndividualId] {
        &self.parents
    }

    pub fn outcomes(&self) -> &[Option<Outcome>] {
        &self.outcomes
    }

    /// Fitness of a single-objective individual.
    ///
    /// `None` until the evaluation completed. Multi-objective individuals have no scalar
    /// fitness; use [`Individual::objectives`] instead.
    pub fn fitness(&self) -> Option<f64> {
        match self.outcomes.as_slice() {
            [Some(outcome)] => outcome.fitness(),
            _ => None,
        }
    }

    /// Fitness per objective.
    pub fn objectives(&self) -> Vec<Option<f64>> {
        self.outcomes
            .iter()
            .map(|o| o.as_ref().and_then(Outcome::fitness))
            .collect()
    }

    /// Value the bundled strategies rank by: the fitness of a single-objective individual, the
    /// mean of the objectives otherwise. `None` when any objective has no fitness.
    pub fn score(&self) -> Option<f64> {
        let objectives = self.objectives();
        if objectives.is_empty() {
            return None;
        }
        let sum: f64 = objectives.iter().copied().sum::<Option<f64>>()?;
        Some(sum / objectives.len() as f64)
    }

    /// Behavior of a single-objective individual, `None` in lockstep with fitness.
    pub fn behavior(&self) -> Option<BehaviorMeasurements> {
        match self.outcomes.as_slice() {
            [Some(outcome)] => outcome.behavior(),
            _ => None,
        }
    }

    /// Whether every phenotype has an outcome attached.
    pub fn is_evaluated(&self) -> bool {
        self.outcomes.iter().all(Option::is_some)
    }

    /// Whether some phenotype still needs to be (re-)evaluated.
    pub(crate) fn needs_evaluation(&self) -> bool {
        self.outcomes.iter().any(|o| o.is_none())
    }

    pub(crate) fn evaluation_slots(&mut self) -> impl Iterator<Item = (&mut G::Phenotype, &mut Option<Outcome>)> {
        self.phenotypes.iter_mut().zip(self.outcomes.iter_mut())
    }
}

impl<G: Genotype + fmt::Debug> fmt::Debug for Individual<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Individual")
            .field("id", &self.id())
            .field("genotype", &self.genotype)
            .field("phenotypes", &self.phenotypes.len())
            .field("parents", &self.parents)
            .field("outcomes", &self.outcomes)
            .finish()
    }
}

/// Persisted form of an individual. Phenotypes are not stored; they are developed again
/// from the genotype on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord<G> {
    pub id: IndividualId,
    pub genotype: G,
    pub parents: Vec<IndividualId>,
    pub outcomes: Vec<Option<Outcome>>,
}

impl<G: Genotype> From<&Individual<G>> for IndividualRecord<G> {
    fn from(individual: &Individual<G>) -> Self {
        Self {
            id: individual.id(),
            genotype: individual.genotype.clone(),
            parents: individual.parents.clone(),
            outcomes: individual.outcomes.clone(),
        }
    }
}
