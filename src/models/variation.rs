use super::{EvolutionRng, Genotype, Individual, IndividualId};

/// Builds a fresh genotype for the initial population.
pub trait GenotypeConstructor<G>: Send + Sync {
    fn construct(&self, id: IndividualId, rng: &mut EvolutionRng) -> G;
}

/// Mutates a child genotype. The id set by the caller must be preserved.
pub trait Mutation<G>: Send + Sync {
    fn mutate(&self, genotype: G, rng: &mut EvolutionRng) -> G;
}

/// Recombines the genotypes of selected parents into a child genotype.
pub trait Crossover<G: Genotype>: Send + Sync {
    fn crossover(&self, parents: &[&Individual<G>], rng: &mut EvolutionRng) -> G;
}

/// Decodes a genotype into the phenotypes the simulator evaluates.
///
/// Returns one phenotype for single-objective runs and one per objective otherwise.
pub trait Develop<G: Genotype>: Send + Sync {
    fn develop(&self, genotype: &G) -> Vec<G::Phenotype>;
}
