mod behavior;
mod experiment;
mod fitness;
mod genotype;
mod individual;
mod outcome;
mod replacement;
mod selector;
mod settings;
mod trajectory;
mod variation;
mod vector;

pub use behavior::BehaviorMeasurements;
pub use experiment::ExperimentManagement;
pub use fitness::{DirectedLocomotion, DisplacementVelocity, FitnessFunction, Objectives};
pub use genotype::{Genotype, Phenotype};
pub use individual::{Individual, IndividualId, IndividualRecord};
pub use outcome::{DISCARDED_FITNESS, NO_TELEMETRY_FITNESS, Outcome};
pub use replacement::{PopulationManagement, SteadyState};
pub use selector::{
    DistinctSelection, ParentSelection, Selection, SelectionError, Tournament, compare_fitness,
};
pub use settings::{EvaluationConfig, EvaluationConfigError, PopulationSettings, SettingsError};
pub use trajectory::{SimTime, StateSample, Trajectory};
pub use variation::{Crossover, Develop, GenotypeConstructor, Mutation};
pub use vector::{BoundingBox, Vector3};

/// Random source threaded through every stochastic strategy of a run.
pub type EvolutionRng = rand::rngs::StdRng;
