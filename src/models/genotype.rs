use super::{BoundingBox, IndividualId, Vector3};

/// Heritable encoding of an individual.
///
/// The representation itself is opaque to the engine. It only needs to carry the id
/// assigned by the population, so offspring cloned from a parent can be renumbered.
pub trait Genotype: Clone + Send + Sync {
    /// The evaluable artifact obtained by developing the genotype.
    type Phenotype: Phenotype;

    fn id(&self) -> IndividualId;

    fn set_id(&mut self, id: IndividualId);
}

/// A developed body and controller that the simulator can run.
pub trait Phenotype: Send + Sync {
    /// Name under which the phenotype is submitted to the simulator.
    fn name(&self) -> String;

    /// Serializes the phenotype into the simulator's description format, placed at `pose`.
    fn describe(&self, name: &str, pose: Vector3) -> Result<String, anyhow::Error>;

    /// Bounding box of the body, when known.
    fn bounding_box(&self) -> Option<BoundingBox> {
        None
    }

    fn set_bounding_box(&mut self, _bounding_box: BoundingBox) {}

    /// Target direction of a directed controller, when it has one.
    fn target(&self) -> Option<Vector3> {
        None
    }

    /// Communicates a target direction to the controller before a directed trial.
    fn set_target(&mut self, _target: Vector3) {}
}
