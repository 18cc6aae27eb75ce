//! Test doubles shared by the unit tests.

use crate::models::{
    BehaviorMeasurements, Crossover, Develop, EvolutionRng, ExperimentManagement, Genotype,
    BoundingBox, GenotypeConstructor, Individual, IndividualId, IndividualRecord, Mutation,
    Outcome, Phenotype, SimTime, StateSample, Trajectory, Vector3,
};
use crate::services::evaluation::{BodyAnalysis, BodyAnalyzer, Broker, RemoteId, ResultStore};
use futures::future::BoxFuture;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TestGenotype {
    pub(crate) id: IndividualId,
    pub(crate) value: f64,
}

impl TestGenotype {
    pub(crate) fn new(id: IndividualId, value: f64) -> Self {
        Self { id, value }
    }
}

impl Genotype for TestGenotype {
    type Phenotype = TestPhenotype;

    fn id(&self) -> IndividualId {
        self.id
    }

    fn set_id(&mut self, id: IndividualId) {
        self.id = id;
    }
}

/// Robot that the test simulator moves `value` meters along x in one second.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestPhenotype {
    name: String,
    value: f64,
    target: Option<Vector3>,
    bounding_box: Option<BoundingBox>,
}

impl TestPhenotype {
    pub(crate) fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            target: None,
            bounding_box: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Description {
    name: String,
    value: f64,
    z: f64,
}

impl Phenotype for TestPhenotype {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn describe(&self, name: &str, pose: Vector3) -> Result<String, anyhow::Error> {
        Ok(serde_json::to_string(&Description {
            name: name.to_string(),
            value: self.value,
            z: pose.z,
        })?)
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    fn set_bounding_box(&mut self, bounding_box: BoundingBox) {
        self.bounding_box = Some(bounding_box);
    }

    fn target(&self) -> Option<Vector3> {
        self.target
    }

    fn set_target(&mut self, target: Vector3) {
        self.target = Some(target);
    }
}

/// An individual with a single recorded outcome: measured when `fitness` is set, failed
/// otherwise.
pub(crate) fn evaluated(id: i64, fitness: Option<f64>) -> Individual<TestGenotype> {
    let outcome = match fitness {
        Some(fitness) => Outcome::measured(fitness, BehaviorMeasurements::zero()),
        None => Outcome::Failed,
    };
    Individual::restore(
        TestGenotype::new(IndividualId(id), fitness.unwrap_or_default()),
        vec![TestPhenotype::new(&format!("robot_{id}"), 0.0)],
        vec![],
        vec![Some(outcome)],
    )
}

/// A multi-objective individual with one outcome per entry of `objectives`.
pub(crate) fn evaluated_objectives(id: i64, objectives: &[Option<f64>]) -> Individual<TestGenotype> {
    let outcomes = objectives
        .iter()
        .map(|fitness| {
            Some(match fitness {
                Some(fitness) => Outcome::measured(*fitness, BehaviorMeasurements::zero()),
                None => Outcome::Failed,
            })
        })
        .collect();
    Individual::restore(
        TestGenotype::new(IndividualId(id), 0.0),
        objectives
            .iter()
            .map(|_| TestPhenotype::new(&format!("robot_{id}"), 0.0))
            .collect(),
        vec![],
        outcomes,
    )
}

pub(crate) struct RandomConstructor;

impl GenotypeConstructor<TestGenotype> for RandomConstructor {
    fn construct(&self, id: IndividualId, rng: &mut EvolutionRng) -> TestGenotype {
        TestGenotype::new(id, rng.random_range(0.0..10.0))
    }
}

pub(crate) struct Nudge;

impl Mutation<TestGenotype> for Nudge {
    fn mutate(&self, mut genotype: TestGenotype, rng: &mut EvolutionRng) -> TestGenotype {
        genotype.value += rng.random_range(-1.0..1.0);
        genotype
    }
}

pub(crate) struct Average;

impl Crossover<TestGenotype> for Average {
    fn crossover(
        &self,
        parents: &[&Individual<TestGenotype>],
        _: &mut EvolutionRng,
    ) -> TestGenotype {
        let value =
            parents.iter().map(|p| p.genotype().value).sum::<f64>() / parents.len().max(1) as f64;
        TestGenotype::new(parents[0].id(), value)
    }
}

/// Develops `objectives` identical robots named after the genotype id.
pub(crate) struct Robots {
    pub(crate) objectives: usize,
}

impl Develop<TestGenotype> for Robots {
    fn develop(&self, genotype: &TestGenotype) -> Vec<TestPhenotype> {
        (0..self.objectives)
            .map(|_| TestPhenotype::new(&format!("robot_{}", genotype.id), genotype.value.abs()))
            .collect()
    }
}

/// What the test simulator does with the next submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
    /// Acknowledges and records a trajectory
    Succeed,
    /// Acknowledges without recording samples
    Silent,
    /// Never acknowledges
    Hang,
    /// Fails the submission
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Submission {
    pub(crate) name: String,
    pub(crate) z: f64,
}

#[derive(Default)]
struct SimulatorState {
    script: VecDeque<Step>,
    submissions: Vec<Submission>,
    trajectories: HashMap<RemoteId, Trajectory>,
    next_remote_id: RemoteId,
}

/// In-memory simulator behind a broker and a result store. Follows the script, then
/// succeeds on every later submission.
#[derive(Clone, Default)]
pub(crate) struct TestSimulator {
    state: Arc<Mutex<SimulatorState>>,
}

impl TestSimulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(&self, steps: impl IntoIterator<Item = Step>) {
        self.state.lock().unwrap().script.extend(steps);
    }

    pub(crate) fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub(crate) fn broker(&self) -> TestBroker {
        TestBroker(self.clone())
    }

    pub(crate) fn results(&self) -> TestResults {
        TestResults(self.clone())
    }

    fn accept(&self, description: &str) -> Result<Option<RemoteId>, anyhow::Error> {
        let description: Description = serde_json::from_str(description)?;
        let mut state = self.state.lock().unwrap();
        let step = state.script.pop_front().unwrap_or(Step::Succeed);
        state.submissions.push(Submission {
            name: description.name,
            z: description.z,
        });

        match step {
            Step::Hang => Ok(None),
            Step::Reject => Err(anyhow::anyhow!("simulator unavailable")),
            Step::Silent | Step::Succeed => {
                state.next_remote_id += 1;
                let remote_id = state.next_remote_id;
                let samples = if step == Step::Succeed {
                    vec![
                        StateSample::new(SimTime::new(0, 0), Vector3::new(0.0, 0.0, description.z)),
                        StateSample::new(
                            SimTime::new(1, 0),
                            Vector3::new(description.value, 0.0, description.z),
                        ),
                    ]
                } else {
                    vec![]
                };
                state.trajectories.insert(remote_id, Trajectory::new(samples));
                Ok(Some(remote_id))
            }
        }
    }
}

pub(crate) struct TestBroker(TestSimulator);

impl Broker for TestBroker {
    fn submit<'a>(
        &'a self,
        _robot_name: &'a str,
        description: String,
        _life_timeout: f64,
    ) -> BoxFuture<'a, Result<RemoteId, anyhow::Error>> {
        Box::pin(async move {
            match self.0.accept(&description)? {
                Some(remote_id) => Ok(remote_id),
                None => futures::future::pending().await,
            }
        })
    }
}

pub(crate) struct TestResults(TestSimulator);

impl ResultStore for TestResults {
    fn query(
        &self,
        remote_id: RemoteId,
        _run_marker: i32,
    ) -> BoxFuture<'_, Result<Trajectory, anyhow::Error>> {
        Box::pin(async move {
            let state = self.0.state.lock().unwrap();
            Ok(state
                .trajectories
                .get(&remote_id)
                .cloned()
                .unwrap_or_else(|| Trajectory::new(vec![])))
        })
    }
}

pub(crate) struct FixedAnalyzer(pub(crate) BodyAnalysis);

impl BodyAnalyzer for FixedAnalyzer {
    fn analyze<'a>(
        &'a self,
        _description: &'a str,
    ) -> BoxFuture<'a, Result<BodyAnalysis, anyhow::Error>> {
        Box::pin(async move { Ok(self.0) })
    }
}

#[derive(Default)]
struct ExperimentState {
    individuals: BTreeMap<IndividualId, IndividualRecord<TestGenotype>>,
    phenotypes: Vec<(IndividualId, String)>,
    behaviors: Vec<(IndividualId, Option<usize>)>,
    snapshots: BTreeMap<u32, Vec<IndividualId>>,
}

/// Experiment store kept in memory. Clones share the same state, so a test can inspect
/// what a run exported or resume a run from it.
#[derive(Clone, Default)]
pub(crate) struct InMemoryExperiment {
    state: Arc<Mutex<ExperimentState>>,
}

impl InMemoryExperiment {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn snapshot(&self, generation: u32) -> Option<Vec<IndividualId>> {
        self.state.lock().unwrap().snapshots.get(&generation).cloned()
    }

    pub(crate) fn individual_ids(&self) -> Vec<IndividualId> {
        self.state.lock().unwrap().individuals.keys().copied().collect()
    }

    pub(crate) fn record(&self, id: IndividualId) -> Option<IndividualRecord<TestGenotype>> {
        self.state.lock().unwrap().individuals.get(&id).cloned()
    }

    pub(crate) fn phenotype_count(&self) -> usize {
        self.state.lock().unwrap().phenotypes.len()
    }

    pub(crate) fn behavior_count(&self) -> usize {
        self.state.lock().unwrap().behaviors.len()
    }

    /// Forgets the snapshot of `generation`, as after a crash right before it was written.
    pub(crate) fn drop_snapshot(&self, generation: u32) {
        self.state.lock().unwrap().snapshots.remove(&generation);
    }

    /// Forgets the outcomes of an individual, as after a crash during its evaluation.
    pub(crate) fn clear_outcomes(&self, id: IndividualId) {
        if let Some(record) = self.state.lock().unwrap().individuals.get_mut(&id) {
            record.outcomes.clear();
        }
    }

    fn store_outcomes(&self, individual: &Individual<TestGenotype>) -> Result<(), anyhow::Error> {
        let mut state = self.state.lock().unwrap();
        let record = state
            .individuals
            .entry(individual.id())
            .or_insert_with(|| IndividualRecord::from(individual));
        record.outcomes = individual.outcomes().to_vec();
        Ok(())
    }
}

impl ExperimentManagement<TestGenotype> for InMemoryExperiment {
    fn export_genotype<'a>(
        &'a self,
        individual: &'a Individual<TestGenotype>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move {
            let mut record = IndividualRecord::from(individual);
            record.outcomes.clear();
            self.state
                .lock()
                .unwrap()
                .individuals
                .insert(individual.id(), record);
            Ok(())
        })
    }

    fn export_phenotype<'a>(
        &'a self,
        individual: &'a Individual<TestGenotype>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            for phenotype in individual.phenotypes() {
                state.phenotypes.push((individual.id(), phenotype.name()));
            }
            Ok(())
        })
    }

    fn export_fitness<'a>(
        &'a self,
        individual: &'a Individual<TestGenotype>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move { self.store_outcomes(individual) })
    }

    fn export_objectives<'a>(
        &'a self,
        individual: &'a Individual<TestGenotype>,
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move { self.store_outcomes(individual) })
    }

    fn export_behavior_measures(
        &self,
        id: IndividualId,
        objective: Option<usize>,
        _behavior: Option<BehaviorMeasurements>,
    ) -> BoxFuture<'_, Result<(), anyhow::Error>> {
        Box::pin(async move {
            self.state.lock().unwrap().behaviors.push((id, objective));
            Ok(())
        })
    }

    fn export_snapshot<'a>(
        &'a self,
        generation: u32,
        individuals: &'a [Individual<TestGenotype>],
    ) -> BoxFuture<'a, Result<(), anyhow::Error>> {
        Box::pin(async move {
            let ids = individuals.iter().map(|i| i.id()).collect();
            self.state.lock().unwrap().snapshots.insert(generation, ids);
            Ok(())
        })
    }

    fn load_snapshot(
        &self,
        generation: u32,
    ) -> BoxFuture<'_, Result<Vec<IndividualRecord<TestGenotype>>, anyhow::Error>> {
        Box::pin(async move {
            let state = self.state.lock().unwrap();
            let ids = state
                .snapshots
                .get(&generation)
                .ok_or_else(|| anyhow::anyhow!("no snapshot for generation {generation}"))?;
            ids.iter()
                .map(|id| {
                    state
                        .individuals
                        .get(id)
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("unknown individual {id}"))
                })
                .collect()
        })
    }

    fn load_individual(
        &self,
        id: IndividualId,
    ) -> BoxFuture<'_, Result<IndividualRecord<TestGenotype>, anyhow::Error>> {
        Box::pin(async move {
            self.record(id)
                .ok_or_else(|| anyhow::anyhow!("unknown individual {id}"))
        })
    }

    fn last_snapshot(&self) -> BoxFuture<'_, Result<Option<u32>, anyhow::Error>> {
        Box::pin(async move {
            Ok(self.state.lock().unwrap().snapshots.keys().next_back().copied())
        })
    }

    fn last_individual_id(&self) -> BoxFuture<'_, Result<Option<IndividualId>, anyhow::Error>> {
        Box::pin(async move {
            Ok(self.state.lock().unwrap().individuals.keys().next_back().copied())
        })
    }

    fn reset(&self) -> BoxFuture<'_, Result<(), anyhow::Error>> {
        Box::pin(async move {
            *self.state.lock().unwrap() = ExperimentState::default();
            Ok(())
        })
    }
}
