//! Selection strategies.
//!
//! A [`Selection`] picks one individual out of a candidate pool, a [`ParentSelection`]
//! picks the parents handed to a crossover operator. Both tolerate individuals whose
//! evaluation never completed: a `None` score ranks below every value.

use super::{EvolutionRng, Genotype, Individual};
use rand::Rng;
use std::cmp::Ordering;
use tracing::instrument;

/// Orders two fitness values, treating `None` as the minimal rank.
pub fn compare_fitness(lhs: Option<f64>, rhs: Option<f64>) -> Ordering {
    match (lhs, rhs) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(lhs), Some(rhs)) => lhs.total_cmp(&rhs),
    }
}

/// Errors that can occur during selection.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum SelectionError {
    #[error("No candidates available for selection")]
    NoCandidates,
    #[error("Cannot select {requested} distinct individuals out of {available}")]
    NotEnoughCandidates { requested: usize, available: usize },
    #[error("Tournament size must be at least 1")]
    InvalidTournamentSize,
}

/// Picks a single individual.
pub trait Selection<G: Genotype>: Send + Sync {
    fn select<'a>(
        &self,
        candidates: &[&'a Individual<G>],
        rng: &mut EvolutionRng,
    ) -> Result<&'a Individual<G>, SelectionError>;
}

/// Picks the parents of one child.
pub trait ParentSelection<G: Genotype>: Send + Sync {
    fn select_parents<'a>(
        &self,
        candidates: &[&'a Individual<G>],
        rng: &mut EvolutionRng,
    ) -> Result<Vec<&'a Individual<G>>, SelectionError>;
}

/// Tournament selection: draws `size` candidates with replacement and keeps the one with the
/// best [`Individual::score`].
///
/// The first drawn candidate wins ties, so the result only depends on the random source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tournament {
    size: usize,
}

impl Tournament {
    pub fn new(size: usize) -> Result<Self, SelectionError> {
        if size == 0 {
            return Err(SelectionError::InvalidTournamentSize);
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl<G: Genotype> Selection<G> for Tournament {
    #[instrument(level = "debug", skip(self, candidates, rng), fields(tournament_size = self.size, num_candidates = candidates.len()))]
    fn select<'a>(
        &self,
        candidates: &[&'a Individual<G>],
        rng: &mut EvolutionRng,
    ) -> Result<&'a Individual<G>, SelectionError> {
        if candidates.is_empty() {
            return Err(SelectionError::NoCandidates);
        }

        let mut winner = candidates[rng.random_range(0..candidates.len())];
        for _ in 1..self.size {
            let challenger = candidates[rng.random_range(0..candidates.len())];
            if compare_fitness(challenger.score(), winner.score()) == Ordering::Greater {
                winner = challenger;
            }
        }

        Ok(winner)
    }
}

/// Selects `count` distinct individuals by running a selection repeatedly, removing each
/// winner from the pool before the next round.
pub struct DistinctSelection<G: Genotype> {
    count: usize,
    selection: Box<dyn Selection<G>>,
}

impl<G: Genotype> DistinctSelection<G> {
    pub fn new(count: usize, selection: impl Selection<G> + 'static) -> Self {
        Self {
            count,
            selection: Box::new(selection),
        }
    }
}

impl<G: Genotype> ParentSelection<G> for DistinctSelection<G> {
    #[instrument(level = "debug", skip(self, candidates, rng), fields(count = self.count, num_candidates = candidates.len()))]
    fn select_parents<'a>(
        &self,
        candidates: &[&'a Individual<G>],
        rng: &mut EvolutionRng,
    ) -> Result<Vec<&'a Individual<G>>, SelectionError> {
        if candidates.len() < self.count {
            return Err(SelectionError::NotEnoughCandidates {
                requested: self.count,
                available: candidates.len(),
            });
        }

        let mut pool: Vec<&'a Individual<G>> = candidates.to_vec();
        let mut selected = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let winner = self.selection.select(&pool, rng)?;
            pool.retain(|candidate| candidate.id() != winner.id());
            selected.push(winner);
        }

        Ok(selected)
    }
}
