use super::selector::compare_fitness;
use super::{EvolutionRng, Genotype, Individual, Selection, SelectionError};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::instrument;

/// Chooses the survivors of a generation out of the old population and the new offspring.
///
/// Implementations must return exactly `old.len()` individuals and must rank individuals
/// with a `None` score below every evaluated one.
pub trait PopulationManagement<G: Genotype>: Send + Sync {
    fn replace(
        &self,
        old: Vec<Individual<G>>,
        new: Vec<Individual<G>>,
        selector: Option<&dyn Selection<G>>,
        rng: &mut EvolutionRng,
    ) -> Result<Vec<Individual<G>>, SelectionError>;
}

/// Steady-state truncation: the best `old.len()` individuals of `old ∪ new` survive, ranked
/// by [`Individual::score`].
///
/// When candidates tie on the cut-off score, the selector decides which of them survive;
/// without a selector the earliest created individuals are kept. Survivors are returned in
/// creation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteadyState;

impl<G: Genotype> PopulationManagement<G> for SteadyState {
    #[instrument(level = "debug", skip_all, fields(num_old = old.len(), num_new = new.len(), tie_break = selector.is_some()))]
    fn replace(
        &self,
        old: Vec<Individual<G>>,
        new: Vec<Individual<G>>,
        selector: Option<&dyn Selection<G>>,
        rng: &mut EvolutionRng,
    ) -> Result<Vec<Individual<G>>, SelectionError> {
        let target = old.len();
        if target == 0 {
            return Err(SelectionError::NoCandidates);
        }
        let mut pool = old;
        pool.extend(new);

        if pool.len() <= target {
            return Ok(pool);
        }

        // Stable sort keeps creation order among equals
        let mut ranked: Vec<&Individual<G>> = pool.iter().collect();
        ranked.sort_by(|lhs, rhs| compare_fitness(rhs.score(), lhs.score()));

        let cutoff = ranked[target - 1].score();
        let (better, rest): (Vec<&Individual<G>>, Vec<&Individual<G>>) = ranked
            .into_iter()
            .partition(|i| compare_fitness(i.score(), cutoff) == Ordering::Greater);
        let tied: Vec<&Individual<G>> = rest
            .into_iter()
            .filter(|i| compare_fitness(i.score(), cutoff) == Ordering::Equal)
            .collect();

        let slots = target - better.len();
        let mut survivors: HashSet<_> = better.iter().map(|i| i.id()).collect();

        match selector {
            Some(selector) if tied.len() > slots => {
                let mut remaining = tied;
                for _ in 0..slots {
                    let winner = selector.select(&remaining, rng)?;
                    let winner_id = winner.id();
                    remaining.retain(|i| i.id() != winner_id);
                    survivors.insert(winner_id);
                }
            }
            _ => {
                let mut tied = tied;
                tied.sort_by_key(|i| i.id());
                survivors.extend(tied.into_iter().take(slots).map(|i| i.id()));
            }
        }

        let mut next: Vec<Individual<G>> = pool
            .into_iter()
            .filter(|i| survivors.contains(&i.id()))
            .collect();
        next.sort_by_key(|i| i.id());

        Ok(next)
    }
}
