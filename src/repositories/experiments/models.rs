use super::Error;
use crate::models::{IndividualId, IndividualRecord};
use serde::de::DeserializeOwned;

#[derive(Debug, sqlx::FromRow)]
pub(super) struct DbIndividual {
    pub(super) id: i64,
    pub(super) genotype: serde_json::Value,
    pub(super) parents: Vec<i64>,
    pub(super) outcomes: Option<serde_json::Value>,
}

impl<G: DeserializeOwned> TryFrom<DbIndividual> for IndividualRecord<G> {
    type Error = Error;

    fn try_from(individual: DbIndividual) -> Result<Self, Self::Error> {
        let genotype = serde_json::from_value(individual.genotype)?;
        let outcomes = match individual.outcomes {
            Some(outcomes) => serde_json::from_value(outcomes)?,
            None => Vec::new(),
        };

        Ok(IndividualRecord {
            id: IndividualId(individual.id),
            genotype,
            parents: individual.parents.into_iter().map(IndividualId).collect(),
            outcomes,
        })
    }
}
