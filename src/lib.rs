pub mod bootstrap;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod services;

#[cfg(test)]
mod testing;

pub use services::evaluation::{EvaluationClient, EvaluationClientBuilder};
pub use services::evolution::Evolution;
pub use services::population::{Population, PopulationConfig, PopulationConfigBuilder};
