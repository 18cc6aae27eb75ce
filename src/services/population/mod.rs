mod config;
mod errors;
mod population;

pub use config::{PopulationConfig, PopulationConfigBuilder};
pub use errors::Error;
pub use population::Population;
