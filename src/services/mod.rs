pub mod evaluation;
pub mod evolution;
pub mod lock;
pub mod population;
pub mod recovery;
