pub mod experiments;
pub mod states;
pub mod tasks;
