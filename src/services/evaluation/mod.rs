mod client;
mod client_builder;
mod errors;
mod pool;
mod protocol;

pub use client::EvaluationClient;
pub use client_builder::EvaluationClientBuilder;
pub use errors::Error;
pub use protocol::{BodyAnalysis, BodyAnalyzer, Broker, RemoteId, ResultStore};
