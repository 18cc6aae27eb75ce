mod errors;
mod models;
mod queries;
mod repository;

pub use errors::Error;
pub use models::Task;
pub use repository::Repository;
