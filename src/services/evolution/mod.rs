mod errors;
mod evolution;

pub use errors::Error;
pub use evolution::Evolution;
