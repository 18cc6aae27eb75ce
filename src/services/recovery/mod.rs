mod controller;
mod errors;

pub use controller::{RecoveryController, RecoveryState};
pub use errors::Error;
