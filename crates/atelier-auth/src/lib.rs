pub mod errors;
pub mod gate;
pub mod role;
pub mod route;
pub mod session;
pub mod prelude;

pub use gate::{AccessGate, GateDecision};
