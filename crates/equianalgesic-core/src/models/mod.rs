//! Domain models for the conversion engine.

mod outcome;
mod route_key;
mod rule;

pub use outcome::*;
pub use route_key::*;
pub use rule::*;
