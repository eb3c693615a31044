//! Testing infrastructure for playlog integration tests.
//!
//! - `TestWorld`: isolated data directory plus a configured CLI runner
//! - `fixtures`: server log builders, plain and gzip
//! - `assertions`: checks against the on-disk record store and archives

pub mod assertions;
pub mod fixtures;
pub mod world;

pub use fixtures::ServerLog;
pub use world::{CliResult, TestWorld};
