//! batchmake-lib: batch builds across a tree of independent projects.
//!
//! - `target`: discover build targets by marker file
//! - `runner`: build every target in order with fail-fast propagation
//! - `pipeline`: chain whole-tree steps into a publish checklist
//! - `treediff`: compare two directory trees
//! - `config`: `batchmake.toml` loading

pub mod config;
pub mod consts;
pub mod pipeline;
pub mod process;
pub mod runner;
pub mod target;
pub mod treediff;
