//! Smart-grid and edge-computing scenarios.
//!
//! Each variant wires PV systems, batteries, compute nodes and households to a
//! low-voltage grid and fans their readings into a database and a web
//! visualization. The result is a sealed [`Topology`] ready for a simulation
//! kernel.

mod config;
mod error;
pub mod monolithic;
pub mod separate;
pub mod single;
mod styles;
mod wiring;

pub use config::{ComputeConfig, ScenarioConfig};
pub use error::{ConfigError, ScenarioError};

use std::fmt;

use clap::ValueEnum;
use trellis_components::ComponentKind;
use trellis_core::Topology;

/// The scenario variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// One site on the power node of a customized grid.
    Monolithic,
    /// One site on a PQ bus chosen by name.
    Single,
    /// Households, randomly placed PV and an edge node.
    Separate,
}

impl Variant {
    /// Assembles this variant's topology.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if assembly fails.
    pub fn assemble(self, config: &ScenarioConfig) -> Result<Topology<ComponentKind>, ScenarioError> {
        match self {
            Variant::Monolithic => monolithic::assemble(config),
            Variant::Single => single::assemble(config),
            Variant::Separate => separate::assemble(config),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Monolithic => f.write_str("monolithic"),
            Variant::Single => f.write_str("single"),
            Variant::Separate => f.write_str("separate"),
        }
    }
}
