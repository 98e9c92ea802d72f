//! Topology composition for time-stepped co-simulation.
//!
//! A co-simulation scenario is a set of independently stepped components whose
//! named attributes feed the attributes of other components. This crate builds
//! that topology and hands it, sealed, to an external simulation kernel:
//!
//! - [`Kind`]: a closed set of component types and the attribute slots each declares
//! - [`NodeRegistry`]: creates components through registered [`Factory`]s and
//!   resolves them by id, type, or id suffix
//! - [`EdgeBuilder`]: wires attribute slots, including fan-in and random
//!   fan-out, and breaks same-step feedback with seeded one-step delays
//! - [`StyleRegistry`]: presentation metadata consumed by a visualization sink
//! - [`Assembler`]: the composition root that drives all of the above and
//!   returns a [`Topology`]
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_core::{Access, Assembler, Entity, Kind, NodeRegistry};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Device {
//!     Source,
//!     Sink,
//! }
//!
//! impl Kind for Device {
//!     fn name(&self) -> &'static str {
//!         match self {
//!             Device::Source => "Source",
//!             Device::Sink => "Sink",
//!         }
//!     }
//!
//!     fn attributes(&self) -> &'static [(&'static str, Access)] {
//!         match self {
//!             Device::Source => &[("out", Access::Read)],
//!             Device::Sink => &[("in", Access::Write)],
//!         }
//!     }
//! }
//!
//! let mut registry = NodeRegistry::new();
//! registry.register_fn("Source", |_| Ok(Entity::new("src", Device::Source)));
//! registry.register_fn("Sink", |_| Ok(Entity::new("dst", Device::Sink)));
//!
//! let mut assembler = Assembler::seeded(registry, 23);
//! let source = assembler.create("Source", &json!({})).unwrap();
//! let sink = assembler.create("Sink", &json!({})).unwrap();
//! assembler.connect(&source, &sink, [("out", "in")]).unwrap();
//!
//! let topology = assembler.finish().unwrap();
//! assert_eq!(topology.nodes().len(), 2);
//! assert_eq!(topology.edges().len(), 1);
//! ```

mod assembler;
mod attribute;
mod builder;
mod edge;
mod error;
mod graph;
mod node;
mod registry;
mod style;
mod topology;

pub use assembler::Assembler;
pub use attribute::{Access, AttrPair, Kind};
pub use builder::{DuplicateEdgeWarning, EdgeBuilder};
pub use edge::{Delay, Edge, Endpoint, Seed};
pub use error::{Error, FactoryFailure};
pub use graph::DependencyGraph;
pub use node::{Entity, Factory, FactoryArgs, Node, NodeId};
pub use registry::NodeRegistry;
pub use style::{StyleDescriptor, StyleRegistry};
pub use topology::Topology;
