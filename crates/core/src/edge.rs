use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// The value a shifted edge delivers before the first delayed value exists.
///
/// Stored and handed to the kernel verbatim, e.g. `{"battery_action": "charge:0"}`.
pub type Seed = serde_json::Value;

/// When a value travels along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Delay {
    /// Delivered within the step it was produced.
    #[default]
    SameStep,

    /// Delivered one step later; the first step receives the edge's seed.
    OneStepShifted,
}

/// One end of an edge: an attribute slot on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub attribute: String,
}

impl Endpoint {
    #[must_use]
    pub fn new(node: impl Into<NodeId>, attribute: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.attribute)
    }
}

/// A directed wiring from one attribute slot to another.
///
/// A seed is present exactly when the delay is [`Delay::OneStepShifted`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: Endpoint,
    pub destination: Endpoint,
    pub delay: Delay,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<Seed>,
}

impl Edge {
    /// Returns `true` if both edges wire the same pair of slots.
    ///
    /// Delay and seed are ignored; two declarations of the same wiring are
    /// duplicates even if one of them is shifted.
    #[must_use]
    pub fn same_wiring(&self, other: &Edge) -> bool {
        self.source == other.source && self.destination == other.destination
    }

    #[must_use]
    pub fn is_shifted(&self) -> bool {
        self.delay == Delay::OneStepShifted
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delay {
            Delay::SameStep => write!(f, "{} -> {}", self.source, self.destination),
            Delay::OneStepShifted => write!(f, "{} ~> {}", self.source, self.destination),
        }
    }
}
