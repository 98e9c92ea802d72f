use std::{error::Error as StdError, sync::Arc};

use crate::{Access, Endpoint, NodeId};

/// The error returned by a failing [`Factory`](crate::Factory).
pub type FactoryFailure = Box<dyn StdError + Send + Sync>;

/// Errors that abort topology assembly.
///
/// Every variant describes a mistake in the scenario definition and carries the
/// identifiers needed to find the offending declaration. None of them are
/// transient, so none are retried.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("no factory is registered for component type `{type_name}`")]
    UnknownComponentType { type_name: String },

    #[error("factory for `{type_name}` failed: {source}")]
    Factory {
        type_name: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    #[error("a node with id `{id}` already exists")]
    DuplicateNodeId { id: NodeId },

    #[error("node `{node}` was not created by this assembler")]
    ForeignNode { node: NodeId },

    #[error("`{attribute}` is not an attribute of `{node}` (type `{kind}`)")]
    UnknownAttribute {
        node: NodeId,
        kind: &'static str,
        attribute: String,
    },

    #[error("attribute `{attribute}` of `{node}` does not allow {expected} access")]
    WrongDirection {
        node: NodeId,
        attribute: String,
        expected: Access,
    },

    #[error("shifted edge `{from}` -> `{to}` requires a seed")]
    MissingSeed { from: Endpoint, to: Endpoint },

    #[error("same-step edge `{from}` -> `{to}` cannot carry a seed")]
    UnexpectedSeed { from: Endpoint, to: Endpoint },

    #[error("same-step edge `{from}` -> `{to}` closes a dependency cycle; shift one edge of the cycle")]
    SameStepCycle { from: Endpoint, to: Endpoint },

    #[error("cannot wire `{node}` to {degree} of {available} candidates")]
    NotEnoughCandidates {
        node: NodeId,
        degree: usize,
        available: usize,
    },

    #[error("expected exactly one `{kind}` with suffix `{suffix}`, found {}", .matches.len())]
    AmbiguousOrMissingNode {
        kind: &'static str,
        suffix: String,
        matches: Vec<NodeId>,
    },

    #[error("node `{node}` has no data entry `{key}`")]
    MissingData { node: NodeId, key: String },

    #[error("invalid style for `{type_name}`: requires min <= default <= max, got {min} <= {default} <= {max}")]
    InvalidDescriptor {
        type_name: String,
        default: f64,
        min: f64,
        max: f64,
    },

    #[error("the edge set is sealed and cannot be changed")]
    BuilderSealed,
}
