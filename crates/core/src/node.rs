use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize, ser::SerializeStruct};
use serde_json::{Map, Value};

use crate::{FactoryFailure, Kind};

/// Arguments handed to a [`Factory`] when a component is created.
///
/// A JSON value, normally an object of named parameters such as
/// `{"max_capacity": 7500}`. Factories that take no arguments accept
/// `Value::Null` or an empty object.
pub type FactoryArgs = Value;

/// The identifier of a component, unique across a topology.
///
/// Bus-like components follow the `"<prefix>-<suffix>"` convention, where the
/// suffix after the last `-` names the bus within its grid (e.g. `"0-node_a1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the token after the last `-`, if the id contains one.
    ///
    /// ```
    /// use trellis_core::NodeId;
    ///
    /// assert_eq!(NodeId::new("0-node_a1").suffix(), Some("node_a1"));
    /// assert_eq!(NodeId::new("grid-1-tr_pri").suffix(), Some("tr_pri"));
    /// assert_eq!(NodeId::new("PV_0").suffix(), None);
    /// ```
    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.0.rsplit_once('-').map(|(_, suffix)| suffix)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A component as produced by a [`Factory`], before it is registered.
///
/// Some factories produce a whole tree: a power grid yields its buses,
/// transformers and branches as children. Every entity in the tree becomes a
/// registered node.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<K> {
    pub id: String,
    pub kind: K,
    pub data: Map<String, Value>,
    pub children: Vec<Entity<K>>,
}

impl<K> Entity<K> {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: K) -> Self {
        Self {
            id: id.into(),
            kind,
            data: Map::new(),
            children: Vec::new(),
        }
    }

    /// Attaches a static data value readable during assembly.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Entity<K>) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Entity<K>>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Creates components of one type on behalf of an external simulator.
///
/// A factory is registered with a [`NodeRegistry`](crate::NodeRegistry) under
/// a type name. It assigns ids to the entities it creates; the registry rejects
/// ids that collide with components already registered.
///
/// Any `FnMut(&FactoryArgs) -> Result<Entity<K>, FactoryFailure>` closure is a
/// factory.
pub trait Factory<K: Kind> {
    /// Creates one entity (and its children) from the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid or the simulator behind
    /// the factory fails.
    fn create(&mut self, args: &FactoryArgs) -> Result<Entity<K>, FactoryFailure>;
}

impl<K, F> Factory<K> for F
where
    K: Kind,
    F: FnMut(&FactoryArgs) -> Result<Entity<K>, FactoryFailure>,
{
    fn create(&mut self, args: &FactoryArgs) -> Result<Entity<K>, FactoryFailure> {
        self(args)
    }
}

/// A registered component handle.
///
/// Handles are cheap to clone and are what the wiring operations take. The
/// type of a node never changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<K> {
    id: NodeId,
    kind: K,
    data: Map<String, Value>,
    children: Vec<NodeId>,
}

impl<K: Kind> Node<K> {
    pub(crate) fn new(
        id: NodeId,
        kind: K,
        data: Map<String, Value>,
        children: Vec<NodeId>,
    ) -> Self {
        Self {
            id,
            kind,
            data,
            children,
        }
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> K {
        self.kind
    }

    /// Static data attached by the factory, such as the bus a house is
    /// connected to.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Ids of the nodes created as children of this one, in creation order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl<K: Kind> Serialize for Node<K> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", self.kind.name())?;
        state.serialize_field("data", &self.data)?;
        state.serialize_field("children", &self.children)?;
        state.end()
    }
}
