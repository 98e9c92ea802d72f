use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::{Entity, Error, Factory, FactoryArgs, FactoryFailure, Kind, Node, NodeId};

/// Holds every component of a scenario, indexed by id.
///
/// Components are created through factories registered per type name. Nodes
/// are kept in creation order, which callers rely on for index-correlated
/// wiring (battery `i` paired with compute node `i`).
pub struct NodeRegistry<K: Kind> {
    factories: HashMap<String, Box<dyn Factory<K>>>,
    nodes: Vec<Node<K>>,
    index: HashMap<NodeId, usize>,
}

impl<K: Kind> NodeRegistry<K> {
    /// Creates a registry with no factories and no nodes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registers the factory that creates components of `type_name`.
    ///
    /// A later registration for the same type name replaces the earlier one.
    pub fn register_factory(
        &mut self,
        type_name: impl Into<String>,
        factory: impl Factory<K> + 'static,
    ) {
        self.factories.insert(type_name.into(), Box::new(factory));
    }

    /// Registers a closure as the factory for `type_name`.
    pub fn register_fn<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: FnMut(&FactoryArgs) -> Result<Entity<K>, FactoryFailure> + 'static,
    {
        self.register_factory(type_name, factory);
    }

    /// Returns `true` if a factory is registered for `type_name`.
    #[must_use]
    pub fn has_factory(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Creates a component (and any children) through the factory for `type_name`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownComponentType`] if no factory is registered for `type_name`.
    /// - [`Error::Factory`] if the factory fails.
    /// - [`Error::DuplicateNodeId`] if any created id is already taken; nothing
    ///   from the failed call is registered.
    pub fn create(&mut self, type_name: &str, args: &FactoryArgs) -> Result<Node<K>, Error> {
        let factory =
            self.factories
                .get_mut(type_name)
                .ok_or_else(|| Error::UnknownComponentType {
                    type_name: type_name.to_owned(),
                })?;

        let entity = factory.create(args).map_err(|source| Error::Factory {
            type_name: type_name.to_owned(),
            source: source.into(),
        })?;

        self.check_ids(&entity)?;
        Ok(self.insert(entity))
    }

    /// Creates `count` independent components of `type_name`.
    ///
    /// `per_instance` supplies the arguments for each instance by index. The
    /// returned nodes are in creation order.
    ///
    /// # Errors
    ///
    /// Fails on the first instance that fails, as [`create`](Self::create) does.
    pub fn create_many(
        &mut self,
        type_name: &str,
        count: usize,
        mut per_instance: impl FnMut(usize) -> FactoryArgs,
    ) -> Result<Vec<Node<K>>, Error> {
        (0..count)
            .map(|index| self.create(type_name, &per_instance(index)))
            .collect()
    }

    /// Returns all nodes for which `predicate(id, kind)` holds, in creation order.
    pub fn find(&self, predicate: impl Fn(&NodeId, K) -> bool) -> Vec<Node<K>> {
        self.nodes
            .iter()
            .filter(|node| predicate(node.id(), node.kind()))
            .cloned()
            .collect()
    }

    /// Returns all nodes of the given kind, in creation order.
    #[must_use]
    pub fn of_kind(&self, kind: K) -> Vec<Node<K>> {
        self.find(|_, candidate| candidate == kind)
    }

    /// Returns the unique node of `kind` whose id suffix equals `suffix`.
    ///
    /// The suffix is the token after the last `-` in the id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousOrMissingNode`] if no node or more than one
    /// node matches.
    pub fn resolve_by_suffix(&self, kind: K, suffix: &str) -> Result<Node<K>, Error> {
        let matches = self.find(|id, candidate| candidate == kind && id.suffix() == Some(suffix));

        match <[Node<K>; 1]>::try_from(matches) {
            Ok([node]) => Ok(node),
            Err(matches) => Err(Error::AmbiguousOrMissingNode {
                kind: kind.name(),
                suffix: suffix.to_owned(),
                matches: matches.into_iter().map(|node| node.id().clone()).collect(),
            }),
        }
    }

    /// Returns the unique bus whose id suffix equals `suffix`.
    ///
    /// Considers only nodes whose kind reports [`Kind::is_bus`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousOrMissingNode`] if no bus or more than one bus
    /// matches. Suffix collisions between unrelated grids are reported rather
    /// than resolved arbitrarily.
    pub fn resolve_bus_by_suffix(&self, suffix: &str) -> Result<Node<K>, Error> {
        let matches = self.find(|id, kind| kind.is_bus() && id.suffix() == Some(suffix));

        match <[Node<K>; 1]>::try_from(matches) {
            Ok([node]) => Ok(node),
            Err(matches) => Err(Error::AmbiguousOrMissingNode {
                kind: matches
                    .first()
                    .map_or("bus", |node| node.kind().name()),
                suffix: suffix.to_owned(),
                matches: matches.into_iter().map(|node| node.id().clone()).collect(),
            }),
        }
    }

    /// Returns the node with the given id, if registered.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Node<K>> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    /// Reads a static data entry attached to a node by its factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingData`] if the node has no entry for `key`.
    pub fn data<'a>(&self, node: &'a Node<K>, key: &str) -> Result<&'a Value, Error> {
        node.data().get(key).ok_or_else(|| Error::MissingData {
            node: node.id().clone(),
            key: key.to_owned(),
        })
    }

    /// All nodes, in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[Node<K>] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consumes the registry, returning its nodes in creation order.
    pub(crate) fn into_nodes(self) -> Vec<Node<K>> {
        self.nodes
    }

    /// Ensures no id in the entity tree is registered or repeated.
    fn check_ids(&self, entity: &Entity<K>) -> Result<(), Error> {
        let mut seen = HashSet::new();
        let mut pending = vec![entity];

        while let Some(entity) = pending.pop() {
            if self.index.contains_key(entity.id.as_str()) || !seen.insert(entity.id.as_str()) {
                return Err(Error::DuplicateNodeId {
                    id: NodeId::new(entity.id.as_str()),
                });
            }
            pending.extend(&entity.children);
        }

        Ok(())
    }

    /// Registers an entity and, after it, each of its children depth-first.
    fn insert(&mut self, entity: Entity<K>) -> Node<K> {
        let Entity {
            id,
            kind,
            data,
            children,
        } = entity;

        let id = NodeId::from(id);
        let child_ids = children
            .iter()
            .map(|child| NodeId::new(child.id.as_str()))
            .collect();

        let node = Node::new(id.clone(), kind, data, child_ids);
        debug!(node = %id, kind = kind.name(), "created node");
        self.index.insert(id, self.nodes.len());
        self.nodes.push(node.clone());

        for child in children {
            self.insert(child);
        }

        node
    }
}

impl<K: Kind> Default for NodeRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Access;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Grid {
        Grid,
        PqBus,
        RefBus,
        Pv,
    }

    impl Kind for Grid {
        fn name(&self) -> &'static str {
            match self {
                Grid::Grid => "Grid",
                Grid::PqBus => "PQBus",
                Grid::RefBus => "RefBus",
                Grid::Pv => "PV",
            }
        }

        fn attributes(&self) -> &'static [(&'static str, Access)] {
            match self {
                Grid::Grid => &[],
                Grid::PqBus | Grid::RefBus => &[("P", Access::ReadWrite), ("Vm", Access::Read)],
                Grid::Pv => &[("P", Access::Read)],
            }
        }

        fn is_bus(&self) -> bool {
            matches!(self, Grid::PqBus)
        }
    }

    /// Returns a registry whose "Grid" factory builds the buses named in `args`.
    fn registry() -> NodeRegistry<Grid> {
        let mut registry = NodeRegistry::new();

        let mut grids = 0;
        registry.register_fn("Grid", move |args| {
            let index = grids;
            grids += 1;
            let buses = args["buses"].as_array().ok_or("missing `buses`")?;
            let children = buses
                .iter()
                .map(|bus| -> Result<_, FactoryFailure> {
                    let name = bus.as_str().ok_or("bus names must be strings")?;
                    Ok(Entity::new(format!("{index}-{name}"), Grid::PqBus))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Entity::new(index.to_string(), Grid::Grid)
                .with_child(Entity::new(format!("{index}-tr_pri"), Grid::RefBus))
                .with_children(children))
        });

        let mut pvs = 0;
        registry.register_fn("PV", move |args| {
            let entity = Entity::new(format!("PV_{pvs}"), Grid::Pv)
                .with_data("peak", args.get("peak").cloned().unwrap_or(Value::Null));
            pvs += 1;
            Ok(entity)
        });

        registry
    }

    #[test]
    fn create_registers_entity_and_children() {
        let mut registry = registry();

        let grid = registry
            .create("Grid", &json!({"buses": ["node_a1", "node_a2"]}))
            .unwrap();

        assert_eq!(grid.id().as_str(), "0");
        assert_eq!(grid.kind(), Grid::Grid);
        assert_eq!(grid.children().len(), 3);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("0-node_a2").unwrap().kind(), Grid::PqBus);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut registry = registry();

        let error = registry.create("Battery", &json!({})).unwrap_err();

        assert!(matches!(
            error,
            Error::UnknownComponentType { type_name } if type_name == "Battery"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn factory_failures_are_wrapped() {
        let mut registry = registry();

        let error = registry.create("Grid", &json!({})).unwrap_err();

        assert!(matches!(&error, Error::Factory { type_name, .. } if type_name == "Grid"));
        assert_eq!(error.to_string(), "factory for `Grid` failed: missing `buses`");
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_ids_leave_the_registry_untouched() {
        let mut registry = NodeRegistry::new();
        registry.register_fn("PV", |_| Ok(Entity::new("PV_0", Grid::Pv)));
        registry.create("PV", &json!({})).unwrap();

        let error = registry.create("PV", &json!({})).unwrap_err();

        assert!(matches!(error, Error::DuplicateNodeId { id } if id.as_str() == "PV_0"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_children_are_rejected() {
        let mut registry = registry();

        let result = registry.create("Grid", &json!({"buses": ["node_a1", "node_a1"]}));

        assert!(matches!(result, Err(Error::DuplicateNodeId { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn create_many_preserves_creation_order() {
        let mut registry = registry();

        let pvs = registry
            .create_many("PV", 3, |index| json!({"peak": 1000 * (index + 1)}))
            .unwrap();

        let ids: Vec<_> = pvs.iter().map(|pv| pv.id().as_str()).collect();
        assert_eq!(ids, vec!["PV_0", "PV_1", "PV_2"]);
        assert_eq!(pvs[2].data()["peak"], 3000);
        assert_eq!(registry.data(&pvs[1], "peak").unwrap(), &json!(2000));
        assert!(matches!(
            registry.data(&pvs[1], "node_id"),
            Err(Error::MissingData { .. })
        ));
    }

    #[test]
    fn find_filters_by_id_and_kind() {
        let mut registry = registry();
        registry
            .create("Grid", &json!({"buses": ["node_a1", "node_b1", "house_1"]}))
            .unwrap();

        let nodes = registry.find(|id, kind| kind == Grid::PqBus && id.as_str().contains("node"));

        assert_eq!(nodes.len(), 2);
        assert_eq!(registry.of_kind(Grid::RefBus).len(), 1);
    }

    #[test]
    fn resolves_the_unique_bus_for_a_suffix() {
        let mut registry = registry();
        registry
            .create("Grid", &json!({"buses": ["node_a1", "node_a2"]}))
            .unwrap();

        let bus = registry.resolve_bus_by_suffix("node_a2").unwrap();
        assert_eq!(bus.id().as_str(), "0-node_a2");

        // The transformer bus is not a PQ bus.
        assert!(registry.resolve_bus_by_suffix("tr_pri").is_err());
        assert_eq!(
            registry
                .resolve_by_suffix(Grid::RefBus, "tr_pri")
                .unwrap()
                .id()
                .as_str(),
            "0-tr_pri"
        );
    }

    #[test]
    fn missing_and_ambiguous_suffixes_fail_loudly() {
        let mut registry = registry();
        registry.create("Grid", &json!({"buses": ["node_a1"]})).unwrap();
        registry
            .create("Grid", &json!({"buses": ["node_a1", "node_b1"]}))
            .unwrap();

        match registry.resolve_bus_by_suffix("node_a1") {
            Err(Error::AmbiguousOrMissingNode { matches, .. }) => {
                assert_eq!(matches, vec![NodeId::new("0-node_a1"), NodeId::new("1-node_a1")]);
            }
            other => panic!("expected an ambiguous match, got {other:?}"),
        }

        match registry.resolve_bus_by_suffix("node_z9") {
            Err(Error::AmbiguousOrMissingNode { matches, .. }) => assert!(matches.is_empty()),
            other => panic!("expected a missing match, got {other:?}"),
        }

        assert_eq!(
            registry.resolve_bus_by_suffix("node_b1").unwrap().id().as_str(),
            "1-node_b1"
        );
    }
}
