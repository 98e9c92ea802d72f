//! The component catalog of the smart-grid and edge-computing scenarios.
//!
//! [`ComponentKind`] is the closed set of component types, each declaring the
//! attribute slots its simulator exposes. [`registry`] returns a
//! [`NodeRegistry`] with a stand-in factory for every type. The factories
//! assign ids the way the external simulators do, so a topology built here can
//! be handed to a kernel that runs the real ones.

mod error;
mod grid;
mod households;
mod kind;
mod sequential;

pub use error::{ArgumentError, GridError};
pub use grid::{Branch, Bus, BusType, GridDescription, GridFactory, Trafo};
pub use households::ResidentialLoads;
pub use kind::ComponentKind;
pub use sequential::Sequential;

use trellis_core::NodeRegistry;

/// Returns a registry with a factory for every component type.
///
/// Factories are registered under the type name of the kind they create,
/// except that edge nodes are created as `"Node"` like their simulator calls
/// them.
///
/// | type name | arguments kept as data |
/// |---|---|
/// | `PV` | `datafile`, `sim_start` |
/// | `Battery` | `step_size`, `max_capacity`, `grid_node_id` |
/// | `ComputeNode` | `step_size`, `min_consumption`, `max_consumption` |
/// | `Node` | `grid_node_id` (required), `init_val` |
/// | `Grid` | see [`GridFactory`] |
/// | `ResidentialLoads` | see [`ResidentialLoads`] |
/// | `Database` | `filename`, `step_size`, `duration` |
/// | `Topology` | `start_date`, `step_size` |
#[must_use]
pub fn registry() -> NodeRegistry<ComponentKind> {
    let mut registry = NodeRegistry::new();

    registry.register_factory(
        "PV",
        Sequential::new(ComponentKind::Pv).keeps(&["datafile", "sim_start"]),
    );
    registry.register_factory(
        "Battery",
        Sequential::new(ComponentKind::Battery).keeps(&[
            "step_size",
            "max_capacity",
            "grid_node_id",
        ]),
    );
    registry.register_factory(
        "ComputeNode",
        Sequential::new(ComponentKind::ComputeNode).keeps(&[
            "step_size",
            "min_consumption",
            "max_consumption",
        ]),
    );
    registry.register_factory(
        "Node",
        Sequential::new(ComponentKind::EdgeNode)
            .requires(&["grid_node_id"])
            .keeps(&["init_val"]),
    );
    registry.register_factory("Grid", GridFactory::default());
    registry.register_factory("ResidentialLoads", ResidentialLoads::default());
    registry.register_factory(
        "Database",
        Sequential::new(ComponentKind::Database).keeps(&["filename", "step_size", "duration"]),
    );
    registry.register_factory(
        "Topology",
        Sequential::new(ComponentKind::Topology).keeps(&["start_date", "step_size"]),
    );

    registry
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trellis_core::{Error, Kind};

    use super::*;

    #[test]
    fn every_creatable_kind_has_a_factory() {
        let registry = registry();

        for kind in ComponentKind::ALL {
            let created_by_parent = matches!(
                kind,
                ComponentKind::House
                    | ComponentKind::RefBus
                    | ComponentKind::PqBus
                    | ComponentKind::PowerNode
                    | ComponentKind::Transformer
                    | ComponentKind::Branch
            );
            if !created_by_parent {
                assert!(registry.has_factory(kind.name()), "{kind:?}");
            }
        }
    }

    #[test]
    fn edge_nodes_need_their_grid_bus() {
        let mut registry = registry();

        let error = registry.create("Node", &json!({})).unwrap_err();
        assert!(matches!(error, Error::Factory { ref type_name, .. } if type_name == "Node"));

        let node = registry.create("Node", &json!({"grid_node_id": "node_a1"})).unwrap();
        assert_eq!(node.id().as_str(), "Node_0");
        assert_eq!(registry.data(&node, "grid_node_id").unwrap(), "node_a1");
    }

    #[test]
    fn grid_children_resolve_by_suffix() {
        let mut registry = registry();
        let grid = json!({
            "bus": [["tr_pri", "REF", 20.0], ["node_a1", "PQ", 0.4]],
            "branch": [["branch_1", "tr_pri", "node_a1", "NAYY", 0.1, true]],
        });

        let created = registry.create("Grid", &json!({ "grid": grid })).unwrap();

        assert_eq!(created.children().len(), 3);
        assert_eq!(registry.len(), 4);
        let bus = registry.resolve_bus_by_suffix("node_a1").unwrap();
        assert_eq!(bus.id().as_str(), "0-node_a1");
        assert!(registry.resolve_bus_by_suffix("tr_pri").is_err());
        assert_eq!(
            registry
                .resolve_by_suffix(ComponentKind::RefBus, "tr_pri")
                .unwrap()
                .id()
                .as_str(),
            "0-tr_pri"
        );
    }
}
