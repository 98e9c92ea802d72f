use trellis_core::{Access, Kind};

use Access::{Read, ReadWrite, Write};

/// Every component type the smart-grid and edge-computing scenarios use.
///
/// The declared slots mirror the attributes each external simulator exposes.
/// `Database` and `Topology` are sinks and accept any input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A photovoltaic feed-in replayed from a CSV profile.
    Pv,
    Battery,
    ComputeNode,
    /// An edge computing node with local PV and a grid connection.
    EdgeNode,
    House,
    /// The household simulator's container entity; its children are houses.
    ResidentialLoads,
    /// The power-flow simulator's grid entity; its children are buses,
    /// transformers and branches.
    Grid,
    RefBus,
    PqBus,
    /// A bus of the customized power-flow simulator that also accepts compute
    /// demand and tracks net metering.
    PowerNode,
    Transformer,
    Branch,
    Database,
    Topology,
}

impl ComponentKind {
    /// Every kind, in catalog order.
    pub const ALL: [ComponentKind; 14] = [
        ComponentKind::Pv,
        ComponentKind::Battery,
        ComponentKind::ComputeNode,
        ComponentKind::EdgeNode,
        ComponentKind::House,
        ComponentKind::ResidentialLoads,
        ComponentKind::Grid,
        ComponentKind::RefBus,
        ComponentKind::PqBus,
        ComponentKind::PowerNode,
        ComponentKind::Transformer,
        ComponentKind::Branch,
        ComponentKind::Database,
        ComponentKind::Topology,
    ];

    /// Returns the kind whose type name is `name`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl Kind for ComponentKind {
    fn name(&self) -> &'static str {
        match self {
            ComponentKind::Pv => "PV",
            ComponentKind::Battery => "Battery",
            ComponentKind::ComputeNode => "ComputeNode",
            ComponentKind::EdgeNode => "Node",
            ComponentKind::House => "House",
            ComponentKind::ResidentialLoads => "ResidentialLoads",
            ComponentKind::Grid => "Grid",
            ComponentKind::RefBus => "RefBus",
            ComponentKind::PqBus => "PQBus",
            ComponentKind::PowerNode => "PowerNode",
            ComponentKind::Transformer => "Transformer",
            ComponentKind::Branch => "Branch",
            ComponentKind::Database => "Database",
            ComponentKind::Topology => "Topology",
        }
    }

    fn attributes(&self) -> &'static [(&'static str, Access)] {
        match self {
            ComponentKind::Pv => &[("P", Read), ("Date", Read)],
            ComponentKind::Battery => &[("current_load", Read), ("battery_action", Write)],
            ComponentKind::ComputeNode => &[
                ("container_need", Read),
                ("cpu_level", Read),
                ("pv_power", Write),
                ("battery_power", Write),
                ("battery_action", Read),
            ],
            ComponentKind::EdgeNode => &[
                ("P_out", Read),
                ("pv_power", Write),
                ("grid_power", Write),
                ("grid_node_id", Read),
            ],
            ComponentKind::House => &[("P_out", Read), ("node_id", Read)],
            ComponentKind::ResidentialLoads
            | ComponentKind::Grid
            | ComponentKind::Database
            | ComponentKind::Topology => &[],
            ComponentKind::RefBus => &[
                ("P", Read),
                ("Q", Read),
                ("Vl", Read),
                ("Vm", Read),
                ("Va", Read),
            ],
            ComponentKind::PqBus => &[
                ("P", ReadWrite),
                ("Q", ReadWrite),
                ("Vl", Read),
                ("Vm", Read),
                ("Va", Read),
                ("container_need", Write),
                ("battery_action", Read),
            ],
            ComponentKind::PowerNode => &[
                ("P", ReadWrite),
                ("Q", ReadWrite),
                ("Vl", Read),
                ("Vm", Read),
                ("Va", Read),
                ("net_metering_power", Read),
                ("grid_energy", Read),
                ("container_need", Write),
                ("battery_action", Read),
            ],
            ComponentKind::Transformer | ComponentKind::Branch => &[
                ("P_from", Read),
                ("Q_from", Read),
                ("P_to", Read),
                ("Q_to", Read),
            ],
        }
    }

    fn accepts_any_input(&self) -> bool {
        matches!(self, ComponentKind::Database | ComponentKind::Topology)
    }

    fn is_bus(&self) -> bool {
        matches!(self, ComponentKind::PqBus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ComponentKind::from_name("Node"), Some(ComponentKind::EdgeNode));
        assert_eq!(ComponentKind::from_name("Pv"), None);
    }

    #[test]
    fn slots_have_a_direction() {
        assert_eq!(ComponentKind::Battery.attribute("battery_action"), Some(Write));
        assert_eq!(ComponentKind::PqBus.attribute("P"), Some(ReadWrite));
        assert_eq!(ComponentKind::RefBus.attribute("P"), Some(Read));
        assert_eq!(ComponentKind::Pv.attribute("Q"), None);
    }

    #[test]
    fn only_sinks_accept_any_input() {
        let sinks: Vec<_> = ComponentKind::ALL
            .into_iter()
            .filter(ComponentKind::accepts_any_input)
            .collect();

        assert_eq!(sinks, vec![ComponentKind::Database, ComponentKind::Topology]);
        assert!(ComponentKind::Database.attributes().is_empty());
    }

    #[test]
    fn slot_names_are_unique_per_kind() {
        for kind in ComponentKind::ALL {
            let mut names: Vec<_> = kind.attributes().iter().map(|(name, _)| *name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), kind.attributes().len(), "{kind:?}");
        }
    }
}
