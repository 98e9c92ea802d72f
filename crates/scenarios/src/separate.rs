//! Households, scattered PV and an edge node on a plain low-voltage grid.
//!
//! Every house is connected to the bus its profile names. PV systems are
//! spread over the grid's `node` buses at random, so this is the only variant
//! whose topology depends on the seed.

use serde_json::{Value, json};
use tracing::info;
use trellis_components::ComponentKind::{self, Branch, EdgeNode, House, PqBus, Pv, RefBus, Transformer};
use trellis_core::{Assembler, Kind, Topology};

use crate::{
    ScenarioConfig, ScenarioError, styles,
    wiring::{self, BUS_READINGS, LINE_READINGS},
};

/// Assembles the separate-components scenario.
///
/// # Errors
///
/// Returns a [`ScenarioError`] if any step of the assembly fails, e.g. when
/// the grid has no `node` bus for the PV systems.
pub fn assemble(config: &ScenarioConfig) -> Result<Topology<ComponentKind>, ScenarioError> {
    config.validate()?;
    let mut assembler = Assembler::seeded(trellis_components::registry(), config.seed);

    info!("instantiating models");
    let grid = wiring::create_grid(&mut assembler, config)?;
    let node_buses = assembler.find(|id, kind| {
        kind.is_bus() && grid.children().contains(id) && id.as_str().contains("node")
    });

    let node_ids: Vec<Value> = node_buses
        .iter()
        .filter_map(|bus| bus.id().suffix())
        .map(Value::from)
        .collect();
    let loads = assembler.create(
        "ResidentialLoads",
        &json!({
            "sim_start": config.start,
            "profile_file": config.profile_file,
            "node_ids": node_ids,
        }),
    )?;
    let houses = assembler.find(|id, kind| kind == House && loads.children().contains(id));

    let pvs = assembler.create_many("PV", config.pv_count, |_| {
        json!({ "sim_start": config.start, "datafile": config.pv_data })
    })?;
    let edge_nodes = assembler.create_many("Node", 1, |_| {
        json!({ "grid_node_id": config.grid_node, "init_val": "1" })
    })?;

    info!(
        houses = houses.len(),
        pvs = pvs.len(),
        candidates = node_buses.len(),
        "connecting entities"
    );
    for house in &houses {
        let bus = wiring::bus_from_data(&assembler, house, "node_id")?;
        assembler.connect(house, &bus, [("P_out", "P")])?;
    }
    assembler.connect_randomly(&pvs, &node_buses, "P", 1)?;

    // The edge node reads back the power its bus settled on in the previous step.
    for node in &edge_nodes {
        let bus = wiring::bus_from_data(&assembler, node, "grid_node_id")?;
        assembler.connect(node, &bus, [("P_out", "P")])?;
        assembler.connect_shifted(&bus, node, [("P", "grid_power")], json!({ "P": 0 }))?;
    }

    info!("creating database");
    let db = wiring::create_database(&mut assembler, config)?;
    assembler.connect_many_to_one(&houses, &db, &["P_out"])?;
    assembler.connect_many_to_one(&pvs, &db, &["P"])?;
    assembler.connect_many_to_one(&edge_nodes, &db, &["P_out"])?;

    let grid_nodes = wiring::grid_elements(&assembler, &grid, &[RefBus, PqBus]);
    let lines = wiring::grid_elements(&assembler, &grid, &[Transformer, Branch]);
    assembler.connect_many_to_one(&grid_nodes, &db, &BUS_READINGS)?;
    assembler.connect_many_to_one(&lines, &db, &LINE_READINGS)?;

    info!("creating web visualization");
    let vis = wiring::create_visualization(&mut assembler, config)?;

    assembler.connect_many_to_one(&grid_nodes, &vis, &["P", "Vm"])?;
    assembler.connect_many_to_one(&houses, &vis, &["P_out"])?;
    assembler.connect_many_to_one(&pvs, &vis, &["P"])?;
    assembler.connect_many_to_one(&edge_nodes, &vis, &["P_out"])?;
    styles::register(
        &mut assembler,
        &vis,
        [
            (RefBus, styles::power("refbus", "P", 0.0, 30_000.0)),
            (PqBus, styles::voltage("pqbus")),
            (House, styles::power("load", "P_out", 0.0, 3000.0)),
            (Pv, styles::power("gen", "P", -10_000.0, 0.0)),
            (EdgeNode, styles::power("load", "P_out", 0.0, 3000.0)),
        ],
    )?;

    Ok(assembler.finish()?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn pv_targets(config: &ScenarioConfig) -> Vec<String> {
        let topology = assemble(config).unwrap();
        topology
            .edges()
            .iter()
            .filter(|edge| {
                edge.source.node.as_str().starts_with("PV_")
                    && edge.destination.node.as_str().starts_with("0-")
            })
            .map(|edge| edge.destination.node.to_string())
            .collect()
    }

    #[test]
    fn every_house_feeds_its_own_bus() {
        let topology = assemble(&ScenarioConfig::default()).unwrap();

        let houses: Vec<_> = topology
            .nodes()
            .iter()
            .filter(|node| node.kind() == House)
            .collect();
        assert_eq!(houses.len(), 9);

        for house in houses {
            let node_id = house.data()["node_id"].as_str().unwrap();
            let targets: Vec<_> = topology
                .outgoing(house.id().as_str())
                .filter(|edge| edge.destination.attribute == "P")
                .map(|edge| edge.destination.node.to_string())
                .collect();
            assert_eq!(targets, vec![format!("0-{node_id}")]);
        }
    }

    #[test]
    fn pv_placement_depends_only_on_the_seed() {
        let config = ScenarioConfig::default();
        let targets = pv_targets(&config);

        assert_eq!(targets.len(), 20);
        assert!(targets.iter().all(|bus| bus.contains("node")));
        assert_eq!(targets, pv_targets(&config));

        let reseeded = ScenarioConfig {
            seed: 24,
            ..ScenarioConfig::default()
        };
        assert_ne!(targets, pv_targets(&reseeded));
    }

    #[test]
    fn edge_node_reads_its_bus_one_step_late() {
        let topology = assemble(&ScenarioConfig::default()).unwrap();

        let delayed: Vec<_> = topology.delayed_edges().collect();
        assert_eq!(delayed.len(), 1);
        assert_eq!(delayed[0].to_string(), "0-node_a1.P ~> Node_0.grid_power");
        assert_eq!(delayed[0].seed, Some(json!({"P": 0})));
    }

    #[test]
    fn all_endpoints_are_declared_slots() {
        let topology = assemble(&ScenarioConfig::default()).unwrap();
        let ids: HashSet<_> = topology.nodes().iter().map(|node| node.id().as_str()).collect();

        for edge in topology.edges() {
            assert!(ids.contains(edge.source.node.as_str()), "{edge}");
            assert!(ids.contains(edge.destination.node.as_str()), "{edge}");

            let source = topology.node(edge.source.node.as_str()).unwrap();
            assert!(source.kind().attribute(&edge.source.attribute).is_some(), "{edge}");
        }
    }

    #[test]
    fn repeated_line_reading_is_flagged() {
        let topology = assemble(&ScenarioConfig::default()).unwrap();

        assert_eq!(topology.warnings().len(), 11);
        for warning in topology.warnings() {
            assert_eq!(warning.occurrences, 2);
            assert_eq!(warning.edge.source.attribute, "P_from");
            assert_eq!(warning.edge.destination.node.as_str(), "Database_0");
        }
    }

    #[test]
    fn call_order_steps_producers_first() {
        let topology = assemble(&ScenarioConfig::default()).unwrap();
        let order = topology.call_order();
        let position = |id: &str| order.iter().position(|node| node.as_str() == id).unwrap();

        assert_eq!(order.len(), topology.nodes().len());
        assert!(position("Node_0") < position("0-node_a1"));
        assert!(position("House_0") < position("Database_0"));
    }
}
