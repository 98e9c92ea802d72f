//! One site connected to a regular PQ bus of the grid.

use tracing::info;
use trellis_components::ComponentKind::{
    self, Battery, Branch, ComputeNode, PqBus, Pv, RefBus, Transformer,
};
use trellis_core::{Assembler, Topology};

use crate::{
    ScenarioConfig, ScenarioError, styles,
    wiring::{self, BUS_READINGS, LINE_READINGS},
};

/// Assembles the single-site scenario.
///
/// The site connects to the bus whose id ends in `config.grid_node`.
///
/// # Errors
///
/// Returns a [`ScenarioError`] if that bus does not exist exactly once or any
/// step of the assembly fails.
pub fn assemble(config: &ScenarioConfig) -> Result<Topology<ComponentKind>, ScenarioError> {
    config.validate()?;
    let mut assembler = Assembler::seeded(trellis_components::registry(), config.seed);

    info!("instantiating models");
    let grid = wiring::create_grid(&mut assembler, config)?;
    let grid_node = assembler.resolve_bus_by_suffix(&config.grid_node)?;
    let site = wiring::create_site(&mut assembler, config, &grid_node)?;

    info!(grid_node = %grid_node.id(), "connecting entities");
    site.connect(&mut assembler, &grid_node)?;

    info!("creating database");
    let db = wiring::create_database(&mut assembler, config)?;
    assembler.connect_many_to_one(&[site.pv.clone()], &db, &["P"])?;
    assembler.connect_many_to_one(&[site.compute.clone()], &db, &["container_need"])?;
    assembler.connect_many_to_one(&[site.battery.clone()], &db, &["current_load"])?;

    let grid_nodes = wiring::grid_elements(&assembler, &grid, &[RefBus, PqBus]);
    let lines = wiring::grid_elements(&assembler, &grid, &[Transformer, Branch]);
    assembler.connect_many_to_one(&grid_nodes, &db, &BUS_READINGS)?;
    assembler.connect_many_to_one(&lines, &db, &LINE_READINGS)?;

    info!("creating web visualization");
    let vis = wiring::create_visualization(&mut assembler, config)?;

    assembler.connect_many_to_one(&grid_nodes, &vis, &["P", "Vm"])?;
    assembler.connect_many_to_one(&[site.compute.clone()], &vis, &["container_need"])?;
    assembler.connect_many_to_one(&[site.pv.clone()], &vis, &["P"])?;
    assembler.connect_many_to_one(&[site.battery.clone()], &vis, &["current_load"])?;
    styles::register(
        &mut assembler,
        &vis,
        [
            (RefBus, styles::power("refbus", "P", 0.0, 30_000.0)),
            (PqBus, styles::voltage("pqbus")),
            (
                ComputeNode,
                styles::power("compute", "container_need", -10_000.0, 10_000.0),
            ),
            (Pv, styles::power("gen", "P", -10_000.0, 0.0)),
            (
                Battery,
                styles::power("battery", "current_load", -50_000.0, 50_000.0),
            ),
        ],
    )?;

    Ok(assembler.finish()?)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use trellis_core::Error;

    use super::*;

    #[test]
    fn site_connects_to_the_configured_bus() {
        let topology = assemble(&ScenarioConfig::default()).unwrap();

        let battery = topology.node("Battery_0").unwrap();
        assert_eq!(battery.data()["grid_node_id"], "0-node_a1");
        assert_relative_eq!(battery.data()["max_capacity"].as_f64().unwrap(), 7500.0);

        let sources: Vec<_> = topology
            .incoming("0-node_a1")
            .filter(|edge| !edge.source.node.as_str().starts_with("0-"))
            .map(|edge| edge.source.to_string())
            .collect();
        assert_eq!(
            sources,
            vec!["ComputeNode_0.container_need", "PV_0.P", "Battery_0.current_load"]
        );
        assert_eq!(topology.delayed_edges().count(), 1);
    }

    #[test]
    fn another_bus_can_be_chosen() {
        let config = ScenarioConfig {
            grid_node: "node_b2".into(),
            ..ScenarioConfig::default()
        };

        let topology = assemble(&config).unwrap();

        let delayed = topology.delayed_edges().next().unwrap();
        assert_eq!(delayed.source.node.as_str(), "0-node_b2");
    }

    #[test]
    fn unknown_buses_are_reported() {
        let config = ScenarioConfig {
            grid_node: "node_z9".into(),
            ..ScenarioConfig::default()
        };

        let error = assemble(&config).unwrap_err();

        assert!(matches!(
            error,
            ScenarioError::Assembly(Error::AmbiguousOrMissingNode { ref suffix, ref matches, .. })
                if suffix == "node_z9" && matches.is_empty()
        ));
    }

    #[test]
    fn every_grid_bus_is_recorded_and_drawn() {
        let topology = assemble(&ScenarioConfig::default()).unwrap();

        let recorded = topology.incoming("Database_0").count();
        let drawn = topology.incoming("Topology_0").count();

        // 11 buses with 5 readings, 11 lines with 4, plus 3 device readings.
        assert_eq!(recorded, 11 * 5 + 11 * 4 + 3);
        // 11 buses with 2 readings, plus 3 device readings.
        assert_eq!(drawn, 11 * 2 + 3);
    }
}
