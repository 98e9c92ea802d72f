//! One site connected to the power node of a customized grid.
//!
//! The grid's first power node stands for the site's grid connection. It
//! absorbs the compute demand, nets PV and battery power, and tracks net
//! metering, which the database records alongside the usual bus readings.

use tracing::info;
use trellis_components::ComponentKind::{
    self, Battery, Branch, ComputeNode, PowerNode, PqBus, Pv, RefBus, Transformer,
};
use trellis_core::{Assembler, Topology};

use crate::{
    ScenarioConfig, ScenarioError, styles,
    wiring::{self, BUS_READINGS, LINE_READINGS},
};

/// Assembles the monolithic scenario.
///
/// # Errors
///
/// Returns a [`ScenarioError`] if the grid has no power node or any step of
/// the assembly fails.
pub fn assemble(config: &ScenarioConfig) -> Result<Topology<ComponentKind>, ScenarioError> {
    config.validate()?;
    let mut assembler = Assembler::seeded(trellis_components::registry(), config.seed);

    info!("instantiating models");
    let grid = wiring::create_grid(&mut assembler, config)?;
    let grid_node = wiring::grid_elements(&assembler, &grid, &[PowerNode])
        .into_iter()
        .next()
        .ok_or_else(|| ScenarioError::NoPowerNode {
            grid: grid.id().to_string(),
        })?;
    let site = wiring::create_site(&mut assembler, config, &grid_node)?;

    info!("connecting entities");
    site.connect(&mut assembler, &grid_node)?;

    info!("creating database");
    let db = wiring::create_database(&mut assembler, config)?;
    assembler.connect_many_to_one(&[site.pv.clone()], &db, &["P", "Date"])?;
    assembler.connect_many_to_one(&[site.compute.clone()], &db, &["container_need", "cpu_level"])?;
    assembler.connect_many_to_one(&[site.battery.clone()], &db, &["current_load"])?;
    assembler.connect(
        &grid_node,
        &db,
        BUS_READINGS
            .into_iter()
            .chain(["net_metering_power", "grid_energy"]),
    )?;

    let buses = wiring::grid_elements(&assembler, &grid, &[PqBus]);
    let transformers = wiring::grid_elements(&assembler, &grid, &[RefBus]);
    let lines = wiring::grid_elements(&assembler, &grid, &[Transformer, Branch]);
    assembler.connect_many_to_one(&buses, &db, &BUS_READINGS)?;
    assembler.connect_many_to_one(&transformers, &db, &BUS_READINGS)?;
    assembler.connect_many_to_one(&lines, &db, &LINE_READINGS)?;

    info!("creating web visualization");
    let vis = wiring::create_visualization(&mut assembler, config)?;

    assembler.connect(&grid_node, &vis, ["P", "Vm"])?;
    assembler.connect_many_to_one(&buses, &vis, &["P", "Vm"])?;
    assembler.connect_many_to_one(&transformers, &vis, &["P", "Vm"])?;
    assembler.connect_many_to_one(&[site.compute.clone()], &vis, &["container_need"])?;
    assembler.connect_many_to_one(&[site.pv.clone()], &vis, &["P"])?;
    assembler.connect_many_to_one(&[site.battery.clone()], &vis, &["current_load"])?;
    styles::register(
        &mut assembler,
        &vis,
        [
            (PowerNode, styles::voltage("powerNode")),
            (PqBus, styles::voltage("pqbus")),
            (RefBus, styles::power("refbus", "P", 0.0, 30_000.0)),
            (
                ComputeNode,
                styles::power("computeNode", "container_need", -10_000.0, 10_000.0),
            ),
            (Pv, styles::power("pvNode", "P", -10_000.0, 0.0)),
            (
                Battery,
                styles::power("batteryNode", "current_load", -50_000.0, 50_000.0),
            ),
        ],
    )?;

    Ok(assembler.finish()?)
}
