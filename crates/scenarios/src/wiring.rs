//! Wiring steps shared by the scenario variants.

use serde_json::{Value, json};
use trellis_components::ComponentKind;
use trellis_core::{Assembler, Node};
use uom::si::{energy::watt_hour, power::watt};

use crate::{ScenarioConfig, ScenarioError, styles};

/// The grid used when the configuration names no grid file.
const DEMO_GRID: &str = include_str!("../data/demo_lv_grid.json");

/// Attributes every bus reports to the database.
pub const BUS_READINGS: [&str; 5] = ["P", "Q", "Vl", "Vm", "Va"];

/// Attributes every line reports to the database.
///
/// `P_from` is listed twice, as the reference scenarios record it. The repeat
/// is kept and shows up in [`Topology::warnings`](trellis_core::Topology::warnings),
/// one duplicate per line.
pub const LINE_READINGS: [&str; 4] = ["P_from", "Q_from", "P_to", "P_from"];

/// Creates the power grid named by the configuration.
pub fn create_grid(
    assembler: &mut Assembler<ComponentKind>,
    config: &ScenarioConfig,
) -> Result<Node<ComponentKind>, ScenarioError> {
    let mut args = match &config.grid_file {
        Some(path) => json!({ "gridfile": path.to_string_lossy() }),
        None => json!({ "grid": serde_json::from_str::<Value>(DEMO_GRID)? }),
    };
    args["step_size"] = json!(config.step_seconds());
    Ok(assembler.create("Grid", &args)?)
}

/// Creates the database that records the whole run.
pub fn create_database(
    assembler: &mut Assembler<ComponentKind>,
    config: &ScenarioConfig,
) -> Result<Node<ComponentKind>, ScenarioError> {
    let args = json!({
        "filename": config.database_file,
        "step_size": config.step_seconds(),
        "duration": config.duration_seconds(),
    });
    Ok(assembler.create("Database", &args)?)
}

/// Creates the web visualization, hiding the container types.
pub fn create_visualization(
    assembler: &mut Assembler<ComponentKind>,
    config: &ScenarioConfig,
) -> Result<Node<ComponentKind>, ScenarioError> {
    let args = json!({
        "start_date": config.start,
        "step_size": config.step_seconds(),
    });
    let vis = assembler.create("Topology", &args)?;
    assembler.ignore_types(&vis, styles::HIDDEN)?;
    Ok(vis)
}

/// Returns the children of `grid` whose kind is one of `kinds`, in grid order.
pub fn grid_elements(
    assembler: &Assembler<ComponentKind>,
    grid: &Node<ComponentKind>,
    kinds: &[ComponentKind],
) -> Vec<Node<ComponentKind>> {
    assembler.find(|id, kind| kinds.contains(&kind) && grid.children().contains(id))
}

/// Creates the PV, compute node and battery of the single-site scenarios.
pub fn create_site(
    assembler: &mut Assembler<ComponentKind>,
    config: &ScenarioConfig,
    grid_node: &Node<ComponentKind>,
) -> Result<Site, ScenarioError> {
    let pv = assembler.create(
        "PV",
        &json!({ "sim_start": config.start, "datafile": config.pv_data }),
    )?;
    let compute = assembler.create(
        "ComputeNode",
        &json!({
            "step_size": config.step_seconds(),
            "min_consumption": config.compute.min_consumption.get::<watt>(),
            "max_consumption": config.compute.max_consumption.get::<watt>(),
        }),
    )?;
    let battery = assembler.create(
        "Battery",
        &json!({
            "step_size": config.step_seconds(),
            "max_capacity": config.battery_capacity.get::<watt_hour>(),
            "grid_node_id": grid_node.id(),
        }),
    )?;
    Ok(Site {
        pv,
        compute,
        battery,
    })
}

/// The devices of one site sharing a grid connection.
#[derive(Debug, Clone)]
pub struct Site {
    pub pv: Node<ComponentKind>,
    pub compute: Node<ComponentKind>,
    pub battery: Node<ComponentKind>,
}

impl Site {
    /// Wires the site's devices to each other and to the bus they share.
    ///
    /// The battery feeds its load into the bus within the step, and the bus
    /// answers with a charge or discharge action one step later. The first
    /// step charges with zero power.
    pub fn connect(
        &self,
        assembler: &mut Assembler<ComponentKind>,
        grid_node: &Node<ComponentKind>,
    ) -> Result<(), ScenarioError> {
        assembler.connect(&self.compute, grid_node, ["container_need"])?;

        assembler.connect(&self.pv, &self.compute, [("P", "pv_power")])?;
        assembler.connect(&self.pv, grid_node, ["P"])?;

        assembler.connect(&self.battery, &self.compute, [("current_load", "battery_power")])?;
        assembler.break_cycle(
            &self.battery,
            grid_node,
            ("current_load", "P"),
            "battery_action",
            json!({ "battery_action": "charge:0" }),
        )?;
        Ok(())
    }
}

/// Resolves the bus named by a node's static data entry `key`.
pub fn bus_from_data(
    assembler: &Assembler<ComponentKind>,
    node: &Node<ComponentKind>,
    key: &'static str,
) -> Result<Node<ComponentKind>, ScenarioError> {
    let suffix = assembler
        .data(node, key)?
        .as_str()
        .ok_or_else(|| ScenarioError::InvalidData {
            node: node.id().to_string(),
            key,
        })?;
    Ok(assembler.resolve_bus_by_suffix(suffix)?)
}
