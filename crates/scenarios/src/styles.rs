//! Presentation presets for the web visualization sink.

use trellis_components::ComponentKind;
use trellis_core::{Assembler, Error, Node, StyleDescriptor};

/// Nominal low-voltage bus voltage in volts.
const NOMINAL_VOLTAGE: f64 = 230.0;

/// Types the visualization never draws.
pub const HIDDEN: [ComponentKind; 4] = [
    ComponentKind::Topology,
    ComponentKind::ResidentialLoads,
    ComponentKind::Grid,
    ComponentKind::Database,
];

/// A bus colored by its voltage, within 1% of nominal.
#[must_use]
pub fn voltage(class: &str) -> StyleDescriptor {
    StyleDescriptor {
        display_class: class.into(),
        bound_attribute: "Vm".into(),
        unit: "U [V]".into(),
        default: NOMINAL_VOLTAGE,
        min: 0.99 * NOMINAL_VOLTAGE,
        max: 1.01 * NOMINAL_VOLTAGE,
    }
}

/// A component sized by the power on `attr`, in watts.
#[must_use]
pub fn power(class: &str, attr: &str, min: f64, max: f64) -> StyleDescriptor {
    StyleDescriptor {
        display_class: class.into(),
        bound_attribute: attr.into(),
        unit: "P [W]".into(),
        default: 0.0,
        min,
        max,
    }
}

/// Registers a batch of styles with one visualization sink.
///
/// # Errors
///
/// Fails on the first style the assembler rejects.
pub fn register(
    assembler: &mut Assembler<ComponentKind>,
    vis: &Node<ComponentKind>,
    styles: impl IntoIterator<Item = (ComponentKind, StyleDescriptor)>,
) -> Result<(), Error> {
    for (kind, style) in styles {
        assembler.register_style(vis, kind, style)?;
    }
    Ok(())
}
