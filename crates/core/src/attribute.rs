use std::{fmt, hash::Hash};

/// The direction in which an attribute slot can be wired.
///
/// A readable slot is an output the kernel populates each step and may be the
/// source of an edge. A writable slot is an input the kernel feeds each step
/// and may be the destination of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    /// Returns `true` if the slot can be the source of an edge.
    #[must_use]
    pub fn is_readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    /// Returns `true` if the slot can be the destination of an edge.
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
            Access::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// A closed set of component types.
///
/// Implemented by an enum with one variant per component type a scenario can
/// instantiate. Each variant declares the attribute slots that type exposes,
/// so wiring is checked against the declaration when an edge is created
/// rather than discovered by the kernel at run time.
pub trait Kind: Copy + Eq + Hash + fmt::Debug + 'static {
    /// The type name, as used in style registries and the hand-off document.
    fn name(&self) -> &'static str;

    /// Every attribute slot this type declares, with its access direction.
    fn attributes(&self) -> &'static [(&'static str, Access)];

    /// Looks up a declared attribute slot by name.
    fn attribute(&self, name: &str) -> Option<Access> {
        self.attributes()
            .iter()
            .find(|(declared, _)| *declared == name)
            .map(|&(_, access)| access)
    }

    /// Whether this type is a sink that accepts arbitrarily named inputs.
    ///
    /// Persistence and visualization sinks absorb attributes from an unbounded
    /// number of producers, each under its own namespaced slot, so they cannot
    /// declare their inputs up front.
    fn accepts_any_input(&self) -> bool {
        false
    }

    /// Whether this type is the grid bus resolved by
    /// [`NodeRegistry::resolve_bus_by_suffix`](crate::NodeRegistry::resolve_bus_by_suffix).
    fn is_bus(&self) -> bool {
        false
    }
}

/// A pair of attribute names wired from a source slot to a destination slot.
///
/// Converts from a single name, which wires a slot to the same-named slot, or
/// from a `(source, destination)` tuple for renaming.
///
/// ```
/// use trellis_core::AttrPair;
///
/// let same: AttrPair = "P".into();
/// assert_eq!(same, AttrPair::new("P", "P"));
///
/// let renamed: AttrPair = ("current_load", "battery_power").into();
/// assert_eq!(renamed.source, "current_load");
/// assert_eq!(renamed.destination, "battery_power");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrPair {
    pub source: String,
    pub destination: String,
}

impl AttrPair {
    #[must_use]
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl From<&str> for AttrPair {
    fn from(name: &str) -> Self {
        Self::new(name, name)
    }
}

impl From<String> for AttrPair {
    fn from(name: String) -> Self {
        Self::new(name.clone(), name)
    }
}

impl<S: Into<String>, D: Into<String>> From<(S, D)> for AttrPair {
    fn from((source, destination): (S, D)) -> Self {
        Self::new(source, destination)
    }
}

impl From<&AttrPair> for AttrPair {
    fn from(pair: &AttrPair) -> Self {
        pair.clone()
    }
}
