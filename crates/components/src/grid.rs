use std::{collections::HashSet, fs, path::Path};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use trellis_core::{Entity, Factory, FactoryArgs, FactoryFailure};

use crate::{ArgumentError, ComponentKind, GridError};

/// A low-voltage grid in the power-flow simulator's JSON layout.
///
/// Rows are positional arrays:
///
/// ```json
/// {
///   "bus":    [["tr_pri", "REF", 20.0], ["node_a1", "PQ", 0.4]],
///   "trafo":  [["tr1", "tr_pri", "tr_sec", "TRAFO_31", true, 0]],
///   "branch": [["branch_1", "tr_sec", "node_a1", "NAYY", 0.3, true]]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridDescription {
    pub bus: Vec<Bus>,
    #[serde(default)]
    pub trafo: Vec<Trafo>,
    #[serde(default)]
    pub branch: Vec<Branch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BusType {
    #[serde(rename = "REF")]
    Ref,
    #[serde(rename = "PQ")]
    Pq,
    #[serde(rename = "PN")]
    PowerNode,
}

impl BusType {
    fn kind(self) -> ComponentKind {
        match self {
            BusType::Ref => ComponentKind::RefBus,
            BusType::Pq => ComponentKind::PqBus,
            BusType::PowerNode => ComponentKind::PowerNode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bus {
    pub id: String,
    pub bus_type: BusType,
    pub base_kv: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trafo {
    pub id: String,
    pub from: String,
    pub to: String,
    pub trafo_type: String,
    pub online: bool,
    pub tap: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Branch {
    pub id: String,
    pub from: String,
    pub to: String,
    pub branch_type: String,
    pub length: f64,
    pub online: bool,
}

impl GridDescription {
    /// Reads a grid description from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, GridError> {
        let text = fs::read_to_string(path).map_err(|source| GridError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reads the description named by factory arguments.
    ///
    /// A `gridfile` path takes precedence over an inline `grid` object.
    fn from_args(args: &FactoryArgs) -> Result<Self, GridError> {
        match (args.get("gridfile"), args.get("grid")) {
            (Some(Value::String(path)), _) => Self::from_file(Path::new(path)),
            (Some(_), _) => Err(ArgumentError::Invalid {
                key: "gridfile",
                expected: "a path",
            }
            .into()),
            (None, Some(grid)) => Ok(Self::deserialize(grid)?),
            (None, None) => Err(GridError::NoDescription),
        }
    }

    /// Checks that ids are unique and every line ends at a declared bus.
    fn validate(&self) -> Result<(), GridError> {
        let mut ids = HashSet::new();
        let all_ids = self
            .bus
            .iter()
            .map(|bus| &bus.id)
            .chain(self.trafo.iter().map(|trafo| &trafo.id))
            .chain(self.branch.iter().map(|branch| &branch.id));
        for id in all_ids {
            if !ids.insert(id.as_str()) {
                return Err(GridError::DuplicateId { id: id.clone() });
            }
        }

        let buses: HashSet<_> = self.bus.iter().map(|bus| bus.id.as_str()).collect();
        let lines = self
            .trafo
            .iter()
            .map(|trafo| ("transformer", &trafo.id, [&trafo.from, &trafo.to]))
            .chain(
                self.branch
                    .iter()
                    .map(|branch| ("branch", &branch.id, [&branch.from, &branch.to])),
            );
        for (element, id, ends) in lines {
            if let Some(bus) = ends.into_iter().find(|end| !buses.contains(end.as_str())) {
                return Err(GridError::UnknownBus {
                    element,
                    id: id.clone(),
                    bus: bus.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Creates grid entities whose children are the grid's buses, transformers
/// and branches.
///
/// Grids are numbered from zero. Children are named `"<grid>-<element id>"`,
/// so bus `node_a1` of the first grid becomes `0-node_a1`.
#[derive(Debug, Default)]
pub struct GridFactory {
    next: usize,
}

impl Factory<ComponentKind> for GridFactory {
    fn create(&mut self, args: &FactoryArgs) -> Result<Entity<ComponentKind>, FactoryFailure> {
        let description = GridDescription::from_args(args)?;
        description.validate()?;

        let grid = self.next;
        let child_id = |id: &str| format!("{grid}-{id}");

        let buses = description.bus.iter().map(|bus| {
            Entity::new(child_id(&bus.id), bus.bus_type.kind()).with_data("base_kv", bus.base_kv)
        });
        let trafos = description.trafo.iter().map(|trafo| {
            Entity::new(child_id(&trafo.id), ComponentKind::Transformer)
                .with_data("from", child_id(&trafo.from))
                .with_data("to", child_id(&trafo.to))
                .with_data("online", trafo.online)
                .with_data("tap", trafo.tap)
        });
        let branches = description.branch.iter().map(|branch| {
            Entity::new(child_id(&branch.id), ComponentKind::Branch)
                .with_data("from", child_id(&branch.from))
                .with_data("to", child_id(&branch.to))
                .with_data("online", branch.online)
                .with_data("length", branch.length)
        });

        let mut entity = Entity::new(grid.to_string(), ComponentKind::Grid)
            .with_children(buses)
            .with_children(trafos)
            .with_children(branches);
        for key in ["gridfile", "step_size"] {
            if let Some(value) = args.get(key) {
                entity = entity.with_data(key, value.clone());
            }
        }

        debug!(
            grid,
            buses = description.bus.len(),
            trafos = description.trafo.len(),
            branches = description.branch.len(),
            "loaded grid"
        );
        self.next += 1;
        Ok(entity)
    }
}
