use trellis_core::{Entity, Factory, FactoryArgs, FactoryFailure, Kind};

use crate::{ArgumentError, ComponentKind};

/// Creates numbered entities of one kind, `"<type name>_<n>"`.
///
/// This is how the device simulators name their entities (`PV_0`,
/// `Battery_0`, `Node_0`, ...). The counter is per factory, so each registry
/// starts again at zero.
///
/// Listed arguments are copied into the entity's static data, where the
/// assembly can read them back (e.g. the bus an edge node feeds into).
#[derive(Debug, Clone)]
pub struct Sequential {
    kind: ComponentKind,
    next: usize,
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

impl Sequential {
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            next: 0,
            required: &[],
            optional: &[],
        }
    }

    /// Arguments that must be present and are kept as static data.
    #[must_use]
    pub fn requires(mut self, keys: &'static [&'static str]) -> Self {
        self.required = keys;
        self
    }

    /// Arguments kept as static data when present.
    #[must_use]
    pub fn keeps(mut self, keys: &'static [&'static str]) -> Self {
        self.optional = keys;
        self
    }
}

impl Factory<ComponentKind> for Sequential {
    fn create(&mut self, args: &FactoryArgs) -> Result<Entity<ComponentKind>, FactoryFailure> {
        let mut entity = Entity::new(format!("{}_{}", self.kind.name(), self.next), self.kind);

        for &key in self.required {
            let value = args.get(key).ok_or(ArgumentError::Missing { key })?;
            entity.data.insert(key.to_owned(), value.clone());
        }
        for &key in self.optional {
            if let Some(value) = args.get(key) {
                entity.data.insert(key.to_owned(), value.clone());
            }
        }

        self.next += 1;
        Ok(entity)
    }
}
