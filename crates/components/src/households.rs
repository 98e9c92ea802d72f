use serde_json::Value;
use trellis_core::{Entity, Factory, FactoryArgs, FactoryFailure};

use crate::{ArgumentError, ComponentKind};

/// Creates a residential load container with one house per listed bus.
///
/// Expects a `node_ids` argument: the bus suffix each house is connected to,
/// e.g. `["node_a1", "node_a2"]`. Every house carries its `node_id` as static
/// data so the assembly can wire it to that bus.
///
/// Houses are numbered across containers (`House_0`, `House_1`, ...), the way
/// the household simulator names them.
#[derive(Debug, Default)]
pub struct ResidentialLoads {
    next_container: usize,
    next_house: usize,
}

impl Factory<ComponentKind> for ResidentialLoads {
    fn create(&mut self, args: &FactoryArgs) -> Result<Entity<ComponentKind>, FactoryFailure> {
        let node_ids = args
            .get("node_ids")
            .ok_or(ArgumentError::Missing { key: "node_ids" })?
            .as_array()
            .ok_or(ArgumentError::Invalid {
                key: "node_ids",
                expected: "a list of bus names",
            })?
            .iter()
            .map(|node_id| {
                node_id.as_str().ok_or(ArgumentError::Invalid {
                    key: "node_ids",
                    expected: "a list of bus names",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let first_house = self.next_house;
        let houses = node_ids.iter().enumerate().map(|(offset, node_id)| {
            Entity::new(format!("House_{}", first_house + offset), ComponentKind::House)
                .with_data("node_id", Value::from(*node_id))
        });

        let mut entity = Entity::new(
            format!("ResidentialLoads_{}", self.next_container),
            ComponentKind::ResidentialLoads,
        )
        .with_children(houses);
        for key in ["sim_start", "profile_file", "grid_name"] {
            if let Some(value) = args.get(key) {
                entity = entity.with_data(key, value.clone());
            }
        }

        self.next_container += 1;
        self.next_house += node_ids.len();
        Ok(entity)
    }
}
