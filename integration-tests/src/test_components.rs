pub mod devices {
    use serde::Deserialize;
    use trellis_core::{Access, Entity, FactoryArgs, FactoryFailure, Kind, NodeRegistry};

    /// A small mock catalog of household devices, used for integration tests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Device {
        Pv,
        Storage,
        Demand,
        Bus,
        Database,
    }

    impl Kind for Device {
        fn name(&self) -> &'static str {
            match self {
                Device::Pv => "PV",
                Device::Storage => "Storage",
                Device::Demand => "Demand",
                Device::Bus => "PQBus",
                Device::Database => "Database",
            }
        }

        fn attributes(&self) -> &'static [(&'static str, Access)] {
            match self {
                Device::Pv => &[("P", Access::Read)],
                Device::Storage => &[("current_load", Access::Read), ("action", Access::Write)],
                Device::Demand => &[
                    ("pv_power", Access::Write),
                    ("battery_power", Access::Write),
                    ("action", Access::Read),
                    ("demand_need", Access::Read),
                ],
                Device::Bus => &[("P", Access::ReadWrite), ("Vm", Access::Read)],
                Device::Database => &[],
            }
        }

        fn accepts_any_input(&self) -> bool {
            matches!(self, Device::Database)
        }

        fn is_bus(&self) -> bool {
            matches!(self, Device::Bus)
        }
    }

    /// Configuration of a mock storage unit.
    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct StorageConfig {
        /// Usable capacity in watt-hours.
        pub capacity: f64,
    }

    /// Configuration of a mock bus.
    #[derive(Debug, Deserialize)]
    pub struct BusConfig {
        /// Grid the bus belongs to; becomes the id prefix.
        #[serde(default)]
        pub grid: usize,

        /// Bus name; becomes the id suffix.
        pub name: String,
    }

    /// Returns a registry that can create every mock device.
    ///
    /// Devices are numbered per type (`PV_0`, `PV_1`, ...), buses are named
    /// `"<grid>-<name>"`, and a storage unit keeps its capacity as data.
    #[must_use]
    pub fn registry() -> NodeRegistry<Device> {
        let mut registry = NodeRegistry::new();
        for kind in [Device::Pv, Device::Demand, Device::Database] {
            let mut count = 0;
            registry.register_fn(kind.name(), move |_: &FactoryArgs| {
                let id = format!("{}_{count}", kind.name());
                count += 1;
                Ok(Entity::new(id, kind))
            });
        }

        let mut storages = 0;
        registry.register_fn("Storage", move |args: &FactoryArgs| {
            let config = StorageConfig::deserialize(args)?;
            let id = format!("Storage_{storages}");
            storages += 1;
            Ok(Entity::new(id, Device::Storage).with_data("capacity", config.capacity))
        });

        registry.register_fn("PQBus", |args: &FactoryArgs| -> Result<_, FactoryFailure> {
            let config = BusConfig::deserialize(args)?;
            Ok(Entity::new(format!("{}-{}", config.grid, config.name), Device::Bus))
        });

        registry
    }
}
