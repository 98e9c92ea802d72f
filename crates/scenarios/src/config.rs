use std::{fs, path::{Path, PathBuf}};

use serde::{Deserialize, Deserializer};
use uom::si::{
    energy::watt_hour,
    f64::{Energy, Power, Time},
    power::watt,
    time::{day, minute, second},
};

use crate::ConfigError;

/// Settings shared by every scenario variant.
///
/// Missing fields take the defaults of the reference scenarios. Quantities are
/// written as plain numbers in seconds, watt-hours and watts:
///
/// ```toml
/// seed = 42
/// step_size = 900
/// battery_capacity = 7500
///
/// [compute]
/// min_consumption = 40
/// max_consumption = 200
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation start, as understood by the data-replaying simulators.
    pub start: String,

    #[serde(deserialize_with = "seconds")]
    pub duration: Time,

    #[serde(deserialize_with = "seconds")]
    pub step_size: Time,

    /// Seed of the random stream used by randomized wiring.
    pub seed: u64,

    /// Grid description file; the bundled demo grid is used when absent.
    pub grid_file: Option<PathBuf>,

    pub pv_data: String,

    pub profile_file: String,

    #[serde(deserialize_with = "watt_hours")]
    pub battery_capacity: Energy,

    pub compute: ComputeConfig,

    /// Number of PV systems in the separate scenario.
    pub pv_count: usize,

    /// Suffix of the bus that devices connect to.
    pub grid_node: String,

    pub database_file: String,
}

/// Power draw bounds of a compute node.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComputeConfig {
    #[serde(deserialize_with = "watts")]
    pub min_consumption: Power,

    #[serde(deserialize_with = "watts")]
    pub max_consumption: Power,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            start: "2014-01-01 00:00:00".into(),
            duration: Time::new::<day>(31.0),
            step_size: Time::new::<minute>(15.0),
            seed: 23,
            grid_file: None,
            pv_data: "data/pv_10kw.csv".into(),
            profile_file: "data/profiles.data.gz".into(),
            battery_capacity: Energy::new::<watt_hour>(7500.0),
            compute: ComputeConfig::default(),
            pv_count: 20,
            grid_node: "node_a1".into(),
            database_file: "demo.hdf5".into(),
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            min_consumption: Power::new::<watt>(40.0),
            max_consumption: Power::new::<watt>(200.0),
        }
    }
}

impl ScenarioConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The simulation duration in whole seconds, as the kernel expects it.
    #[must_use]
    pub fn duration_seconds(&self) -> u64 {
        whole_seconds(self.duration)
    }

    /// The step size in whole seconds, as the kernel expects it.
    #[must_use]
    pub fn step_seconds(&self) -> u64 {
        whole_seconds(self.step_size)
    }

    /// Checks that every quantity is finite and in range.
    ///
    /// Loading from TOML and every scenario's `assemble` run this check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let step = self.step_size.get::<second>();
        if !step.is_finite() || step < 1.0 {
            return Err(invalid("step_size", "must be a finite number of at least one second"));
        }
        if !self.duration.get::<second>().is_finite() || self.duration < self.step_size {
            return Err(invalid("duration", "must be finite and span at least one step"));
        }

        let capacity = self.battery_capacity.get::<watt_hour>();
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(invalid("battery_capacity", "must be finite and not negative"));
        }

        let min = self.compute.min_consumption.get::<watt>();
        let max = self.compute.max_consumption.get::<watt>();
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(invalid("compute", "consumption bounds must be finite and not negative"));
        }
        if min > max {
            return Err(invalid("compute", "min_consumption exceeds max_consumption"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_seconds(time: Time) -> u64 {
    time.get::<second>().round() as u64
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
    f64::deserialize(deserializer).map(Time::new::<second>)
}

fn watt_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Energy, D::Error> {
    f64::deserialize(deserializer).map(Energy::new::<watt_hour>)
}

fn watts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Power, D::Error> {
    f64::deserialize(deserializer).map(Power::new::<watt>)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn defaults_match_the_reference_scenarios() {
        let config = ScenarioConfig::default();

        assert_eq!(config.start, "2014-01-01 00:00:00");
        assert_eq!(config.duration_seconds(), 31 * 24 * 3600);
        assert_eq!(config.step_seconds(), 900);
        assert_eq!(config.seed, 23);
        assert_relative_eq!(config.battery_capacity.get::<watt_hour>(), 7500.0);
        assert_relative_eq!(config.compute.min_consumption.get::<watt>(), 40.0);
        assert_relative_eq!(config.compute.max_consumption.get::<watt>(), 200.0);
        assert_eq!(config.pv_count, 20);
        assert_eq!(config.grid_node, "node_a1");
    }

    #[test]
    fn empty_file_is_the_default() {
        assert_eq!(ScenarioConfig::from_toml_str("").unwrap(), ScenarioConfig::default());
    }

    #[test]
    fn reads_quantities_in_stated_units() {
        let config = ScenarioConfig::from_toml_str(
            r#"
            seed = 7
            step_size = 60
            duration = 86400
            battery_capacity = 10000
            grid_file = "grids/other.json"

            [compute]
            max_consumption = 350.5
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.step_seconds(), 60);
        assert_eq!(config.duration_seconds(), 86_400);
        assert_relative_eq!(config.battery_capacity.get::<watt_hour>(), 10_000.0);
        assert_relative_eq!(config.compute.min_consumption.get::<watt>(), 40.0);
        assert_relative_eq!(config.compute.max_consumption.get::<watt>(), 350.5);
        assert_eq!(config.grid_file, Some(PathBuf::from("grids/other.json")));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_ranges() {
        assert!(matches!(
            ScenarioConfig::from_toml_str("pv_cont = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ScenarioConfig::from_toml_str("step_size = 0"),
            Err(ConfigError::Invalid { field: "step_size", .. })
        ));
        assert!(matches!(
            ScenarioConfig::from_toml_str("[compute]\nmin_consumption = 500"),
            Err(ConfigError::Invalid { field: "compute", .. })
        ));
    }

    #[test]
    fn rejects_non_finite_and_negative_quantities() {
        let cases = [
            ("step_size = nan", "step_size"),
            ("step_size = inf", "step_size"),
            ("duration = nan", "duration"),
            ("duration = inf", "duration"),
            ("battery_capacity = -1", "battery_capacity"),
            ("battery_capacity = nan", "battery_capacity"),
            ("[compute]\nmin_consumption = -5", "compute"),
            ("[compute]\nmax_consumption = inf", "compute"),
        ];

        for (text, expected) in cases {
            match ScenarioConfig::from_toml_str(text) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{text}"),
                other => panic!("`{text}` should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn configurations_built_in_code_are_checked_too() {
        let config = ScenarioConfig {
            battery_capacity: Energy::new::<watt_hour>(-7500.0),
            ..ScenarioConfig::default()
        };

        assert!(ScenarioConfig::default().validate().is_ok());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "battery_capacity", .. })
        ));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let error = ScenarioConfig::from_toml_file(Path::new("no/such/trellis.toml")).unwrap_err();

        assert_eq!(
            error.to_string(),
            "failed to read config file `no/such/trellis.toml`"
        );
    }
}
