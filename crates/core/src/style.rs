use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::Error;

/// How a visualization sink renders one component type.
///
/// `bound_attribute` names the value that drives the rendering, shown in
/// `unit` and scaled between `min` and `max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    #[serde(rename = "cls")]
    pub display_class: String,
    #[serde(rename = "attr")]
    pub bound_attribute: String,
    pub unit: String,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl StyleDescriptor {
    /// Checks that `min <= default <= max`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if the range is violated or any
    /// bound is NaN.
    pub fn validate(&self, type_name: &str) -> Result<(), Error> {
        if self.min <= self.default && self.default <= self.max {
            Ok(())
        } else {
            Err(Error::InvalidDescriptor {
                type_name: type_name.to_owned(),
                default: self.default,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Presentation metadata for one visualization sink, keyed by type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleRegistry {
    etypes: BTreeMap<String, StyleDescriptor>,
    ignore_types: BTreeSet<String>,
}

impl StyleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the style of `type_name`, returning the one it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if the descriptor is invalid, in
    /// which case the registry is unchanged.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        descriptor: StyleDescriptor,
    ) -> Result<Option<StyleDescriptor>, Error> {
        let type_name = type_name.into();
        descriptor.validate(&type_name)?;
        Ok(self.etypes.insert(type_name, descriptor))
    }

    #[must_use]
    pub fn describe(&self, type_name: &str) -> Option<&StyleDescriptor> {
        self.etypes.get(type_name)
    }

    /// Marks types the sink should not display.
    pub fn ignore<I, S>(&mut self, type_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_types.extend(type_names.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn is_ignored(&self, type_name: &str) -> bool {
        self.ignore_types.contains(type_name)
    }

    /// Registered styles, ordered by type name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleDescriptor)> {
        self.etypes.iter().map(|(name, style)| (name.as_str(), style))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.etypes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.etypes.is_empty()
    }
}
