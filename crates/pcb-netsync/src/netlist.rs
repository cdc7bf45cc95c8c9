//! Netlist model: the schematic's view of components and their pin nets.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use crate::library::LibId;

/// Property flag: the symbol must not be placed on the board.
pub const EXCLUDE_FROM_BOARD: &str = "exclude_from_board";
/// Property flag: the symbol is excluded from the bill of materials.
pub const EXCLUDE_FROM_BOM: &str = "exclude_from_bom";

/// Connection of one component pin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentNet {
    pub pin: String,
    /// Net name; empty when the pin is unconnected.
    #[serde(default)]
    pub net: String,
    #[serde(default)]
    pub pin_function: String,
    #[serde(default)]
    pub pin_type: String,
}

impl ComponentNet {
    pub fn new(pin: impl Into<String>, net: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            net: net.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub reference: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub fpid: LibId,
    /// Hierarchical path identity of the symbol.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub pins: Vec<ComponentNet>,
}

/// A flag is set by its presence; an explicit false-like value clears it.
fn flag_set(properties: &BTreeMap<String, String>, key: &str) -> bool {
    properties
        .get(key)
        .is_some_and(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
}

impl Component {
    pub fn new(reference: impl Into<String>, value: impl Into<String>, fpid: LibId) -> Self {
        Self {
            reference: reference.into(),
            value: value.into(),
            fpid,
            ..Default::default()
        }
    }

    pub fn net_for_pin(&self, pin: &str) -> Option<&ComponentNet> {
        self.pins.iter().find(|p| p.pin == pin)
    }

    /// Presence of the property excludes the component, except that a value
    /// of `0`, `false` or `no` reads as not excluded. Netlists that only
    /// write the key with an empty value behave as a plain presence check.
    pub fn exclude_from_board(&self) -> bool {
        flag_set(&self.properties, EXCLUDE_FROM_BOARD)
    }

    /// Same presence rule as [`Component::exclude_from_board`].
    pub fn exclude_from_bom(&self) -> bool {
        flag_set(&self.properties, EXCLUDE_FROM_BOM)
    }

    /// Properties copied onto the footprint. The exclusion flags are carried
    /// by footprint attributes instead.
    pub fn footprint_properties(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .filter(|(k, _)| k.as_str() != EXCLUDE_FROM_BOARD && k.as_str() != EXCLUDE_FROM_BOM)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Netlist {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read netlist from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse netlist JSON from {}", path.display()))
    }

    /// Case-insensitive lookup by reference designator.
    pub fn component_by_reference(&self, reference: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.reference.eq_ignore_ascii_case(reference))
    }

    pub fn component_by_path(&self, path: &str) -> Option<&Component> {
        if path.is_empty() {
            return None;
        }
        self.components.iter().find(|c| c.path == path)
    }

    /// Every non-empty net name referenced by a pin.
    pub fn net_names(&self) -> BTreeSet<String> {
        self.components
            .iter()
            .flat_map(|c| c.pins.iter())
            .filter(|p| !p.net.is_empty())
            .map(|p| p.net.clone())
            .collect()
    }

    /// Number of pins referencing each net, over components placed on the board.
    pub fn pin_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for component in self.components.iter().filter(|c| !c.exclude_from_board()) {
            for pin in component.pins.iter().filter(|p| !p.net.is_empty()) {
                *counts.entry(pin.net.as_str()).or_default() += 1;
            }
        }
        counts
    }
}
