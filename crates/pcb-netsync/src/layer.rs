//! Board layers and layer sets.
//!
//! Layer names follow KiCad (`F.Cu`, `In1.Cu`, `B.Cu`, `F.SilkS`, ...). A
//! [`LayerSet`] serializes as a list of names and accepts the `*.Cu`
//! wildcard for "every copper layer".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of copper layers a board can carry: front, 30 inner, back.
pub const COPPER_LAYER_COUNT: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Layer(u8);

impl Layer {
    pub const F_CU: Layer = Layer(0);
    pub const B_CU: Layer = Layer(31);
    pub const F_MASK: Layer = Layer(32);
    pub const B_MASK: Layer = Layer(33);
    pub const F_PASTE: Layer = Layer(34);
    pub const B_PASTE: Layer = Layer(35);
    pub const F_SILKS: Layer = Layer(36);
    pub const B_SILKS: Layer = Layer(37);
    pub const F_FAB: Layer = Layer(38);
    pub const B_FAB: Layer = Layer(39);
    pub const EDGE_CUTS: Layer = Layer(40);

    const TECH_NAMES: [(&'static str, Layer); 10] = [
        ("F.Mask", Layer::F_MASK),
        ("B.Mask", Layer::B_MASK),
        ("F.Paste", Layer::F_PASTE),
        ("B.Paste", Layer::B_PASTE),
        ("F.SilkS", Layer::F_SILKS),
        ("B.SilkS", Layer::B_SILKS),
        ("F.Fab", Layer::F_FAB),
        ("B.Fab", Layer::B_FAB),
        ("Edge.Cuts", Layer::EDGE_CUTS),
        ("F.Silkscreen", Layer::F_SILKS),
    ];

    /// Inner copper layer `In{n}.Cu`, `n` in `1..=30`.
    pub fn inner(n: u8) -> Option<Layer> {
        (1..COPPER_LAYER_COUNT - 1).contains(&n).then_some(Layer(n))
    }

    pub fn is_copper(self) -> bool {
        self.0 < COPPER_LAYER_COUNT
    }

    pub fn parse(name: &str) -> Option<Layer> {
        match name {
            "F.Cu" => return Some(Layer::F_CU),
            "B.Cu" => return Some(Layer::B_CU),
            _ => {}
        }

        if let Some(n) = name
            .strip_prefix("In")
            .and_then(|rest| rest.strip_suffix(".Cu"))
        {
            return n.parse().ok().and_then(Layer::inner);
        }

        Self::TECH_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, layer)| *layer)
    }

    fn bit(self) -> u64 {
        1 << self.0
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Layer::F_CU => write!(f, "F.Cu"),
            Layer::B_CU => write!(f, "B.Cu"),
            Layer(n) if n < COPPER_LAYER_COUNT => write!(f, "In{n}.Cu"),
            layer => {
                let name = Self::TECH_NAMES
                    .iter()
                    .find(|(_, l)| *l == layer)
                    .map(|(name, _)| *name)
                    .unwrap_or("?");
                f.write_str(name)
            }
        }
    }
}

impl Serialize for Layer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Layer::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown layer name \"{name}\"")))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown layer name \"{0}\"")]
pub struct UnknownLayer(String);

/// Bitmask of layers.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct LayerSet(u64);

impl LayerSet {
    const COPPER_MASK: u64 = (1 << COPPER_LAYER_COUNT) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every copper layer.
    pub const fn all_copper() -> Self {
        Self(Self::COPPER_MASK)
    }

    pub fn single(layer: Layer) -> Self {
        Self(layer.bit())
    }

    pub fn with(mut self, layer: Layer) -> Self {
        self.0 |= layer.bit();
        self
    }

    pub fn contains(self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }

    pub fn intersects(self, other: LayerSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_on_copper(self) -> bool {
        self.0 & Self::COPPER_MASK != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Copper span between two layers, inclusive. Used for vias.
    pub fn copper_span(a: Layer, b: Layer) -> Self {
        let (lo, hi) = if a <= b { (a.0, b.0) } else { (b.0, a.0) };
        let mut set = Self::empty();
        for n in lo..=hi.min(COPPER_LAYER_COUNT - 1) {
            set = set.with(Layer(n));
        }
        set
    }

    pub fn iter(self) -> impl Iterator<Item = Layer> {
        (0..64u8)
            .map(Layer)
            .filter(move |l| self.contains(*l))
    }
}

impl fmt::Debug for LayerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|l| l.to_string()))
            .finish()
    }
}

impl FromIterator<Layer> for LayerSet {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        iter.into_iter().fold(LayerSet::empty(), LayerSet::with)
    }
}

impl From<LayerSet> for Vec<String> {
    fn from(set: LayerSet) -> Self {
        if set.0 & LayerSet::COPPER_MASK == LayerSet::COPPER_MASK {
            let mut names = vec!["*.Cu".to_string()];
            names.extend(
                set.iter()
                    .filter(|l| !l.is_copper())
                    .map(|l| l.to_string()),
            );
            return names;
        }
        set.iter().map(|l| l.to_string()).collect()
    }
}

impl TryFrom<Vec<String>> for LayerSet {
    type Error = UnknownLayer;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let mut set = LayerSet::empty();
        for name in names {
            if name == "*.Cu" {
                set.0 |= LayerSet::COPPER_MASK;
                continue;
            }
            let layer = Layer::parse(&name).ok_or(UnknownLayer(name))?;
            set = set.with(layer);
        }
        Ok(set)
    }
}
