//! In-memory board model.
//!
//! The board owns its footprints (which own their pads), the net registry,
//! zones, vias and tracks. Items reference nets by [`NetCode`]; every code in
//! use must exist in [`Board::nets`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::connectivity::Connectivity;
use crate::geometry::{Point, Rect, Size, mm};
use crate::layer::{Layer, LayerSet};
use crate::library::LibId;
use crate::net::{NetCode, NetRegistry};

/// Stable item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kiid(pub Uuid);

/// UUID namespace used for deterministic footprint ids derived from paths.
const UUID_NAMESPACE_URL: Uuid = Uuid::from_u128(0x6ba7b811_9dad_11d1_80b4_00c04fd430c8);

impl Kiid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id for a hierarchical path.
    pub fn from_path(path: &str) -> Self {
        Self(Uuid::new_v5(&UUID_NAMESPACE_URL, path.as_bytes()))
    }
}

impl Default for Kiid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Kiid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable handle to a pad: owning footprint and pad index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadRef {
    pub footprint: Kiid,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pad {
    /// Pad name ("number"), matched against netlist pin names.
    pub number: String,
    #[serde(default)]
    pub pin_function: String,
    #[serde(default)]
    pub pin_type: String,
    #[serde(default)]
    pub net: NetCode,
    pub layers: LayerSet,
    /// Absolute position on the board.
    #[serde(default)]
    pub position: Point,
    #[serde(default = "default_pad_size")]
    pub size: Size,
    #[serde(default)]
    pub locked: bool,
}

fn default_pad_size() -> Size {
    Size::new(mm(1), mm(1))
}

impl Pad {
    pub fn new(number: impl Into<String>, layers: LayerSet) -> Self {
        Self {
            number: number.into(),
            pin_function: String::new(),
            pin_type: String::new(),
            net: NetCode::UNCONNECTED,
            layers,
            position: Point::default(),
            size: default_pad_size(),
            locked: false,
        }
    }

    pub fn is_on_copper(&self) -> bool {
        self.layers.is_on_copper()
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }
}

/// Footprint fabrication attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FootprintAttributes(u32);

impl FootprintAttributes {
    pub const THROUGH_HOLE: Self = Self(1 << 0);
    pub const SMD: Self = Self(1 << 1);
    pub const EXCLUDE_FROM_POS: Self = Self(1 << 2);
    pub const EXCLUDE_FROM_BOM: Self = Self(1 << 3);
    pub const BOARD_ONLY: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for FootprintAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    #[serde(default)]
    pub id: Kiid,
    /// Library identifier the footprint was loaded from.
    pub fpid: LibId,
    pub reference: String,
    #[serde(default)]
    pub value: String,
    /// Hierarchical path of the schematic symbol this footprint belongs to.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: FootprintAttributes,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub pads: Vec<Pad>,
}

impl Footprint {
    pub fn new(fpid: LibId, reference: impl Into<String>) -> Self {
        Self {
            id: Kiid::new(),
            fpid,
            reference: reference.into(),
            value: String::new(),
            path: String::new(),
            properties: BTreeMap::new(),
            attributes: FootprintAttributes::empty(),
            locked: false,
            position: Point::default(),
            pads: Vec::new(),
        }
    }

    pub fn find_pad(&self, number: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.number == number)
    }

    pub fn pad_ref(&self, index: usize) -> PadRef {
        PadRef {
            footprint: self.id,
            index,
        }
    }

    /// Move the footprint, dragging its pads along.
    pub fn set_position(&mut self, position: Point) {
        let dx = position.x - self.position.x;
        let dy = position.y - self.position.y;
        for pad in &mut self.pads {
            pad.position = pad.position.offset(dx, dy);
        }
        self.position = position;
    }

    pub fn bounding_box(&self) -> Rect {
        let mut rect = Rect::from_center(self.position, Size::default());
        for pad in &self.pads {
            rect.merge(&pad.bounding_box());
        }
        rect
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub id: Kiid,
    pub layers: LayerSet,
    /// Rule areas (keepouts) are not electrical and never carry a net.
    #[serde(default)]
    pub is_rule_area: bool,
    #[serde(default)]
    pub net: NetCode,
    pub outline: Vec<Point>,
}

impl Zone {
    /// Copper, non-rule-area zones take part in net logic.
    pub fn is_electrical(&self) -> bool {
        !self.is_rule_area && self.layers.is_on_copper()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Via {
    #[serde(default)]
    pub id: Kiid,
    pub position: Point,
    pub diameter: i64,
    #[serde(default = "LayerSet::all_copper")]
    pub layers: LayerSet,
    #[serde(default)]
    pub net: NetCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Kiid,
    pub start: Point,
    pub end: Point,
    pub width: i64,
    pub layer: Layer,
    #[serde(default)]
    pub net: NetCode,
}

/// Drawing sheet size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: i64,
    pub height: i64,
}

impl Default for PageSize {
    /// A4 landscape.
    fn default() -> Self {
        Self {
            width: mm(297),
            height: mm(210),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub nets: NetRegistry,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Board outline (`Edge.Cuts`) as a closed polygon.
    #[serde(default)]
    pub outline: Vec<Point>,
    #[serde(default)]
    pub page: PageSize,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read board from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse board JSON from {}", path.display()))
    }

    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize board")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write board to {}", path.display()))
    }

    /// True when the board carries no items at all.
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
            && self.zones.is_empty()
            && self.vias.is_empty()
            && self.tracks.is_empty()
            && self.outline.is_empty()
    }

    pub fn footprint(&self, id: Kiid) -> Option<&Footprint> {
        self.footprints.iter().find(|fp| fp.id == id)
    }

    pub fn footprint_mut(&mut self, id: Kiid) -> Option<&mut Footprint> {
        self.footprints.iter_mut().find(|fp| fp.id == id)
    }

    pub fn footprint_index(&self, id: Kiid) -> Option<usize> {
        self.footprints.iter().position(|fp| fp.id == id)
    }

    pub fn pad(&self, pad: PadRef) -> Option<&Pad> {
        self.footprint(pad.footprint)?.pads.get(pad.index)
    }

    pub fn pad_mut(&mut self, pad: PadRef) -> Option<&mut Pad> {
        self.footprint_mut(pad.footprint)?.pads.get_mut(pad.index)
    }

    /// Every pad on the board, in footprint order.
    pub fn pads(&self) -> impl Iterator<Item = (PadRef, &Pad)> {
        self.footprints.iter().flat_map(|fp| {
            fp.pads
                .iter()
                .enumerate()
                .map(move |(index, pad)| (fp.pad_ref(index), pad))
        })
    }

    pub fn zone_mut(&mut self, id: Kiid) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.id == id)
    }

    pub fn via_mut(&mut self, id: Kiid) -> Option<&mut Via> {
        self.vias.iter_mut().find(|v| v.id == id)
    }

    /// Name of the net `code` refers to.
    pub fn net_name(&self, code: NetCode) -> &str {
        self.nets.name_of(code)
    }

    /// Bounding box of the board edges, falling back to every item when the
    /// board has no outline.
    pub fn edges_bounding_box(&self) -> Option<Rect> {
        if let Some(rect) = Rect::enclosing(self.outline.iter().copied()) {
            return Some(rect);
        }

        let mut boxes: Vec<Rect> = self.footprints.iter().map(Footprint::bounding_box).collect();
        boxes.extend(
            self.zones
                .iter()
                .filter_map(|zone| Rect::enclosing(zone.outline.iter().copied())),
        );
        boxes.extend(
            self.vias
                .iter()
                .map(|via| Rect::from_center(via.position, Size::new(via.diameter, via.diameter))),
        );
        boxes.extend(
            self.tracks
                .iter()
                .filter_map(|track| Rect::enclosing([track.start, track.end])),
        );

        boxes.into_iter().reduce(|mut acc, r| {
            acc.merge(&r);
            acc
        })
    }

    /// Compute a fresh connectivity snapshot.
    pub fn build_connectivity(&self) -> Connectivity {
        Connectivity::build(self)
    }
}
