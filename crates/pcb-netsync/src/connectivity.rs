//! Connectivity snapshot.
//!
//! Items of the same (non-zero) net that share a copper layer and touch are
//! grouped into clusters. The updater only asks one question of a snapshot:
//! which pads does a given zone or via reach.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::board::{Board, Kiid, PadRef};
use crate::geometry::{Point, Rect, polygon_contains, segment_hits};
use crate::layer::LayerSet;
use crate::net::NetCode;

/// Handle of a connectable board item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemRef {
    Pad(PadRef),
    Via(Kiid),
    Track(Kiid),
    Zone(Kiid),
}

/// Copper geometry of one item.
#[derive(Debug, Clone)]
enum ConnShape {
    Pad(Rect),
    Via { center: Point, radius: i64 },
    Track { start: Point, end: Point, radius: i64 },
    Zone(Vec<Point>),
}

impl ConnShape {
    fn hit(&self, p: Point) -> bool {
        match self {
            ConnShape::Pad(rect) => rect.contains(p),
            ConnShape::Via { center, radius } => segment_hits(*center, *center, *radius, p),
            ConnShape::Track { start, end, radius } => segment_hits(*start, *end, *radius, p),
            ConnShape::Zone(outline) => polygon_contains(outline, p),
        }
    }

    /// Points that must land on another item for the two to connect.
    fn anchors(&self) -> Vec<Point> {
        match self {
            ConnShape::Pad(rect) => vec![rect.center()],
            ConnShape::Via { center, .. } => vec![*center],
            ConnShape::Track { start, end, .. } => vec![*start, *end],
            ConnShape::Zone(outline) => outline.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct ConnItem {
    item: ItemRef,
    net: NetCode,
    layers: LayerSet,
    shape: ConnShape,
}

impl ConnItem {
    fn touches(&self, other: &ConnItem) -> bool {
        self.layers.intersects(other.layers)
            && (self.shape.anchors().into_iter().any(|p| other.shape.hit(p))
                || other.shape.anchors().into_iter().any(|p| self.shape.hit(p)))
    }
}

fn collect_items(board: &Board) -> Vec<ConnItem> {
    let mut items = Vec::new();

    for (pad_ref, pad) in board.pads() {
        if pad.net.is_unconnected() || !pad.is_on_copper() {
            continue;
        }
        items.push(ConnItem {
            item: ItemRef::Pad(pad_ref),
            net: pad.net,
            layers: pad.layers,
            shape: ConnShape::Pad(pad.bounding_box()),
        });
    }

    for via in board.vias.iter().filter(|v| !v.net.is_unconnected()) {
        items.push(ConnItem {
            item: ItemRef::Via(via.id),
            net: via.net,
            layers: via.layers,
            shape: ConnShape::Via {
                center: via.position,
                radius: via.diameter / 2,
            },
        });
    }

    for track in board.tracks.iter().filter(|t| !t.net.is_unconnected()) {
        items.push(ConnItem {
            item: ItemRef::Track(track.id),
            net: track.net,
            layers: LayerSet::single(track.layer),
            shape: ConnShape::Track {
                start: track.start,
                end: track.end,
                radius: track.width / 2,
            },
        });
    }

    for zone in board
        .zones
        .iter()
        .filter(|z| z.is_electrical() && !z.net.is_unconnected())
    {
        items.push(ConnItem {
            item: ItemRef::Zone(zone.id),
            net: zone.net,
            layers: zone.layers,
            shape: ConnShape::Zone(zone.outline.clone()),
        });
    }

    items
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // lower index wins so cluster roots are deterministic
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}

/// Immutable clustering of the board's copper items.
#[derive(Debug, Clone, Default)]
pub struct Connectivity {
    items: Vec<ItemRef>,
    index: HashMap<ItemRef, usize>,
    cluster: Vec<usize>,
}

impl Connectivity {
    #[tracing::instrument(name = "build_connectivity", skip_all)]
    pub fn build(board: &Board) -> Self {
        let items = collect_items(board);

        let mut by_net: BTreeMap<NetCode, Vec<usize>> = BTreeMap::new();
        for (i, item) in items.iter().enumerate() {
            by_net.entry(item.net).or_default().push(i);
        }
        let groups: Vec<Vec<usize>> = by_net.into_values().filter(|g| g.len() > 1).collect();

        // Each group yields its own edge list; merging happens after the join.
        let edges: Vec<Vec<(usize, usize)>> = groups
            .par_iter()
            .map(|group| {
                let mut edges = Vec::new();
                for (n, &a) in group.iter().enumerate() {
                    for &b in &group[n + 1..] {
                        if items[a].touches(&items[b]) {
                            edges.push((a, b));
                        }
                    }
                }
                edges
            })
            .collect();

        let mut parent: Vec<usize> = (0..items.len()).collect();
        for (a, b) in edges.into_iter().flatten() {
            union(&mut parent, a, b);
        }
        let cluster = (0..items.len()).map(|i| find(&mut parent, i)).collect();

        let refs: Vec<ItemRef> = items.into_iter().map(|i| i.item).collect();
        let index = refs.iter().enumerate().map(|(i, r)| (*r, i)).collect();

        log::debug!("Connectivity snapshot over {} items", refs.len());
        Self {
            items: refs,
            index,
            cluster,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when both items are in the same cluster.
    pub fn are_connected(&self, a: ItemRef, b: ItemRef) -> bool {
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(&a), Some(&b)) => self.cluster[a] == self.cluster[b],
            _ => false,
        }
    }

    /// Pads in the same cluster as `item`, in board order.
    pub fn connected_pads(&self, item: ItemRef) -> Vec<PadRef> {
        let Some(&i) = self.index.get(&item) else {
            return Vec::new();
        };
        let root = self.cluster[i];
        self.items
            .iter()
            .zip(&self.cluster)
            .filter(|(_, c)| **c == root)
            .filter_map(|(r, _)| match r {
                ItemRef::Pad(pad) => Some(*pad),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, Pad, Track, Via, Zone};
    use crate::geometry::mm;
    use crate::layer::Layer;
    use crate::library::LibId;

    fn pad_at(number: &str, x: i64, net: NetCode) -> Pad {
        let mut pad = Pad::new(number, LayerSet::single(Layer::F_CU));
        pad.position = Point::new(x, 0);
        pad.net = net;
        pad
    }

    fn board() -> (Board, NetCode) {
        let mut board = Board::new();
        let gnd = board.nets.add("GND");
        let mut fp = Footprint::new(LibId::from("L:F"), "J1");
        fp.pads = vec![
            pad_at("1", 0, gnd),
            pad_at("2", mm(10), gnd),
            pad_at("3", mm(20), gnd),
        ];
        board.footprints.push(fp);
        (board, gnd)
    }

    #[test]
    fn track_and_via_join_pads() {
        let (mut board, gnd) = board();
        let fp = board.footprints[0].id;
        board.tracks.push(Track {
            id: Kiid::new(),
            start: Point::new(0, 0),
            end: Point::new(mm(5), 0),
            width: mm(1) / 4,
            layer: Layer::F_CU,
            net: gnd,
        });
        let via = Via {
            id: Kiid::new(),
            position: Point::new(mm(5), 0),
            diameter: mm(1) / 2,
            layers: LayerSet::all_copper(),
            net: gnd,
        };
        let via_id = via.id;
        board.vias.push(via);

        let conn = board.build_connectivity();
        let pads = conn.connected_pads(ItemRef::Via(via_id));
        assert_eq!(pads, vec![PadRef { footprint: fp, index: 0 }]);
        assert!(!conn.are_connected(
            ItemRef::Pad(PadRef { footprint: fp, index: 0 }),
            ItemRef::Pad(PadRef { footprint: fp, index: 1 })
        ));
    }

    #[test]
    fn zone_reaches_contained_pads_only() {
        let (mut board, gnd) = board();
        let fp = board.footprints[0].id;
        let zone = Zone {
            id: Kiid::new(),
            layers: LayerSet::single(Layer::F_CU),
            is_rule_area: false,
            net: gnd,
            outline: vec![
                Point::new(mm(5), -mm(5)),
                Point::new(mm(25), -mm(5)),
                Point::new(mm(25), mm(5)),
                Point::new(mm(5), mm(5)),
            ],
        };
        let zone_id = zone.id;
        board.zones.push(zone);

        let conn = board.build_connectivity();
        assert_eq!(
            conn.connected_pads(ItemRef::Zone(zone_id)),
            vec![
                PadRef { footprint: fp, index: 1 },
                PadRef { footprint: fp, index: 2 }
            ]
        );
    }

    #[test]
    fn different_layers_or_nets_do_not_connect() {
        let (mut board, gnd) = board();
        let vcc = board.nets.add("VCC");
        board.footprints[0].pads[1].net = vcc;
        let zone = Zone {
            id: Kiid::new(),
            layers: LayerSet::single(Layer::B_CU),
            is_rule_area: false,
            net: gnd,
            outline: vec![
                Point::new(-mm(5), -mm(5)),
                Point::new(mm(25), -mm(5)),
                Point::new(mm(25), mm(5)),
            ],
        };
        let zone_id = zone.id;
        board.zones.push(zone);

        let conn = board.build_connectivity();
        assert!(conn.connected_pads(ItemRef::Zone(zone_id)).is_empty());
        assert!(conn.connected_pads(ItemRef::Via(Kiid::new())).is_empty());
    }
}
