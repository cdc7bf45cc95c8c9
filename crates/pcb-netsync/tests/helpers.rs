use pcb_netsync::geometry::{Point, mm};
use pcb_netsync::layer::{Layer, LayerSet};
use pcb_netsync::{
    Board, BoardNetlistUpdater, ChangeRecord, Component, ComponentNet, Footprint,
    FootprintLibrary, FootprintLoader, Kiid, LibId, Netlist, Pad, ReportLog, Severity,
    UpdateOptions, UpdateSummary, Via, Zone,
};

/// Library footprint with pads `1..=count` spaced `pitch_mm` apart on F.Cu.
#[allow(unused)]
pub fn library_footprint(fpid: &str, count: usize, pitch_mm: i64) -> Footprint {
    let mut fp = Footprint::new(LibId::from(fpid), "REF**");
    for n in 0..count {
        let mut pad = Pad::new((n + 1).to_string(), LayerSet::single(Layer::F_CU));
        pad.position = Point::new(mm(pitch_mm) * n as i64, 0);
        fp.pads.push(pad);
    }
    fp
}

/// Small test library: resistor packages, a capacitor and an SOIC-8.
/// `R:R_0603_Rev` stores its pads in the order "2", "1".
#[allow(unused)]
pub fn library() -> FootprintLibrary {
    let mut reversed = library_footprint("R:R_0603_Rev", 2, 2);
    reversed.pads.reverse();

    FootprintLibrary::new()
        .with(library_footprint("R:R_0603", 2, 2))
        .with(reversed)
        .with(library_footprint("R:R_0805", 2, 3))
        .with(library_footprint("C:C_0603", 2, 2))
        .with(library_footprint("U:SOIC-8", 8, 1))
}

#[allow(unused)]
pub fn component(reference: &str, fpid: &str, pins: &[(&str, &str)]) -> Component {
    let mut c = Component::new(reference, "1k", LibId::from(fpid));
    c.path = format!("/{}", reference.to_lowercase());
    c.pins = pins
        .iter()
        .map(|(pin, net)| ComponentNet::new(*pin, *net))
        .collect();
    c
}

/// Board that already matches `netlist`: one footprint per component, laid
/// out along a row, pads bound to their nets.
#[allow(unused)]
pub fn build_board(netlist: &Netlist) -> Board {
    let library = library();
    let mut board = Board::new();
    for (i, c) in netlist.components.iter().enumerate() {
        let mut fp = library
            .load_footprint(&c.fpid)
            .expect("test footprint exists");
        fp.reference = c.reference.clone();
        fp.value = c.value.clone();
        fp.path = c.path.clone();
        fp.properties = c.footprint_properties();
        fp.set_position(Point::new(mm(10) * i as i64, mm(20)));
        for pad in &mut fp.pads {
            if let Some(pin) = c.net_for_pin(&pad.number) {
                if !pin.net.is_empty() {
                    pad.net = board.nets.add(&pin.net);
                }
            }
        }
        board.footprints.push(fp);
    }
    board
}

/// Stitching via far away from every pad.
#[allow(unused)]
pub fn stray_via(board: &mut Board, net: &str) -> Kiid {
    let via = Via {
        id: Kiid::new(),
        position: Point::new(mm(100), mm(100)),
        diameter: mm(1) / 2,
        layers: LayerSet::all_copper(),
        net: board.nets.find(net).expect("net exists").code,
    };
    let id = via.id;
    board.vias.push(via);
    id
}

/// Square copper zone of half-size `half_mm` centred on `center`.
#[allow(unused)]
pub fn zone_around(board: &mut Board, center: Point, half_mm: i64, net: &str) -> Kiid {
    let h = mm(half_mm);
    let zone = Zone {
        id: Kiid::new(),
        layers: LayerSet::single(Layer::F_CU),
        is_rule_area: false,
        net: board.nets.find(net).expect("net exists").code,
        outline: vec![
            center.offset(-h, -h),
            center.offset(h, -h),
            center.offset(h, h),
            center.offset(-h, h),
        ],
    };
    let id = zone.id;
    board.zones.push(zone);
    id
}

pub struct RunResult {
    pub summary: UpdateSummary,
    pub log: ReportLog,
    pub record: Option<ChangeRecord>,
    pub old_to_new: Vec<(String, String)>,
}

#[allow(unused)]
impl RunResult {
    pub fn actions(&self) -> Vec<&str> {
        self.log.messages(Severity::Action)
    }
}

#[allow(unused)]
pub fn run(board: &mut Board, netlist: &Netlist, options: UpdateOptions) -> RunResult {
    let library = library();
    let mut log = ReportLog::new();
    let mut updater =
        BoardNetlistUpdater::new(board, &library, &mut log).with_options(options);
    let summary = updater.update_netlist(netlist);
    let record = updater.take_change_record();
    let old_to_new = updater
        .old_to_new_nets()
        .iter()
        .map(|(a, b)| (a.clone(), b.clone()))
        .collect();
    drop(updater);
    RunResult {
        summary,
        log,
        record,
        old_to_new,
    }
}

#[allow(unused)]
pub fn footprint<'a>(board: &'a Board, reference: &str) -> &'a Footprint {
    board
        .footprints
        .iter()
        .find(|fp| fp.reference == reference)
        .expect("footprint exists")
}

/// Net name of `reference.pad` on the board.
#[allow(unused)]
pub fn pad_net<'a>(board: &'a Board, reference: &str, pad: &str) -> &'a str {
    let pad = footprint(board, reference)
        .find_pad(pad)
        .expect("pad exists");
    board.net_name(pad.net)
}
