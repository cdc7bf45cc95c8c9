use log::debug;
use tracing::instrument;

use super::BoardNetlistUpdater;
use crate::board::{Footprint, FootprintAttributes, Kiid};
use crate::geometry::{Point, mm};
use crate::net::NetCode;
use crate::netlist::{Component, Netlist};

/// Gap between the board and newly placed footprints.
const INSERTION_MARGIN: i64 = mm(10);

/// Copy the schematic-owned fields of `component` onto `footprint`.
fn apply_component(footprint: &mut Footprint, component: &Component) {
    footprint.reference = component.reference.clone();
    footprint.value = component.value.clone();
    footprint.path = component.path.clone();
    footprint.properties = component.footprint_properties();
    footprint.attributes.set(
        FootprintAttributes::EXCLUDE_FROM_BOM,
        component.exclude_from_bom(),
    );
}

impl BoardNetlistUpdater<'_> {
    /// Where new footprints go: centred below the board edges, or in the
    /// middle of the page when the board is empty. Computed once per pass.
    fn insertion_position(&mut self) -> Point {
        if let Some(point) = self.insertion_point {
            return point;
        }

        let point = if self.board.is_empty() {
            Point::new(self.board.page.width / 2, self.board.page.height / 2)
        } else {
            match self.board.edges_bounding_box() {
                Some(bbox) if bbox.width() != 0 || bbox.height() != 0 => {
                    Point::new(bbox.center().x, bbox.bottom() + INSERTION_MARGIN)
                }
                _ => Point::default(),
            }
        };

        self.insertion_point = Some(point);
        point
    }

    /// Deterministic id derived from the symbol path when it is free.
    fn new_footprint_id(&self, component: &Component) -> Kiid {
        if !component.path.is_empty() {
            let id = Kiid::from_path(&component.path);
            if self.board.footprint(id).is_none() {
                return id;
            }
        }
        Kiid::new()
    }

    fn load_library_footprint(&mut self, component: &Component, verb: &str) -> Option<Footprint> {
        if component.fpid.is_empty() {
            self.error(format!(
                "Cannot {verb} {} (no footprint assigned).",
                component.reference
            ));
            return None;
        }

        let footprint = self.library.load_footprint(&component.fpid);
        if footprint.is_none() {
            self.error(format!(
                "Cannot {verb} {} (footprint \"{}\" not found).",
                component.reference, component.fpid
            ));
        }
        footprint
    }

    /// Instantiate a footprint for an unmatched component. Returns the id of
    /// the footprint placed on the board, which never happens in dry-run.
    pub(super) fn add_new_footprint(&mut self, component: &Component) -> Option<Kiid> {
        let mut footprint = self.load_library_footprint(component, "add")?;

        self.action(format!(
            "Add {} (footprint \"{}\").",
            component.reference, component.fpid
        ));

        // library pads carry no meaningful nets
        let locked = !self.options.add_unlocked_pads;
        for pad in &mut footprint.pads {
            pad.locked = locked;
            pad.net = NetCode::UNCONNECTED;
        }

        self.summary.new_footprints += 1;

        if self.dry_run() {
            return None;
        }

        footprint.id = self.new_footprint_id(component);
        apply_component(&mut footprint, component);
        let position = self.insertion_position();
        footprint.set_position(position);

        let id = footprint.id;
        debug!("Placing {} at {:?}", footprint.reference, position);
        self.commit.add_footprint(id);
        self.board.footprints.push(footprint);
        Some(id)
    }

    /// Exchange a footprint whose library id changed. The replacement keeps
    /// identity, placement, metadata and lock state; pads that exist in both
    /// keep their nets.
    pub(super) fn replace_footprint(&mut self, id: Kiid, component: &Component) -> Option<Kiid> {
        let mut replacement = self.load_library_footprint(component, "update")?;
        let old = self.board.footprint(id)?.clone();

        self.action(format!(
            "Change {} footprint from \"{}\" to \"{}\".",
            old.reference, old.fpid, component.fpid
        ));
        self.summary.new_footprints += 1;

        if self.dry_run() {
            return None;
        }

        replacement.id = old.id;
        replacement.reference = old.reference.clone();
        replacement.value = old.value.clone();
        replacement.path = old.path.clone();
        replacement.properties = old.properties.clone();
        replacement.attributes = old.attributes;
        replacement.locked = old.locked;
        for pad in &mut replacement.pads {
            pad.net = old
                .find_pad(&pad.number)
                .map(|p| p.net)
                .unwrap_or(NetCode::UNCONNECTED);
        }
        replacement.set_position(old.position);

        self.commit.modify_footprint(old);
        let slot = self.board.footprint_mut(id)?;
        *slot = replacement;
        Some(id)
    }

    /// Bring reference, value, path, properties and the BOM attribute in
    /// line with the component.
    pub(super) fn update_footprint_parameters(&mut self, id: Kiid, component: &Component) {
        let Some(footprint) = self.board.footprint(id) else {
            return;
        };

        let dry_run = self.dry_run();
        let mut messages = Vec::new();
        let mut shown = footprint.reference.clone();

        if footprint.reference != component.reference {
            messages.push(format!(
                "Change {} reference designator to {}.",
                footprint.reference, component.reference
            ));
            if !dry_run {
                shown = component.reference.clone();
            }
        }

        if footprint.value != component.value {
            messages.push(format!(
                "Change {shown} value from {} to {}.",
                footprint.value, component.value
            ));
        }

        if footprint.path != component.path {
            messages.push(format!(
                "Update {shown} symbol association from {} to {}.",
                footprint.path, component.path
            ));
        }

        if footprint.properties != component.footprint_properties() {
            messages.push(format!("Update {shown} properties."));
        }

        let exclude = component.exclude_from_bom();
        if exclude
            != footprint
                .attributes
                .contains(FootprintAttributes::EXCLUDE_FROM_BOM)
        {
            let verb = if exclude { "Setting" } else { "Removing" };
            messages.push(format!(
                "{verb} {shown} 'exclude from BOM' fabrication attribute."
            ));
        }

        if messages.is_empty() {
            return;
        }
        for msg in messages {
            self.action(msg);
        }
        if dry_run {
            return;
        }

        self.snapshot_footprint(id);
        if let Some(footprint) = self.board.footprint_mut(id) {
            apply_component(footprint, component);
        }
    }

    /// Whether the unused sweep removes `footprint`, lock aside: deletion is
    /// on, the footprint is not board-only and no live component claims it.
    pub(super) fn sweeps_footprint(&self, netlist: &Netlist, footprint: &Footprint) -> bool {
        if !self.options.delete_unused_footprints
            || footprint.attributes.contains(FootprintAttributes::BOARD_ONLY)
        {
            return false;
        }
        let component = if self.options.lookup_by_path {
            netlist.component_by_path(&footprint.path)
        } else {
            netlist.component_by_reference(&footprint.reference)
        };
        !component.is_some_and(|c| !c.exclude_from_board())
    }

    /// Remove or keep footprints that have no component in the netlist.
    /// Kept footprints keep the nets of their pads alive.
    #[instrument(name = "sweep_unused_footprints", skip_all)]
    pub(super) fn sweep_unused_footprints(&mut self, netlist: &Netlist) {
        let ids: Vec<Kiid> = self.board.footprints.iter().map(|fp| fp.id).collect();

        for id in ids {
            let Some(footprint) = self.board.footprint(id) else {
                continue;
            };

            let mut delete = self.sweeps_footprint(netlist, footprint);

            let reference = footprint.reference.clone();
            if delete && footprint.locked {
                self.warning(format!(
                    "Cannot remove unused footprint {reference} (locked)."
                ));
                delete = false;
            }

            if delete {
                self.action(format!("Remove unused footprint {reference}."));
                if !self.dry_run() {
                    self.commit.remove_footprint(self.board, id);
                }
            } else if !self.dry_run() {
                let nets: Vec<NetCode> = self
                    .board
                    .footprint(id)
                    .map(|fp| fp.pads.iter().map(|p| p.net).collect())
                    .unwrap_or_default();
                for code in nets {
                    self.board.nets.set_current(code);
                }
            }
        }
    }
}
