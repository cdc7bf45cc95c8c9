use tracing::instrument;

use super::BoardNetlistUpdater;
use crate::board::{Kiid, PadRef};
use crate::connectivity::ItemRef;
use crate::net::NetCode;
use crate::netlist::Netlist;

#[derive(Debug, Clone, Copy)]
enum Repairable {
    Via(Kiid),
    Zone(Kiid),
}

/// A pad named by footprint and pad number. Footprint replacement keeps the
/// footprint id but may reorder pads, so indices are resolved late.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct PadKey {
    footprint: Kiid,
    number: String,
}

impl BoardNetlistUpdater<'_> {
    /// Remember which pads every copper zone and via reaches before anything
    /// changes.
    #[instrument(name = "cache_copper_connections", skip_all)]
    pub(super) fn cache_copper_connections(&mut self) {
        let connectivity = self.board.build_connectivity();

        let mut items: Vec<(Kiid, ItemRef)> = self
            .board
            .zones
            .iter()
            .filter(|z| z.is_electrical())
            .map(|z| (z.id, ItemRef::Zone(z.id)))
            .collect();
        items.extend(self.board.vias.iter().map(|v| (v.id, ItemRef::Via(v.id))));

        for (id, item) in items {
            let keys = connectivity
                .connected_pads(item)
                .into_iter()
                .filter_map(|pad| {
                    self.board.pad(pad).map(|p| PadKey {
                        footprint: pad.footprint,
                        number: p.number.clone(),
                    })
                })
                .collect();
            self.item_pads.insert(id, keys);
        }
    }

    fn resolve_pad(&self, key: &PadKey) -> Option<PadRef> {
        let footprint = self.board.footprint(key.footprint)?;
        let index = footprint.pads.iter().position(|p| p.number == key.number)?;
        Some(PadRef {
            footprint: key.footprint,
            index,
        })
    }

    /// Net a dead zone or via should move to: the first previously connected
    /// pad now on another net, else the rename map.
    fn repair_candidate(&self, id: Kiid, current: &str) -> Option<String> {
        let from_pads = self.item_pads.get(&id).and_then(|pads| {
            pads.iter()
                .filter_map(|key| self.resolve_pad(key))
                .map(|pad| self.pad_net_name(pad))
                .find(|name| !name.is_empty() && name != current)
        });

        from_pads.or_else(|| self.old_to_new_nets.get(current).cloned())
    }

    /// Rebind zones and vias whose net no longer appears in the netlist.
    #[instrument(name = "update_copper_zone_nets", skip_all)]
    pub(super) fn update_copper_zone_nets(&mut self, netlist: &Netlist) {
        let netlist_nets = netlist.net_names();

        let mut items: Vec<(Repairable, NetCode)> = self
            .board
            .vias
            .iter()
            .map(|v| (Repairable::Via(v.id), v.net))
            .collect();
        items.extend(
            self.board
                .zones
                .iter()
                .filter(|z| z.is_electrical())
                .map(|z| (Repairable::Zone(z.id), z.net)),
        );

        for (item, net) in items {
            if net.is_unconnected() {
                continue;
            }
            let current = self.board.net_name(net).to_string();
            if netlist_nets.contains(&current) {
                continue;
            }

            let id = match item {
                Repairable::Via(id) | Repairable::Zone(id) => id,
            };

            let Some(updated) = self.repair_candidate(id, &current) else {
                match item {
                    Repairable::Via(_) => {
                        self.warning(format!("Via connected to unknown net ({current})."))
                    }
                    Repairable::Zone(_) => {
                        self.warning(format!("Copper zone ({current}) has no pads connected."))
                    }
                }
                continue;
            };

            match item {
                Repairable::Via(_) => {
                    self.action(format!("Reconnect via from {current} to {updated}."))
                }
                Repairable::Zone(_) => self.action(format!(
                    "Reconnect copper zone from {current} to {updated}."
                )),
            }

            if self.dry_run() {
                continue;
            }
            let Some(code) = self.board.nets.find(&updated).map(|n| n.code) else {
                continue;
            };

            match item {
                Repairable::Via(id) => {
                    if let Some(via) = self.board.via_mut(id) {
                        self.commit.modify_via(via.clone());
                        via.net = code;
                    }
                }
                Repairable::Zone(id) => {
                    if let Some(zone) = self.board.zone_mut(id) {
                        self.commit.modify_zone(zone.clone());
                        zone.net = code;
                    }
                }
            }
        }
    }
}
