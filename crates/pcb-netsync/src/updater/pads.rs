use std::collections::{HashMap, HashSet};

use super::{BoardNetlistUpdater, match_component};
use crate::board::{Kiid, PadRef};
use crate::net::NetCode;
use crate::netlist::{Component, Netlist};

impl BoardNetlistUpdater<'_> {
    /// Pads each net should have once the pass is done: the netlist pins plus
    /// the pads of footprints no component claims and the sweep keeps.
    pub(super) fn expected_pad_counts(
        &self,
        netlist: &Netlist,
        boundary: usize,
    ) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = netlist
            .pin_counts()
            .into_iter()
            .map(|(net, count)| (net.to_string(), count))
            .collect();

        let matched: HashSet<usize> = netlist
            .components
            .iter()
            .filter(|c| !c.exclude_from_board())
            .filter_map(|c| {
                match_component(
                    &self.board.footprints,
                    boundary,
                    c,
                    self.options.lookup_by_path,
                )
                .index()
            })
            .collect();

        let kept = self.board.footprints[..boundary]
            .iter()
            .enumerate()
            .filter(|(i, fp)| {
                // locked footprints survive the sweep with a warning
                !matched.contains(i) && (fp.locked || !self.sweeps_footprint(netlist, fp))
            })
            .map(|(_, fp)| fp);
        for footprint in kept {
            for pad in footprint.pads.iter().filter(|p| !p.net.is_unconnected()) {
                *counts
                    .entry(self.board.net_name(pad.net).to_string())
                    .or_default() += 1;
            }
        }
        counts
    }

    /// True when `net` would be cleared again by single-pad pruning: one
    /// expected pad and no copper zone on it.
    fn is_single_pin_net(&self, net: &str, pad_counts: &HashMap<String, usize>) -> bool {
        self.options.delete_single_pad_nets
            && pad_counts.get(net).copied() == Some(1)
            && !self
                .board
                .zones
                .iter()
                .any(|z| z.is_electrical() && self.board.net_name(z.net) == net)
    }

    /// Resolve `name` to a board net, creating it when needed. Returns `None`
    /// in dry-run, where new nets only exist by name.
    fn resolve_net(&mut self, name: &str) -> Option<NetCode> {
        if let Some(net) = self.board.nets.find(name) {
            return Some(net.code);
        }
        if self.added_nets.contains(name) {
            return None;
        }

        self.added_nets.insert(name.to_string());
        self.action(format!("Add net {name}."));

        if self.dry_run() {
            return None;
        }
        let code = self.board.nets.add(name);
        self.commit.add_net(code);
        Some(code)
    }

    pub(super) fn update_component_pad_connections(
        &mut self,
        id: Kiid,
        component: &Component,
        pad_counts: &HashMap<String, usize>,
    ) {
        let Some(footprint) = self.board.footprint(id) else {
            return;
        };
        let reference = footprint.reference.clone();
        let pad_count = footprint.pads.len();

        for index in 0..pad_count {
            let pad_ref = PadRef {
                footprint: id,
                index,
            };
            let Some(pad) = self.board.pad(pad_ref) else {
                continue;
            };
            let number = pad.number.clone();
            let on_copper = pad.is_on_copper();

            let pin = component.net_for_pin(&number);
            let (pin_function, pin_type) = pin
                .map(|p| (p.pin_function.clone(), p.pin_type.clone()))
                .unwrap_or_default();

            if self.dry_run() {
                self.pad_pin_functions.insert(pad_ref, pin_function);
            } else if pad.pin_function != pin_function || pad.pin_type != pin_type {
                self.snapshot_footprint(id);
                if let Some(pad) = self.board.pad_mut(pad_ref) {
                    pad.pin_function = pin_function;
                    pad.pin_type = pin_type;
                }
            }

            let current = self.pad_net_name(pad_ref);
            let target = pin
                .filter(|p| on_copper && !p.net.is_empty())
                .map(|p| p.net.as_str());

            let target = match target {
                Some(net) if current.is_empty() && self.is_single_pin_net(net, pad_counts) => {
                    // already in its pruned state
                    continue;
                }
                Some(net) => net,
                None => {
                    self.disconnect_pad(pad_ref, &reference, &number, &current, on_copper);
                    continue;
                }
            };

            if !self.dry_run() {
                if let Some(code) = self.board.nets.find(target).map(|n| n.code) {
                    self.board.nets.set_current(code);
                }
            }

            if current == target {
                continue;
            }

            let code = self.resolve_net(target);

            if current.is_empty() {
                self.action(format!("Connect {reference} pin {number} to {target}."));
            } else {
                self.old_to_new_nets
                    .insert(current.clone(), target.to_string());
                self.action(format!(
                    "Reconnect {reference} pin {number} from {current} to {target}."
                ));
            }

            if self.dry_run() {
                self.pad_nets.insert(pad_ref, target.to_string());
            } else if let Some(code) = code {
                self.snapshot_footprint(id);
                if let Some(pad) = self.board.pad_mut(pad_ref) {
                    pad.net = code;
                }
            }
        }
    }

    fn disconnect_pad(
        &mut self,
        pad_ref: PadRef,
        reference: &str,
        number: &str,
        current: &str,
        on_copper: bool,
    ) {
        if !current.is_empty() {
            self.action(format!("Disconnect {reference} pin {number}."));
        } else if self.options.warn_for_no_net_pads && on_copper && !number.is_empty() {
            self.warning(format!("No net for symbol {reference} pin {number}."));
        }

        if self.dry_run() {
            self.pad_nets.insert(pad_ref, String::new());
            self.pad_pin_functions.insert(pad_ref, String::new());
            return;
        }

        let needs_change = self
            .board
            .pad(pad_ref)
            .is_some_and(|p| !p.net.is_unconnected() || !p.pin_function.is_empty());
        if needs_change {
            self.snapshot_footprint(pad_ref.footprint);
            if let Some(pad) = self.board.pad_mut(pad_ref) {
                pad.net = NetCode::UNCONNECTED;
                pad.pin_function.clear();
            }
        }
    }
}
