use std::collections::HashSet;
use tracing::instrument;

use super::BoardNetlistUpdater;
use crate::board::PadRef;
use crate::net::NetCode;

impl BoardNetlistUpdater<'_> {
    /// Clear nets that reach exactly one pad and no copper zone.
    #[instrument(name = "delete_single_pad_nets", skip_all)]
    pub(super) fn delete_single_pad_nets(&mut self) {
        let refs: Vec<PadRef> = self.board.pads().map(|(pad, _)| pad).collect();
        let mut pads: Vec<(String, PadRef)> = refs
            .into_iter()
            .map(|pad| (self.pad_net_name(pad), pad))
            .filter(|(name, _)| !name.is_empty())
            .collect();
        // stable, so pads of one net stay in board order
        pads.sort_by(|a, b| a.0.cmp(&b.0));

        let zone_nets: HashSet<String> = self
            .board
            .zones
            .iter()
            .filter(|z| z.is_electrical() && !z.net.is_unconnected())
            .map(|z| self.board.net_name(z.net).to_string())
            .collect();

        let lone: Vec<(String, PadRef)> = pads
            .chunk_by(|a, b| a.0 == b.0)
            .filter(|run| run.len() == 1 && !zone_nets.contains(&run[0].0))
            .map(|run| run[0].clone())
            .collect();

        for (name, pad_ref) in lone {
            self.action(format!("Remove single pad net {name}."));

            if self.dry_run() {
                self.pad_nets.insert(pad_ref, String::new());
                continue;
            }

            self.snapshot_footprint(pad_ref.footprint);
            let Some(pad) = self.board.pad_mut(pad_ref) else {
                continue;
            };
            let code = pad.net;
            pad.net = NetCode::UNCONNECTED;
            // nothing else is on it, so let the stale sweep remove it
            if let Some(net) = self.board.nets.get_mut(code) {
                net.is_current = code.is_unconnected();
            }
        }
    }

    /// Remove every net still stale. Zones, vias and tracks left on such a
    /// net fall back to the unconnected net.
    #[instrument(name = "prune_stale_nets", skip_all)]
    pub(super) fn prune_stale_nets(&mut self) {
        for net in self.board.nets.stale() {
            self.action(format!("Remove unused net \"{}\".", net.name));

            for zone in self.board.zones.iter_mut().filter(|z| z.net == net.code) {
                self.commit.modify_zone(zone.clone());
                zone.net = NetCode::UNCONNECTED;
            }
            for via in self.board.vias.iter_mut().filter(|v| v.net == net.code) {
                self.commit.modify_via(via.clone());
                via.net = NetCode::UNCONNECTED;
            }
            for track in self.board.tracks.iter_mut().filter(|t| t.net == net.code) {
                self.commit.modify_track(track.clone());
                track.net = NetCode::UNCONNECTED;
            }

            self.commit.remove_net(self.board, net.code);
        }
    }
}
