use super::BoardNetlistUpdater;
use crate::board::Kiid;
use crate::netlist::Netlist;

impl BoardNetlistUpdater<'_> {
    /// Every pin of a placed component must have a pad on its footprint.
    /// Missing pads mean the footprint does not fit the symbol.
    pub(super) fn test_connectivity(&mut self, netlist: &Netlist, footprint_map: &[(usize, Kiid)]) {
        for &(index, id) in footprint_map {
            let Some(component) = netlist.components.get(index) else {
                continue;
            };
            // partial designs may leave a component without a footprint
            let Some(footprint) = self.board.footprint(id) else {
                continue;
            };

            let missing: Vec<String> = component
                .pins
                .iter()
                .filter(|pin| footprint.find_pad(&pin.pin).is_none())
                .map(|pin| {
                    format!(
                        "{} pad {} not found in {}.",
                        component.reference, pin.pin, footprint.fpid
                    )
                })
                .collect();

            for msg in missing {
                self.error(msg);
            }
        }
    }
}
