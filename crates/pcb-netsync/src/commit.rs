//! Change log for one update pass.
//!
//! Edits are applied to the board as they happen; the commit records what
//! each edit replaced so the whole pass can be reverted. Modified and removed
//! items carry a deep copy of their state before the first change in the
//! pass, taken once per item.

use log::debug;
use serde::Serialize;

use crate::board::{Board, Footprint, Kiid, Track, Via, Zone};
use crate::net::{NetCode, NetInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
}

/// One recorded mutation together with its undo data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    AddFootprint(Kiid),
    ModifyFootprint(Box<Footprint>),
    RemoveFootprint { index: usize, footprint: Box<Footprint> },
    AddNet(NetCode),
    RemoveNet(NetInfo),
    ModifyZone(Zone),
    ModifyVia(Via),
    ModifyTrack(Track),
}

impl Change {
    fn item(&self) -> Option<Kiid> {
        match self {
            Change::AddFootprint(id) => Some(*id),
            Change::ModifyFootprint(fp) | Change::RemoveFootprint { footprint: fp, .. } => {
                Some(fp.id)
            }
            Change::ModifyZone(zone) => Some(zone.id),
            Change::ModifyVia(via) => Some(via.id),
            Change::ModifyTrack(track) => Some(track.id),
            Change::AddNet(_) | Change::RemoveNet(_) => None,
        }
    }

    fn net(&self) -> Option<NetCode> {
        match self {
            Change::AddNet(code) => Some(*code),
            Change::RemoveNet(net) => Some(net.code),
            _ => None,
        }
    }

    fn status(&self) -> ChangeStatus {
        match self {
            Change::AddFootprint(_) | Change::AddNet(_) => ChangeStatus::Added,
            Change::ModifyFootprint(_)
            | Change::ModifyZone(_)
            | Change::ModifyVia(_)
            | Change::ModifyTrack(_) => ChangeStatus::Modified,
            Change::RemoveFootprint { .. } | Change::RemoveNet(_) => ChangeStatus::Removed,
        }
    }

    fn undo(self, board: &mut Board) {
        match self {
            Change::AddFootprint(id) => board.footprints.retain(|fp| fp.id != id),
            Change::ModifyFootprint(snapshot) => {
                if let Some(fp) = board.footprint_mut(snapshot.id) {
                    *fp = *snapshot;
                }
            }
            Change::RemoveFootprint { index, footprint } => {
                let index = index.min(board.footprints.len());
                board.footprints.insert(index, *footprint);
            }
            Change::AddNet(code) => {
                board.nets.remove(code);
            }
            Change::RemoveNet(net) => board.nets.restore(net),
            Change::ModifyZone(snapshot) => {
                if let Some(zone) = board.zone_mut(snapshot.id) {
                    *zone = snapshot;
                }
            }
            Change::ModifyVia(snapshot) => {
                if let Some(via) = board.via_mut(snapshot.id) {
                    *via = snapshot;
                }
            }
            Change::ModifyTrack(snapshot) => {
                if let Some(track) = board.tracks.iter_mut().find(|t| t.id == snapshot.id) {
                    *track = snapshot;
                }
            }
        }
    }
}

/// Pending changes of the current pass.
#[derive(Debug, Default, Clone)]
pub struct Commit {
    changes: Vec<Change>,
}

impl Commit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Status of the first entry recorded for an item, if any.
    pub fn status(&self, id: Kiid) -> Option<ChangeStatus> {
        self.changes
            .iter()
            .find(|c| c.item() == Some(id))
            .map(Change::status)
    }

    pub fn net_status(&self, code: NetCode) -> Option<ChangeStatus> {
        self.changes
            .iter()
            .find(|c| c.net() == Some(code))
            .map(Change::status)
    }

    pub fn add_footprint(&mut self, id: Kiid) {
        self.changes.push(Change::AddFootprint(id));
    }

    /// Record the pre-change state of a footprint. Ignored when the footprint
    /// already has an entry in this commit. Returns whether it was recorded.
    pub fn modify_footprint(&mut self, snapshot: Footprint) -> bool {
        if self.status(snapshot.id).is_some() {
            return false;
        }
        self.changes.push(Change::ModifyFootprint(Box::new(snapshot)));
        true
    }

    /// Remove the footprint from the board and keep it for undo.
    pub fn remove_footprint(&mut self, board: &mut Board, id: Kiid) -> Option<Footprint> {
        let index = board.footprint_index(id)?;
        let footprint = board.footprints.remove(index);
        self.changes.push(Change::RemoveFootprint {
            index,
            footprint: Box::new(footprint.clone()),
        });
        Some(footprint)
    }

    pub fn add_net(&mut self, code: NetCode) {
        self.changes.push(Change::AddNet(code));
    }

    pub fn remove_net(&mut self, board: &mut Board, code: NetCode) -> Option<NetInfo> {
        let net = board.nets.remove(code)?;
        self.changes.push(Change::RemoveNet(net.clone()));
        Some(net)
    }

    pub fn modify_zone(&mut self, snapshot: Zone) -> bool {
        if self.status(snapshot.id).is_some() {
            return false;
        }
        self.changes.push(Change::ModifyZone(snapshot));
        true
    }

    pub fn modify_via(&mut self, snapshot: Via) -> bool {
        if self.status(snapshot.id).is_some() {
            return false;
        }
        self.changes.push(Change::ModifyVia(snapshot));
        true
    }

    pub fn modify_track(&mut self, snapshot: Track) -> bool {
        if self.status(snapshot.id).is_some() {
            return false;
        }
        self.changes.push(Change::ModifyTrack(snapshot));
        true
    }

    /// Finalize the pending changes into an undo record.
    pub fn push(&mut self, description: &str) -> ChangeRecord {
        debug!("Committing {} changes: {}", self.changes.len(), description);
        ChangeRecord {
            description: description.to_string(),
            changes: std::mem::take(&mut self.changes),
        }
    }

    /// Undo every pending change, newest first.
    pub fn revert(&mut self, board: &mut Board) {
        for change in std::mem::take(&mut self.changes).into_iter().rev() {
            change.undo(board);
        }
    }
}

/// A committed set of changes, kept as undo data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeRecord {
    pub description: String,
    pub changes: Vec<Change>,
}

impl ChangeRecord {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Restore the board to its state before the record was made.
    pub fn revert(self, board: &mut Board) {
        for change in self.changes.into_iter().rev() {
            change.undo(board);
        }
    }
}
