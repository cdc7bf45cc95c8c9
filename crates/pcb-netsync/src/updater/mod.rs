//! Netlist to board reconciliation.
//!
//! [`BoardNetlistUpdater`] walks a [`Netlist`] and brings a [`Board`] in line
//! with it: matching components to footprints, adding and optionally
//! replacing or removing footprints, rebinding pad nets and repairing zones
//! and vias left on dead nets.
//!
//! Net liveness is tracked as mark and sweep: every net except the sentinel
//! starts stale, binding a pad marks its net current, and whatever is still
//! stale at the end is removed.
//!
//! In dry-run mode the board is never touched. Pad net names and pin
//! functions the pass would have written are kept in side tables keyed by
//! [`PadRef`], and every later read goes through them.

mod footprints;
mod matcher;
mod pads;
mod prune;
mod validate;
mod zones;

pub use matcher::{FootprintMatch, match_component};

use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::instrument;

use crate::board::{Board, Kiid, PadRef};
use crate::commit::{ChangeRecord, Commit};
use crate::connectivity::Connectivity;
use crate::geometry::Point;
use crate::library::FootprintLoader;
use crate::netlist::Netlist;
use crate::options::UpdateOptions;
use crate::reporter::{Reporter, Severity};

/// Counters of one update pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub warnings: usize,
    pub errors: usize,
    pub new_footprints: usize,
}

pub struct BoardNetlistUpdater<'a> {
    board: &'a mut Board,
    library: &'a dyn FootprintLoader,
    reporter: &'a mut dyn Reporter,
    options: UpdateOptions,

    summary: UpdateSummary,
    commit: Commit,
    record: Option<ChangeRecord>,

    /// Dry-run shadows of pad state.
    pad_nets: HashMap<PadRef, String>,
    pad_pin_functions: HashMap<PadRef, String>,

    /// Nets created during the pass. In dry-run these never reach the board.
    added_nets: BTreeSet<String>,
    old_to_new_nets: BTreeMap<String, String>,

    /// Pads connected to each zone and via before any change.
    item_pads: HashMap<Kiid, Vec<zones::PadKey>>,
    insertion_point: Option<Point>,
    connectivity: Option<Connectivity>,
}

impl<'a> BoardNetlistUpdater<'a> {
    pub fn new(
        board: &'a mut Board,
        library: &'a dyn FootprintLoader,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self {
            board,
            library,
            reporter,
            options: UpdateOptions::default(),
            summary: UpdateSummary::default(),
            commit: Commit::new(),
            record: None,
            pad_nets: HashMap::new(),
            pad_pin_functions: HashMap::new(),
            added_nets: BTreeSet::new(),
            old_to_new_nets: BTreeMap::new(),
            item_pads: HashMap::new(),
            insertion_point: None,
            connectivity: None,
        }
    }

    pub fn with_options(mut self, options: UpdateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &UpdateOptions {
        &self.options
    }

    pub fn summary(&self) -> UpdateSummary {
        self.summary
    }

    /// Old net name to new net name, recorded whenever a pad was reconnected.
    pub fn old_to_new_nets(&self) -> &BTreeMap<String, String> {
        &self.old_to_new_nets
    }

    /// Undo data of the last committed pass. `None` after a dry run.
    pub fn change_record(&self) -> Option<&ChangeRecord> {
        self.record.as_ref()
    }

    pub fn take_change_record(&mut self) -> Option<ChangeRecord> {
        self.record.take()
    }

    /// Connectivity rebuilt after the last committed pass.
    pub fn connectivity(&self) -> Option<&Connectivity> {
        self.connectivity.as_ref()
    }

    fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn reset(&mut self) {
        self.summary = UpdateSummary::default();
        self.commit = Commit::new();
        self.record = None;
        self.pad_nets.clear();
        self.pad_pin_functions.clear();
        self.added_nets.clear();
        self.old_to_new_nets.clear();
        self.item_pads.clear();
        self.insertion_point = None;
        self.connectivity = None;
    }

    fn report(&mut self, severity: Severity, msg: String) {
        self.reporter.report(&msg, severity);
    }

    fn action(&mut self, msg: String) {
        self.report(Severity::Action, msg);
    }

    fn warning(&mut self, msg: String) {
        self.summary.warnings += 1;
        self.report(Severity::Warning, msg);
    }

    fn error(&mut self, msg: String) {
        self.summary.errors += 1;
        self.report(Severity::Error, msg);
    }

    /// Net name of a pad as this pass sees it.
    fn pad_net_name(&self, pad: PadRef) -> String {
        if self.dry_run() {
            if let Some(name) = self.pad_nets.get(&pad) {
                return name.clone();
            }
        }
        self.board
            .pad(pad)
            .map(|p| self.board.net_name(p.net).to_string())
            .unwrap_or_default()
    }

    /// Pin function of a pad as this pass sees it.
    pub fn pad_pin_function(&self, pad: PadRef) -> String {
        if self.dry_run() {
            if let Some(function) = self.pad_pin_functions.get(&pad) {
                return function.clone();
            }
        }
        self.board
            .pad(pad)
            .map(|p| p.pin_function.clone())
            .unwrap_or_default()
    }

    /// Record the state of a footprint before its first change in this pass.
    fn snapshot_footprint(&mut self, id: Kiid) {
        if self.commit.status(id).is_some() {
            return;
        }
        if let Some(fp) = self.board.footprint(id) {
            self.commit.modify_footprint(fp.clone());
        }
    }

    /// Synchronize the board with `netlist`. Never aborts: problems are
    /// reported and counted in the returned summary.
    #[instrument(name = "update_netlist", skip_all)]
    pub fn update_netlist(&mut self, netlist: &Netlist) -> UpdateSummary {
        self.reset();

        let boundary = self.board.footprints.len();
        self.cache_copper_connections();

        if !self.dry_run() {
            self.board.nets.mark_all_stale();
        }

        let pad_counts = self.expected_pad_counts(netlist, boundary);

        let mut footprint_map: Vec<(usize, Kiid)> = Vec::new();

        for (index, component) in netlist.components.iter().enumerate() {
            if component.exclude_from_board() {
                continue;
            }

            self.report(
                Severity::Info,
                format!(
                    "Processing symbol '{}:{}'.",
                    component.reference, component.fpid
                ),
            );

            let found = match_component(
                &self.board.footprints,
                boundary,
                component,
                self.options.lookup_by_path,
            );

            let target = match found.index() {
                Some(i) => {
                    let footprint = &self.board.footprints[i];
                    let id = footprint.id;
                    if self.options.replace_footprints && footprint.fpid != component.fpid {
                        self.replace_footprint(id, component)
                    } else {
                        Some(id)
                    }
                }
                None => self.add_new_footprint(component),
            };

            if let Some(id) = target {
                footprint_map.push((index, id));
                self.update_footprint_parameters(id, component);
                self.update_component_pad_connections(id, component, &pad_counts);
            }

            if let FootprintMatch::Ambiguous { count, .. } = found {
                debug!("{} footprints match {}", count, component.reference);
                self.error(format!(
                    "Multiple footprints found for \"{}\".",
                    component.reference
                ));
            }
        }

        self.update_copper_zone_nets(netlist);
        self.sweep_unused_footprints(netlist);

        if !self.dry_run() {
            self.connectivity = Some(self.board.build_connectivity());
            self.test_connectivity(netlist, &footprint_map);

            if self.options.delete_single_pad_nets {
                self.delete_single_pad_nets();
            }

            self.prune_stale_nets();
            self.record = Some(self.commit.push("Update netlist"));
        } else {
            // New footprints only exist in the report, so the pad list is
            // incomplete and single-pad detection would be wrong.
            if self.options.delete_single_pad_nets && self.summary.new_footprints == 0 {
                self.delete_single_pad_nets();
            }
            self.added_nets.clear();
        }

        let tail = format!(
            "Total warnings: {}, errors: {}.",
            self.summary.warnings, self.summary.errors
        );
        self.reporter.report_tail(&tail, Severity::Info);

        info!(
            "Netlist update{}: {} new footprints, {} warnings, {} errors",
            if self.dry_run() { " (dry run)" } else { "" },
            self.summary.new_footprints,
            self.summary.warnings,
            self.summary.errors
        );
        self.summary
    }
}
