//! Netlist to board synchronization.
//!
//! Given a board and a freshly exported netlist, [`BoardNetlistUpdater`]
//! infers which footprints to add, replace or remove and which pads, zones
//! and vias to reconnect, while keeping placement, net identity and locked
//! items intact. A pass can run as a dry run that only reports, or commit
//! its changes and hand back a [`ChangeRecord`] that reverts them.
//!
//! ```no_run
//! use pcb_netsync::{
//!     Board, BoardNetlistUpdater, JsonFootprintLibrary, LogReporter, Netlist, UpdateOptions,
//! };
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut board = Board::from_json_file(Path::new("board.json"))?;
//! let netlist = Netlist::from_json_file(Path::new("netlist.json"))?;
//! let library = JsonFootprintLibrary::new("footprints");
//! let mut reporter = LogReporter;
//!
//! let summary = BoardNetlistUpdater::new(&mut board, &library, &mut reporter)
//!     .with_options(UpdateOptions::default())
//!     .update_netlist(&netlist);
//! println!("{} errors", summary.errors);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod commit;
pub mod connectivity;
pub mod geometry;
pub mod layer;
pub mod library;
pub mod net;
pub mod netlist;
pub mod options;
pub mod reporter;
pub mod updater;

pub use board::{Board, Footprint, FootprintAttributes, Kiid, Pad, PadRef, Track, Via, Zone};
pub use commit::{Change, ChangeRecord, ChangeStatus, Commit};
pub use connectivity::{Connectivity, ItemRef};
pub use library::{FootprintLibrary, FootprintLoader, JsonFootprintLibrary, LibId, LibraryError};
pub use net::{NetCode, NetInfo, NetRegistry};
pub use netlist::{Component, ComponentNet, Netlist};
pub use options::{OptionsError, UpdateOptions};
pub use reporter::{LogReporter, NullReporter, ReportLine, ReportLog, Reporter, Severity};
pub use updater::{BoardNetlistUpdater, FootprintMatch, UpdateSummary, match_component};
