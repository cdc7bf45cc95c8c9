use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use pcb_netsync::{
    Board, BoardNetlistUpdater, JsonFootprintLibrary, Netlist, Reporter, Severity, UpdateOptions,
    UpdateSummary,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::instrument;

#[derive(Args, Debug, Default, Clone)]
#[command(about = "Update a board from a netlist")]
pub struct UpdateArgs {
    /// Board JSON file to update
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub board: PathBuf,

    /// Netlist JSON file
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub netlist: PathBuf,

    /// Footprint library root (one directory per library)
    #[arg(long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub library: PathBuf,

    /// Updater options in TOML. Flags below override it.
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Report what would change without writing the board
    #[arg(long)]
    pub dry_run: bool,

    /// Remove footprints that no longer have a component
    #[arg(long)]
    pub delete_unused: bool,

    /// Keep nets that end up on a single pad
    #[arg(long)]
    pub keep_single_pad_nets: bool,

    /// Do not exchange footprints whose library id changed
    #[arg(long)]
    pub no_replace: bool,

    /// Match footprints by symbol path instead of reference designator
    #[arg(long)]
    pub by_path: bool,

    /// Warn about pads the netlist leaves without a net
    #[arg(long)]
    pub warn_no_net_pads: bool,

    /// Write the updated board here instead of overwriting --board
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl UpdateArgs {
    fn options(&self) -> Result<UpdateOptions> {
        let mut options = match &self.config {
            Some(path) => UpdateOptions::from_toml_file(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => UpdateOptions::default(),
        };
        options.dry_run |= self.dry_run;
        options.delete_unused_footprints |= self.delete_unused;
        options.lookup_by_path |= self.by_path;
        options.warn_for_no_net_pads |= self.warn_no_net_pads;
        if self.keep_single_pad_nets {
            options.delete_single_pad_nets = false;
        }
        if self.no_replace {
            options.replace_footprints = false;
        }
        Ok(options)
    }
}

/// Prints report lines as they come, tagged by severity.
struct ConsoleReporter {
    quiet: bool,
    lines: Vec<ReportEntry>,
}

#[derive(Serialize)]
struct ReportEntry {
    severity: Severity,
    message: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: UpdateSummary,
    lines: &'a [ReportEntry],
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, msg: &str, severity: Severity) {
        if !self.quiet {
            let tag = match severity {
                Severity::Info => "info".dimmed(),
                Severity::Action => "action".green(),
                Severity::Warning => "warning".yellow(),
                Severity::Error => "error".red().bold(),
            };
            println!("{tag}: {msg}");
        }
        self.lines.push(ReportEntry {
            severity,
            message: msg.to_string(),
        });
    }

    fn report_tail(&mut self, msg: &str, severity: Severity) {
        if !self.quiet {
            println!("{}", msg.bold());
        }
        self.lines.push(ReportEntry {
            severity,
            message: msg.to_string(),
        });
    }
}

#[instrument(name = "pcb_update", skip_all)]
pub fn execute(args: UpdateArgs) -> Result<()> {
    let options = args.options()?;

    let mut board = Board::from_json_file(&args.board)?;
    let netlist = Netlist::from_json_file(&args.netlist)?;
    if !args.library.is_dir() {
        bail!("Footprint library {} is not a directory", args.library.display());
    }
    let library = JsonFootprintLibrary::new(&args.library);

    let mut reporter = ConsoleReporter {
        quiet: args.json,
        lines: Vec::new(),
    };
    let summary = BoardNetlistUpdater::new(&mut board, &library, &mut reporter)
        .with_options(options)
        .update_netlist(&netlist);

    if args.json {
        let report = JsonReport {
            summary,
            lines: &reporter.lines,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !options.dry_run {
        let output = args.output.as_ref().unwrap_or(&args.board);
        board.write_json_file(output)?;
        log::info!("Wrote updated board to {}", output.display());
    }

    if summary.errors > 0 {
        bail!(
            "Update finished with {} error{}",
            summary.errors,
            if summary.errors == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
