//! # LTLMON (LTL MONitor)
//!
//! LTLMON is a runtime monitor
//! checking recorded, finite traces against properties
//! expressed in Linear Temporal Logic (LTL).
//!
//! Properties are checked by formula progression,[^1]
//! so that each trace is read only once, one step at a time,
//! and its monitoring stops as soon as every property is settled.
//!
//! Properties are specified in a JSON file,
//! and traces are CSV files (optionally gzip-compressed)
//! with one column per variable and one row per step.
//!
//! [^1]: Bacchus, F., & Kabanza, F. (2000). *Using temporal logics to express search control knowledge for planning*. Artificial Intelligence, 116(1-2).

mod progress;
mod report;
mod trace;
mod verify;

use std::{path::PathBuf, sync::Arc};

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use log::info;
use ltlmon_core::Monitor;
use ltlmon_csv::{PropertiesData, TraceFile};
use progress::Bar;
use report::Report;
use trace::TraceArgs;
use verify::VerifyArgs;

/// LTLMON's available commands.
#[deny(missing_docs)]
#[derive(Subcommand)]
enum Commands {
    /// Validate the syntactical and semantical correctness of the properties, without running them.
    Validate,
    /// Verify properties over the given traces
    ///
    /// EXAMPLE: ltlmon PATH/TO/PROPERTIES verify -p PROPERTY PATH/TO/TRACES
    /// EXAMPLE: ltlmon PATH/TO/PROPERTIES verify -p PROPERTY -p ANOTHER_PROPERTY TRACE.csv TRACE.csv.gz
    /// EXAMPLE: ltlmon PATH/TO/PROPERTIES verify --all PATH/TO/TRACES
    #[clap(verbatim_doc_comment)]
    Verify {
        /// Args for trace verification.
        #[clap(flatten)]
        args: VerifyArgs,
        /// Print progress bars during verification.
        ///
        /// By default, when it starts the verification process, LTLMON only prints a terse message.
        /// For larger batches of traces, it might be nice to see in real-time how the verification is proceeding.
        /// This flag has LTLMON print progress bars and current statistics on the verification process.
        #[arg(long, value_enum)]
        progress: Option<Bar>,
        /// Print JSON-serialized final verification report.
        ///
        /// By default, LTLMON prints a user-friendly report at the end of verification.
        /// This flag has the report printed in JSON format instead.
        #[arg(long)]
        json: bool,
    },
    /// Monitor traces and save them, annotated with the state of the properties, to file in csv format.
    Trace(TraceArgs),
}

/// A runtime monitor for Linear Temporal Logic properties over recorded traces.
///
/// LTLMON (LTL MONitor) checks finite traces
/// against properties expressed in Linear Temporal Logic,
/// reading each trace one step at a time.
#[derive(Parser)]
#[deny(missing_docs)]
#[command(version, about, long_about)]
pub struct Cli {
    /// Path of the JSON properties file.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    properties: PathBuf,
    /// Verbose output
    #[command(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity,
    /// Actions to execute on the properties.
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let name = self
            .properties
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("properties"));

        match self.command {
            Commands::Verify {
                args,
                progress,
                json,
            } => {
                args.validate()?;
                eprint!("Processing properties...");
                let (monitor, data) =
                    ltlmon_csv::load(&self.properties, &args.properties, args.all)?;
                eprintln!(" done");
                let files = ltlmon_csv::trace_files(&args.traces)?;
                info!("found {} trace files", files.len());
                let traces = ltlmon_csv::open_traces(&files, &data);
                run_verification(name, args, progress, monitor, traces, data)?.print(json);
            }
            Commands::Validate => {
                eprint!("Processing properties, please wait...");
                let (monitor, data) = ltlmon_csv::load(&self.properties, &[], true)?;
                // At this point the properties have been validated
                eprintln!(" done");
                println!(
                    "properties '{name}' successfully validated: {} assumes, {} guarantees over {} variables",
                    monitor.oracle().assumes().len(),
                    data.guarantees.len(),
                    data.signature.len(),
                );
            }
            Commands::Trace(args) => {
                args.validate()?;
                eprint!("Processing properties, please wait...");
                let (monitor, data) =
                    ltlmon_csv::load(&self.properties, &args.properties, args.all)?;
                eprintln!(" done");
                let files = ltlmon_csv::trace_files(&args.traces)?;
                eprint!("Trace computation in progress...");
                args.trace(&monitor, &files, Arc::new(data))?;
                eprintln!(" done");
            }
        }
        Ok(())
    }
}

fn run_verification(
    name: String,
    args: VerifyArgs,
    progress: Option<Bar>,
    monitor: Monitor,
    traces: Vec<TraceFile>,
    data: PropertiesData,
) -> anyhow::Result<Report> {
    if let Some(bar) = progress {
        let monitor_clone = monitor.clone();
        let name_clone = name.clone();
        let guarantees = data.monitored.clone();
        let total = traces.len() as u64;
        let handle = std::thread::spawn(move || args.verify(name, &monitor, traces, &data));
        bar.print_progress_bar(total, guarantees, &monitor_clone, name_clone, || {
            handle.is_finished()
        });
        handle
            .join()
            .map_err(|_| anyhow!("verification thread panicked"))?
    } else {
        eprint!("Verification in progress...");
        let report = args.verify(name, &monitor, traces, &data)?;
        eprintln!(" done!");
        Ok(report)
    }
}

// From Clap tutorial <https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing>
#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
