use std::{collections::BTreeMap, path::PathBuf, time::Instant};

use anyhow::{Context, anyhow};
use clap::Parser;
use ltlmon_core::{Monitor, MonitorError};
use ltlmon_csv::{PropertiesData, TraceFile};

use crate::report::Report;

pub(crate) const ALL_PROPS_ERR: &str =
    "the --all flag is incompatible with individually-specified properties.\n
Examples:
'ltlmon PATH/TO/PROPERTIES verify TRACES' checks only the assumes over the traces
'ltlmon PATH/TO/PROPERTIES verify -p PROPERTY_1 -p PROPERTY_2 TRACES' checks the properties PROPERTY_1 and PROPERTY_2 together over the traces
'ltlmon PATH/TO/PROPERTIES verify --all TRACES' checks all specified properties together over the traces";

/// Verify the traces
#[derive(Debug, Clone, Parser)]
#[deny(missing_docs)]
pub(crate) struct VerifyArgs {
    /// Trace files to verify, or directories containing them.
    ///
    /// Directories are searched (non-recursively) for .csv and .csv.gz files.
    #[arg(required = true, value_hint = clap::ValueHint::AnyPath)]
    pub(crate) traces: Vec<PathBuf>,
    /// Property to verify (can be repeated).
    #[arg(short, long = "property", value_name = "PROPERTY")]
    pub(crate) properties: Vec<String>,
    /// Verify all properties found in the properties file.
    /// It is equivalent to listing all of the properties.
    #[arg(short, long)]
    pub(crate) all: bool,
    /// Run the verification on a single thread.
    ///
    /// By default, LTLMON monitors multiple traces in parallel.
    #[arg(long, default_value_t = false)]
    pub(crate) single_thread: bool,
}

impl VerifyArgs {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if !self.properties.is_empty() && self.all {
            Err(anyhow!(ALL_PROPS_ERR))
        } else {
            Ok(())
        }
    }

    pub(crate) fn verify(
        &self,
        name: String,
        monitor: &Monitor,
        traces: Vec<TraceFile>,
        data: &PropertiesData,
    ) -> anyhow::Result<Report> {
        let paths = traces
            .iter()
            .map(|trace| trace.path().to_owned())
            .collect::<Vec<_>>();
        let time = Instant::now();
        let result = if self.single_thread {
            monitor.run(traces)
        } else {
            monitor.par_run(traces)
        };
        let duration = time.elapsed();
        if let Err(err) = result {
            let MonitorError::Trace { index, .. } = &err;
            let path = paths[*index].display().to_string();
            return Err(err).with_context(|| format!("verification of trace '{path}' failed"));
        }

        let successes = monitor.successes();
        let failures = monitor.failures();
        let incomplete = monitor.incomplete();
        let property_failures = data
            .monitored
            .iter()
            .cloned()
            .zip(monitor.violations().into_iter().chain(std::iter::repeat(0)))
            .collect::<BTreeMap<String, u32>>();
        Ok(Report::new(
            name,
            paths.len(),
            duration,
            successes,
            failures,
            incomplete,
            property_failures,
        ))
    }
}
