use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, anyhow};
use clap::Parser;
use ltlmon_core::{Monitor, MonitorError};
use ltlmon_csv::{PropertiesData, TracePrinter};

use crate::verify::ALL_PROPS_ERR;

/// Monitor traces and save them, annotated with the state of the properties.
#[derive(Debug, Clone, Parser)]
#[deny(missing_docs)]
pub(crate) struct TraceArgs {
    /// Trace files to monitor, or directories containing them.
    #[arg(required = true, value_hint = clap::ValueHint::AnyPath)]
    pub(crate) traces: Vec<PathBuf>,
    /// Property to verify while tracing (can be repeated).
    #[arg(short, long = "property", value_name = "PROPERTY")]
    pub(crate) properties: Vec<String>,
    /// Verify all properties found in the properties file while tracing.
    /// It is equivalent to listing all of the properties.
    #[arg(short, long)]
    pub(crate) all: bool,
    /// Folder where annotated traces are saved.
    ///
    /// Traces are sorted into the sub-folders `success`, `failure` and `incomplete`
    /// according to the verification outcome.
    #[arg(short, long, default_value = "traces", value_hint = clap::ValueHint::DirPath)]
    pub(crate) output: PathBuf,
}

impl TraceArgs {
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        if !self.properties.is_empty() && self.all {
            Err(anyhow!(ALL_PROPS_ERR))
        } else {
            Ok(())
        }
    }

    pub(crate) fn trace(
        &self,
        monitor: &Monitor,
        files: &[PathBuf],
        data: Arc<PropertiesData>,
    ) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.output).with_context(|| {
            format!("failed to create output folder '{}'", self.output.display())
        })?;
        let printers = files
            .iter()
            .enumerate()
            .map(|(i, path)| TracePrinter::new(&self.output, &trace_name(i, path), data.clone()))
            .collect::<Vec<_>>();
        let traces = ltlmon_csv::open_traces(files, &data);
        if let Err(err) = monitor.traces(traces.into_iter().zip(printers)) {
            let MonitorError::Trace { index, .. } = &err;
            let path = files[*index].display().to_string();
            return Err(err).with_context(|| format!("tracing of '{path}' failed"));
        }
        Ok(())
    }
}

// Output name of the trace, unique within the batch.
fn trace_name(index: usize, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let stem = name
        .strip_suffix(".csv.gz")
        .or_else(|| name.strip_suffix(".csv"))
        .unwrap_or(&*name);
    format!("{index:04}_{stem}")
}
