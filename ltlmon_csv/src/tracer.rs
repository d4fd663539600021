use crate::PropertiesData;
use flate2::{Compression, write::GzEncoder};
use log::{error, info};
use ltlmon_core::{LtlOracle, Progression, RunOutcome, Step, Tracer};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

const SUCCESS: &str = "success";
const FAILURE: &str = "failure";
const INCOMPLETE: &str = "incomplete";

/// A [`Tracer`] that prints the monitored trace to a gzip-compressed CSV file.
///
/// Each row holds the step, the observed state and the current verdict or residual
/// of every monitored guarantee.
/// Once the run is over, the file is moved into the `success`, `failure` or `incomplete`
/// sub-folder of the output folder, according to the outcome.
pub struct TracePrinter {
    dir: PathBuf,
    file_name: String,
    data: Arc<PropertiesData>,
    writer: Option<csv::Writer<GzEncoder<File>>>,
}

impl TracePrinter {
    /// Creates a new [`TracePrinter`] writing the trace named `name` into the folder `dir`.
    pub fn new(dir: &Path, name: &str, data: Arc<PropertiesData>) -> Self {
        Self {
            dir: dir.to_owned(),
            file_name: format!("{name}.csv.gz"),
            data,
            writer: None,
        }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

impl Tracer for TracePrinter {
    fn init(&mut self) {
        let path = self.path();
        let file = match File::create(&path) {
            Ok(file) => file,
            Err(err) => {
                error!("failed to create trace file '{}': {err}", path.display());
                return;
            }
        };
        let mut writer = csv::Writer::from_writer(GzEncoder::new(file, Compression::default()));
        let header = std::iter::once("step")
            .chain(self.data.signature.iter().map(String::as_str))
            .chain(self.data.monitored.iter().map(String::as_str));
        match writer.write_record(header) {
            Ok(()) => self.writer = Some(writer),
            Err(err) => error!("failed to write trace file '{}': {err}", path.display()),
        }
    }

    fn trace(&mut self, step: Step, state: &[Option<bool>], oracle: &LtlOracle) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let signature = &self.data.signature;
        let record = std::iter::once(step.to_string())
            .chain(state.iter().map(|value| match value {
                Some(true) => String::from("true"),
                Some(false) => String::from("false"),
                None => String::new(),
            }))
            .chain(oracle.guarantees().iter().map(|property| match property {
                Progression::Verdict(b) => b.to_string(),
                Progression::Residual(ltl) => ltl
                    .map_vars(&mut |index: &usize| signature[*index].as_str())
                    .to_string(),
            }));
        if let Err(err) = writer.write_record(record) {
            error!("failed to write trace file '{}': {err}", self.path().display());
            self.writer = None;
        }
    }

    fn finalize(mut self, outcome: &RunOutcome) {
        let path = self.path();
        let Some(writer) = self.writer.take() else {
            return;
        };
        if let Err(err) = writer
            .into_inner()
            .map_err(|err| err.into_error())
            .and_then(|encoder| encoder.finish())
        {
            error!("failed to close trace file '{}': {err}", path.display());
            return;
        }

        let class = match outcome {
            RunOutcome::Verified(guarantees) if guarantees.iter().all(|b| *b) => SUCCESS,
            RunOutcome::Verified(_) => FAILURE,
            RunOutcome::Incomplete => INCOMPLETE,
        };
        let dir = self.dir.join(class);
        if let Err(err) = std::fs::create_dir_all(&dir)
            .and_then(|()| std::fs::rename(&path, dir.join(&self.file_name)))
        {
            error!("failed to move trace file '{}': {err}", path.display());
        } else {
            info!("trace '{}' classified as {class}", self.file_name);
        }
    }
}
