use flate2::read::GzDecoder;
use log::{debug, warn};
use ltlmon_core::{Step, Trace};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// Errors that occur while reading a CSV trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be opened.
    #[error("failed to open trace file '{}'", path.display())]
    Open {
        /// Path of the trace file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The content of the trace is not valid CSV.
    #[error("malformed CSV trace")]
    Csv(#[from] csv::Error),
    /// A cell does not hold a truth value.
    #[error("invalid value '{value}' for variable '{var}' at step {step}")]
    InvalidValue {
        /// Step of the trace holding the value.
        step: Step,
        /// Name of the column holding the value.
        var: String,
        /// The offending cell.
        value: String,
    },
}

/// A [`Trace`] read from a CSV file, one row per step.
///
/// The header names the variables of the columns.
/// Columns are mapped onto the signature of the properties:
/// columns of variables outside the signature are ignored,
/// and variables of the signature without a column stay unobserved.
pub struct CsvTrace {
    reader: csv::Reader<Box<dyn Read + Send>>,
    header: csv::StringRecord,
    // Index in the signature of every column, if any.
    columns: Vec<Option<usize>>,
    width: usize,
    record: csv::StringRecord,
    step: Step,
}

impl CsvTrace {
    /// Opens the trace at the given path.
    ///
    /// Files with `.gz` extension are decompressed on the fly.
    pub fn open(path: &Path, signature: &[String]) -> Result<Self, TraceError> {
        let file = File::open(path).map_err(|source| TraceError::Open {
            path: path.to_owned(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext == "gz") {
            debug!("decompressing trace '{}'", path.display());
            Self::from_reader(GzDecoder::new(file), signature)
        } else {
            Self::from_reader(file, signature)
        }
    }

    /// Reads a trace from any source of CSV data.
    pub fn from_reader<R>(reader: R, signature: &[String]) -> Result<Self, TraceError>
    where
        R: Read + Send + 'static,
    {
        let reader: Box<dyn Read + Send> = Box::new(reader);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let header = reader.headers()?.clone();
        let columns = header
            .iter()
            .map(|name| {
                let index = signature.iter().position(|var| var == name);
                if index.is_none() {
                    debug!("column '{name}' not used by any property");
                }
                index
            })
            .collect::<Vec<_>>();
        signature
            .iter()
            .filter(|var| !header.iter().any(|name| name == var.as_str()))
            .for_each(|var| warn!("variable '{var}' not in trace, it will be unobserved"));
        Ok(Self {
            reader,
            header,
            columns,
            width: signature.len(),
            record: csv::StringRecord::new(),
            step: 0,
        })
    }
}

fn parse_value(value: &str) -> Option<Option<bool>> {
    if value.is_empty() {
        Some(None)
    } else if value == "1" || value.eq_ignore_ascii_case("true") {
        Some(Some(true))
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Some(Some(false))
    } else {
        None
    }
}

impl Trace for CsvTrace {
    type Error = TraceError;

    fn next_state(&mut self, state: &mut Vec<Option<bool>>) -> Result<bool, Self::Error> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(false);
        }
        state.clear();
        state.resize(self.width, None);
        for ((value, column), var) in self
            .record
            .iter()
            .zip(self.columns.iter())
            .zip(self.header.iter())
        {
            if let Some(index) = *column {
                state[index] = parse_value(value).ok_or_else(|| TraceError::InvalidValue {
                    step: self.step,
                    var: var.to_owned(),
                    value: value.to_owned(),
                })?;
            }
        }
        self.step += 1;
        Ok(true)
    }
}

/// A [`CsvTrace`] which is opened only when its first state is requested,
/// so that large batches of traces do not keep all their files open.
pub struct TraceFile {
    path: PathBuf,
    signature: Arc<[String]>,
    trace: Option<CsvTrace>,
}

impl TraceFile {
    /// Creates a [`TraceFile`] for the trace at the given path.
    pub fn new(path: PathBuf, signature: Arc<[String]>) -> Self {
        Self {
            path,
            signature,
            trace: None,
        }
    }

    /// Path of the trace file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Trace for TraceFile {
    type Error = TraceError;

    fn next_state(&mut self, state: &mut Vec<Option<bool>>) -> Result<bool, Self::Error> {
        let mut trace = match self.trace.take() {
            Some(trace) => trace,
            None => CsvTrace::open(&self.path, &self.signature)?,
        };
        let result = trace.next_state(state);
        self.trace = Some(trace);
        result
    }
}
