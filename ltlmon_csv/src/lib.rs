//! Loader for LTLMON's JSON properties files and CSV traces.

mod builder;
mod parser;
mod reader;
mod tracer;

use anyhow::Context;
pub use builder::PropertiesData;
use builder::build;
use log::info;
use ltlmon_core::Monitor;
use parser::Properties;
pub use reader::{CsvTrace, TraceError, TraceFile};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};
pub use tracer::TracePrinter;

/// Loads the properties file at `path` and builds a [`Monitor`] for them.
///
/// The monitor checks the guarantees named in `properties`,
/// or all of them if `all_properties` is set.
pub fn load(
    path: &Path,
    properties: &[String],
    all_properties: bool,
) -> anyhow::Result<(Monitor, PropertiesData)> {
    let time = std::time::Instant::now();
    info!(target: "parser", "parsing properties file '{}'", path.display());
    let mut file =
        File::open(path).with_context(|| format!("failed to open file '{}'", path.display()))?;
    let size = file.metadata().map(|data| data.len()).unwrap_or_default();
    let mut buf = String::new();
    // Reserve enough bytes in buf to avoid reallocation.
    buf.reserve(size as usize);
    file.read_to_string(&mut buf)
        .with_context(|| format!("failed to read file '{}' to string", path.display()))?;
    let properties_file: Properties = serde_json::from_str(&buf)
        .with_context(|| format!("failed to parse properties in '{}'", path.display()))?;
    info!("parsing complete in {:?}", time.elapsed());

    let time = std::time::Instant::now();
    info!(target: "build", "building properties");
    let (oracle, data) = build(properties_file, properties, all_properties)?;
    info!("building properties completed in {:?}", time.elapsed());
    Ok((Monitor::new(oracle), data))
}

fn is_trace_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    name.ends_with(".csv") || name.ends_with(".csv.gz")
}

/// Collects the trace files at the given paths.
///
/// Directories are replaced by the `.csv` and `.csv.gz` files they contain, in lexicographic order.
pub fn trace_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = std::fs::read_dir(path)
                .with_context(|| format!("failed to read directory '{}'", path.display()))?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("failed to read directory '{}'", path.display()))?;
            entries.retain(|path| path.is_file() && is_trace_file(path));
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Prepares the given trace files to be read with the signature of the properties.
///
/// Files are opened lazily, when the monitor starts reading them.
pub fn open_traces(files: &[PathBuf], data: &PropertiesData) -> Vec<TraceFile> {
    let signature = Arc::<[String]>::from(data.signature.as_slice());
    files
        .iter()
        .map(|path| TraceFile::new(path.clone(), signature.clone()))
        .collect()
}
