use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use ltlmon_core::{Monitor, Trace};
use ltlmon_csv::{CsvTrace, PropertiesData, TracePrinter};
use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

fn load_all() -> (Monitor, PropertiesData) {
    ltlmon_csv::load(Path::new("./tests/properties.json"), &[], true).expect("load")
}

fn traces() -> Vec<PathBuf> {
    ltlmon_csv::trace_files(&[PathBuf::from("./tests/traces")]).expect("trace files")
}

// A fresh directory under the system's temporary folder.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ltlmon_csv_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn load_properties() {
    let (monitor, data) = load_all();
    assert_eq!(data.signature, ["req", "ack", "ready", "powered"]);
    assert_eq!(data.guarantees, ["response", "boot"]);
    assert_eq!(data.monitored, data.guarantees);
    assert_eq!(monitor.oracle().assumes().len(), 1);
    assert_eq!(monitor.oracle().guarantees().len(), 2);
}

#[test]
fn unknown_property() {
    let result = ltlmon_csv::load(
        Path::new("./tests/properties.json"),
        &[String::from("shutdown")],
        false,
    );
    assert!(result.is_err());
}

#[test]
fn missing_properties_file() {
    assert!(ltlmon_csv::load(Path::new("./tests/missing.json"), &[], true).is_err());
}

#[test]
fn directories_list_trace_files() {
    let files = traces();
    let names = files
        .iter()
        .map(|path| path.file_name().expect("file name").to_string_lossy())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            "00_ok.csv",
            "01_no_ack.csv",
            "02_early_req.csv",
            "03_unpowered.csv"
        ]
    );
}

#[test]
fn verify_traces() {
    let (monitor, data) = load_all();
    let files = traces();
    monitor
        .run(ltlmon_csv::open_traces(&files, &data))
        .expect("monitoring");
    assert_eq!(monitor.successes(), 1);
    assert_eq!(monitor.failures(), 2);
    assert_eq!(monitor.incomplete(), 1);
    assert_eq!(monitor.violations(), [1, 1]);

    monitor
        .par_run(ltlmon_csv::open_traces(&files, &data))
        .expect("monitoring");
    assert_eq!(monitor.successes(), 1);
    assert_eq!(monitor.failures(), 2);
    assert_eq!(monitor.violations(), [1, 1]);
}

#[test]
fn selected_property() {
    let (monitor, data) = ltlmon_csv::load(
        Path::new("./tests/properties.json"),
        &[String::from("boot")],
        false,
    )
    .expect("load");
    monitor
        .run(ltlmon_csv::open_traces(&traces(), &data))
        .expect("monitoring");
    assert_eq!(monitor.successes(), 2);
    assert_eq!(monitor.failures(), 1);
    assert_eq!(monitor.violations(), [1]);
}

#[test]
fn missing_trace_file() {
    let (monitor, data) = load_all();
    let files = vec![
        PathBuf::from("./tests/traces/00_ok.csv"),
        PathBuf::from("./tests/traces/missing.csv"),
    ];
    let result = monitor.run(ltlmon_csv::open_traces(&files, &data));
    let Err(ltlmon_core::MonitorError::Trace { index, .. }) = result else {
        panic!("missing file should fail");
    };
    assert_eq!(index, 1);
}

#[test]
fn compressed_trace() {
    let dir = temp_dir("compressed");
    let path = dir.join("trace.csv.gz");
    let file = std::fs::File::create(&path).expect("create");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(b"a,b\ntrue,\n0,1\n")
        .expect("write");
    encoder.finish().expect("finish");

    let signature = [String::from("b"), String::from("a")];
    let mut trace = CsvTrace::open(&path, &signature).expect("open");
    let mut state = Vec::new();
    assert!(trace.next_state(&mut state).expect("read"));
    assert_eq!(state, [None, Some(true)]);
    assert!(trace.next_state(&mut state).expect("read"));
    assert_eq!(state, [Some(true), Some(false)]);
    assert!(!trace.next_state(&mut state).expect("read"));
    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn print_traces() {
    let dir = temp_dir("print");
    let (monitor, data) = load_all();
    let data = Arc::new(data);
    let files = traces();
    let traces = ltlmon_csv::open_traces(&files, &data);
    let printers = files.iter().map(|path| {
        let name = path.file_stem().expect("file stem").to_string_lossy();
        TracePrinter::new(&dir, &name, data.clone())
    });
    monitor.traces(traces.into_iter().zip(printers)).expect("tracing");
    assert_eq!(monitor.runs(), 4);

    assert!(dir.join("success/00_ok.csv.gz").is_file());
    assert!(dir.join("failure/01_no_ack.csv.gz").is_file());
    assert!(dir.join("failure/02_early_req.csv.gz").is_file());
    assert!(dir.join("incomplete/03_unpowered.csv.gz").is_file());

    let file = std::fs::File::open(dir.join("failure/02_early_req.csv.gz")).expect("open");
    let mut content = String::new();
    GzDecoder::new(file)
        .read_to_string(&mut content)
        .expect("decompress");
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("step,req,ack,ready,powered,response,boot")
    );
    assert_eq!(
        lines.next(),
        Some(
            "0,true,false,false,true,\"And(Eventually(Var(\"\"ack\"\")), Always(Or(Not(Var(\"\"req\"\")), Next(Eventually(Var(\"\"ack\"\"))))))\",false"
        )
    );
    assert_eq!(lines.next(), Some("1,false,true,true,true,true,false"));
    assert_eq!(lines.next(), None);
    std::fs::remove_dir_all(&dir).expect("cleanup");
}
