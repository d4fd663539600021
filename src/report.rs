use serde::Serialize;
use std::{collections::BTreeMap, fmt::Display, time::Duration};

#[derive(Serialize)]
pub(crate) struct Report {
    pub(crate) properties: String,
    pub(crate) traces: usize,
    pub(crate) duration: Duration,
    pub(crate) rate: f64,
    pub(crate) runs: u32,
    pub(crate) successes: u32,
    pub(crate) failures: u32,
    pub(crate) incomplete: u32,
    pub(crate) property_failures: BTreeMap<String, u32>,
}

impl Report {
    pub(crate) fn new(
        properties: String,
        traces: usize,
        duration: Duration,
        successes: u32,
        failures: u32,
        incomplete: u32,
        property_failures: BTreeMap<String, u32>,
    ) -> Self {
        // Incomplete runs are not counted towards the success rate.
        let completed = successes + failures;
        let rate = if completed > 0 {
            successes as f64 / completed as f64
        } else {
            f64::NAN
        };
        Report {
            properties,
            traces,
            duration,
            rate,
            runs: completed + incomplete,
            successes,
            failures,
            incomplete,
            property_failures,
        }
    }

    pub(crate) fn print(&self, json: bool) {
        if json {
            match serde_json::ser::to_string_pretty(&self) {
                Ok(report) => println!("{report}"),
                Err(err) => log::error!("report serialization failed: {err}"),
            }
        } else {
            // Print final report
            println!("{self}");
        };
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "LTLMON results for {} ({} traces in {:.2?})",
            self.properties, self.traces, self.duration
        )?;
        writeln!(
            f,
            "Completed {} runs with {} successes, {} failures, {} incomplete",
            self.runs, self.successes, self.failures, self.incomplete
        )?;
        let completed = self.successes + self.failures;
        for (property, &violations) in self.property_failures.iter() {
            write!(
                f,
                "{property} success rate: {:.4}",
                completed.saturating_sub(violations) as f64 / completed as f64,
            )?;
            if violations > 0 {
                writeln!(f, " ({violations} fails)")?;
            } else {
                writeln!(f)?;
            }
        }
        write!(f, "Overall success rate: {:.4}", self.rate)?;
        Ok(())
    }
}
