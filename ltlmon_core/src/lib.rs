//! Implementation of *Linear Temporal Logic* (LTL) progression[^1]
//! for use in the LTLMON runtime monitor.
//!
//! Formulae are checked against traces one step at a time:
//! at every step the observations are consumed and the formula is rewritten
//! into the residual obligation left for the following steps,
//! until a verdict is reached or the trace ends.
//!
//! [^1]: Bacchus, F., & Kabanza, F. (2000). *Using temporal logics to express search control knowledge for planning*. Artificial Intelligence, 116(1-2).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod ltl;
mod oracle;
mod progression;
mod trace;

use log::{info, trace};
pub use ltl::Ltl;
pub use oracle::LtlOracle;
pub use progression::{Binding, Lookup, Probe, Progression, evaluate};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Instant,
};
use thiserror::Error;
pub use trace::{Trace, Tracer, VecTrace};

/// The type that represents discrete steps of a trace.
pub type Step = u64;

/// The possible outcomes of a monitored run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run was not completed.
    /// This can happen because:
    ///
    /// - The trace was empty; or
    /// - The trace violated an assume.
    Incomplete,
    /// The run settled the guarantees, with the given truth values.
    Verified(Vec<bool>),
}

/// Errors that abort the monitoring of a batch of traces.
#[derive(Debug, Error)]
pub enum MonitorError<E> {
    /// A trace could not produce its next state.
    #[error("failed to read trace #{index}")]
    Trace {
        /// Position of the trace in the batch.
        index: usize,
        /// Error produced by the trace.
        #[source]
        source: E,
    },
}

/// The main type to interface with the monitoring capabilities of LTLMON.
/// [`Monitor`] holds the properties, in the form of an [`LtlOracle`],
/// and the statistics of the runs monitored so far.
///
/// Clones share the same statistics,
/// so that a clone can be used to follow the progress of a running batch.
#[derive(Debug, Clone)]
pub struct Monitor {
    oracle: LtlOracle,
    running: Arc<AtomicBool>,
    successes: Arc<AtomicU32>,
    failures: Arc<AtomicU32>,
    incomplete: Arc<AtomicU32>,
    violations: Arc<Mutex<Vec<u32>>>,
}

impl Monitor {
    /// Create new [`Monitor`] object, checking the properties of the given [`LtlOracle`].
    pub fn new(oracle: LtlOracle) -> Self {
        Monitor {
            oracle,
            running: Arc::new(AtomicBool::new(false)),
            successes: Arc::new(AtomicU32::new(0)),
            failures: Arc::new(AtomicU32::new(0)),
            incomplete: Arc::new(AtomicU32::new(0)),
            violations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn reset(&self) {
        self.successes.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.incomplete.store(0, Ordering::Relaxed);
        self.violations.lock().expect("lock").clear();
        self.running.store(true, Ordering::Relaxed);
    }

    /// The [`LtlOracle`] every run starts from.
    pub fn oracle(&self) -> &LtlOracle {
        &self.oracle
    }

    /// Tells whether a monitoring task is currently running.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Returns the number of successful runs in the current batch.
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::Relaxed)
    }

    /// Returns the number of failed runs in the current batch.
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Returns the number of incomplete runs in the current batch.
    pub fn incomplete(&self) -> u32 {
        self.incomplete.load(Ordering::Relaxed)
    }

    /// Returns the number of runs monitored so far in the current batch.
    pub fn runs(&self) -> u32 {
        self.successes() + self.failures() + self.incomplete()
    }

    /// Returns a vector where each entry contains the number of violations of the associated guarantee in the current batch.
    pub fn violations(&self) -> Vec<u32> {
        self.violations.lock().expect("lock").clone()
    }

    fn record(&self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Verified(guarantees) => {
                if guarantees.iter().all(|b| *b) {
                    // If all guarantees are satisfied, the run is successful
                    let successes = self.successes.fetch_add(1, Ordering::Relaxed);
                    trace!("runs: {} successes", successes + 1);
                } else {
                    let failures = self.failures.fetch_add(1, Ordering::Relaxed);
                    let violations = &mut *self.violations.lock().expect("lock");
                    violations.resize(violations.len().max(guarantees.len()), 0);
                    guarantees.iter().zip(violations.iter_mut()).for_each(
                        |(success, violations)| {
                            if !success {
                                *violations += 1;
                            }
                        },
                    );
                    trace!("runs: {} failures", failures + 1);
                }
            }
            RunOutcome::Incomplete => {
                let incomplete = self.incomplete.fetch_add(1, Ordering::Relaxed);
                trace!("runs: {} incomplete", incomplete + 1);
            }
        }
    }

    /// Monitors the given traces one after the other.
    ///
    /// Stops at the first trace that fails to be read.
    pub fn run<T, I>(&self, traces: I) -> Result<(), MonitorError<T::Error>>
    where
        T: Trace,
        I: IntoIterator<Item = T>,
    {
        self.reset();
        info!("monitoring starting");
        let start_time = Instant::now();

        let result = traces
            .into_iter()
            .enumerate()
            .try_for_each(|(index, mut trace)| {
                let outcome = trace
                    .experiment(self.oracle.clone())
                    .map_err(|source| MonitorError::Trace { index, source })?;
                self.record(outcome);
                Ok(())
            });

        self.running.store(false, Ordering::Relaxed);
        let elapsed = start_time.elapsed();
        info!("monitoring time elapsed: {elapsed:0.2?}");
        info!("monitoring terminating");
        result
    }

    /// Monitors the given traces in parallel.
    ///
    /// Stops at the first trace that fails to be read.
    pub fn par_run<T>(&self, traces: Vec<T>) -> Result<(), MonitorError<T::Error>>
    where
        T: Trace + Send,
        T::Error: Send,
    {
        self.reset();
        info!("monitoring starting");
        let start_time = Instant::now();

        let result = traces
            .into_par_iter()
            .enumerate()
            .try_for_each(|(index, mut trace)| {
                let outcome = trace
                    .experiment(self.oracle.clone())
                    .map_err(|source| MonitorError::Trace { index, source })?;
                self.record(outcome);
                Ok(())
            });

        self.running.store(false, Ordering::Relaxed);
        let elapsed = start_time.elapsed();
        info!("monitoring time elapsed: {elapsed:0.2?}");
        info!("monitoring terminating");
        result
    }

    /// Monitors the given traces and process every run via its [`Tracer`].
    pub fn traces<T, P, I>(&self, traces: I) -> Result<(), MonitorError<T::Error>>
    where
        T: Trace,
        P: Tracer,
        I: IntoIterator<Item = (T, P)>,
    {
        self.reset();
        info!("tracing starting");
        let start_time = Instant::now();

        let result = traces
            .into_iter()
            .enumerate()
            .try_for_each(|(index, (mut trace, tracer))| {
                let outcome = trace
                    .trace(self.oracle.clone(), tracer)
                    .map_err(|source| MonitorError::Trace { index, source })?;
                self.record(outcome);
                Ok(())
            });

        self.running.store(false, Ordering::Relaxed);
        let elapsed = start_time.elapsed();
        info!("tracing time elapsed: {elapsed:0.2?}");
        info!("tracing terminating");
        result
    }
}
