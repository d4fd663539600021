use crate::{LtlOracle, RunOutcome, Step};
use log::trace;
use std::convert::Infallible;

/// Trait that handles streaming of monitored traces,
/// e.g., to print them to file.
pub trait Tracer {
    /// Initialize new streaming.
    ///
    /// This method needs to be called once, before calls to [`Self::trace`].
    fn init(&mut self);

    /// Stream a new step of the trace,
    /// together with the state of the oracle after processing it.
    fn trace(&mut self, step: Step, state: &[Option<bool>], oracle: &LtlOracle);

    /// Finalize and close streaming.
    ///
    /// This method needs to be called at the end of the execution.
    fn finalize(self, outcome: &RunOutcome);
}

// Dummy Tracer that does nothing
impl Tracer for () {
    fn init(&mut self) {}

    fn trace(&mut self, _step: Step, _state: &[Option<bool>], _oracle: &LtlOracle) {}

    fn finalize(self, _outcome: &RunOutcome) {}
}

/// A finite sequence of states, produced one step at a time.
///
/// Together with an [`LtlOracle`], it provides a verifiable run.
pub trait Trace {
    /// The error returned when the next state cannot be produced.
    type Error;

    /// Writes the next state of the trace into `state`, replacing its content,
    /// and returns `false` if the trace has no more states.
    fn next_state(&mut self, state: &mut Vec<Option<bool>>) -> Result<bool, Self::Error>;

    /// Monitors the whole [`Trace`] with a given [`LtlOracle`] and returns a [`RunOutcome`].
    ///
    /// The run stops as soon as all properties are settled.
    fn experiment(&mut self, oracle: LtlOracle) -> Result<RunOutcome, Self::Error>
    where
        Self: Sized,
    {
        monitor(self, oracle, &mut (), true)
    }

    /// Monitors the whole [`Trace`] with a given [`LtlOracle`]
    /// and process the monitored steps via the given [`Tracer`].
    fn trace<T: Tracer>(
        &mut self,
        oracle: LtlOracle,
        mut tracer: T,
    ) -> Result<RunOutcome, Self::Error>
    where
        Self: Sized,
    {
        tracer.init();
        let outcome = monitor(self, oracle, &mut tracer, false)?;
        tracer.finalize(&outcome);
        Ok(outcome)
    }
}

fn monitor<Tr: Trace, T: Tracer>(
    trace: &mut Tr,
    mut oracle: LtlOracle,
    tracer: &mut T,
    early_stop: bool,
) -> Result<RunOutcome, Tr::Error> {
    trace!("new run starting");
    // reuse vectors to avoid allocations
    let mut state = Vec::new();
    let mut next = Vec::new();
    if !trace.next_state(&mut state)? {
        trace!("empty trace");
        return Ok(RunOutcome::Incomplete);
    }
    loop {
        // One state of lookahead tells whether the current step is the final one.
        let is_final = !trace.next_state(&mut next)?;
        let step = oracle.step();
        oracle.update(&state, is_final);
        tracer.trace(step, &state, &oracle);
        if oracle.output_assumes().any(|b| b == Some(false)) {
            trace!("run violated an assume");
            return Ok(RunOutcome::Incomplete);
        } else if early_stop
            && oracle.output_assumes().all(|b| b.is_some())
            && oracle.output_guarantees().all(|b| b.is_some())
        {
            trace!("run complete early");
            let verified = Vec::from_iter(oracle.final_output_guarantees());
            return Ok(RunOutcome::Verified(verified));
        } else if is_final {
            break;
        }
        std::mem::swap(&mut state, &mut next);
    }
    trace!("run complete");
    if oracle.final_output_assumes().all(|b| b) {
        let verified = Vec::from_iter(oracle.final_output_guarantees());
        Ok(RunOutcome::Verified(verified))
    } else {
        trace!("run left an assume open");
        Ok(RunOutcome::Incomplete)
    }
}

/// A [`Trace`] whose states are all held in memory.
#[derive(Debug, Clone, Default)]
pub struct VecTrace {
    states: std::vec::IntoIter<Vec<Option<bool>>>,
}

impl VecTrace {
    /// Creates a [`VecTrace`] from its sequence of states.
    pub fn new(states: Vec<Vec<Option<bool>>>) -> Self {
        Self {
            states: states.into_iter(),
        }
    }
}

impl From<Vec<Vec<bool>>> for VecTrace {
    fn from(states: Vec<Vec<bool>>) -> Self {
        VecTrace::new(
            states
                .into_iter()
                .map(|state| state.into_iter().map(Some).collect())
                .collect(),
        )
    }
}

impl Trace for VecTrace {
    type Error = Infallible;

    fn next_state(&mut self, state: &mut Vec<Option<bool>>) -> Result<bool, Self::Error> {
        if let Some(next) = self.states.next() {
            *state = next;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
